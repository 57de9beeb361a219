//! Fixed-height content blocks drawn through the page cursor.

use crate::config::RenderConfig;
use crate::fonts::{FontSet, FontStyle};

use super::flow::PageFlow;
use super::layout::{Alignment, draw_lines, draw_text, fill_rect, fit_text, hline, stroke_rect, wrap_text};

pub(super) const BANNER_FILL: [u8; 3] = [31, 73, 125];
pub(super) const BANNER_TEXT: [u8; 3] = [255, 255, 255];
pub(super) const BAND_FILL: [u8; 3] = [222, 230, 240];
pub(super) const RULE: [u8; 3] = [150, 150, 150];
pub(super) const MUTED: [u8; 3] = [105, 105, 105];

const BANNER_H: f32 = 56.0;
const BANNER_GAP: f32 = 14.0;
const KV_H: f32 = 16.0;
const KV_KEY_W: f32 = 140.0;
const SECTION_TITLE_H: f32 = 24.0;
pub(super) const CATEGORY_BAND_H: f32 = 18.0;
const NOTICE_H: f32 = 20.0;
const SIGNATURE_BOX_H: f32 = 110.0;

/// Fonts and layout constants shared by every renderer of one document.
#[derive(Clone, Copy)]
pub(super) struct Theme<'a> {
    pub(super) fonts: &'a FontSet,
    pub(super) config: &'a RenderConfig,
}

impl Theme<'_> {
    pub(super) fn left(&self) -> f32 {
        self.config.margin_left
    }

    pub(super) fn width(&self) -> f32 {
        self.config.content_width()
    }

    pub(super) fn line_pitch(&self, font_size: f32) -> f32 {
        font_size * 1.25
    }
}

/// Colored header band with a title and an optional subtitle.
pub(super) fn banner(flow: &mut PageFlow, theme: Theme<'_>, title: &str, subtitle: Option<&str>) {
    flow.ensure_space(BANNER_H + BANNER_GAP);
    let top = flow.y();
    let (x, w) = (theme.left(), theme.width());
    let bold = theme.fonts.get(FontStyle::Bold);
    let regular = theme.fonts.get(FontStyle::Regular);
    let content = flow.content();

    fill_rect(content, x, top - BANNER_H, w, BANNER_H, BANNER_FILL);
    let title_size = 16.0;
    let title = fit_text(title, bold, title_size, w - 24.0);
    draw_text(
        content,
        bold,
        title_size,
        x + 12.0,
        top - 10.0 - bold.ascent(title_size),
        &title,
        Some(BANNER_TEXT),
    );
    if let Some(sub) = subtitle.filter(|s| !s.is_empty()) {
        let sub_size = 10.0;
        let sub = fit_text(sub, regular, sub_size, w - 24.0);
        draw_text(
            content,
            regular,
            sub_size,
            x + 12.0,
            top - BANNER_H + 10.0,
            &sub,
            Some(BANNER_TEXT),
        );
    }
    flow.advance(BANNER_H + BANNER_GAP);
}

/// Two-column metadata row: bold key, value truncated to the remaining width.
pub(super) fn key_value(flow: &mut PageFlow, theme: Theme<'_>, key: &str, value: &str) {
    flow.ensure_space(KV_H);
    let size = theme.config.font_size + 1.0;
    let bold = theme.fonts.get(FontStyle::Bold);
    let regular = theme.fonts.get(FontStyle::Regular);
    let baseline = flow.y() - 3.0 - bold.ascent(size);
    let x = theme.left();
    let value = fit_text(value, regular, size, theme.width() - KV_KEY_W);
    let content = flow.content();
    draw_text(content, bold, size, x, baseline, key, None);
    draw_text(content, regular, size, x + KV_KEY_W, baseline, &value, None);
    flow.advance(KV_H);
}

/// Underlined heading.
pub(super) fn section_title(flow: &mut PageFlow, theme: Theme<'_>, text: &str) {
    flow.ensure_space(SECTION_TITLE_H);
    let size = 12.0;
    let bold = theme.fonts.get(FontStyle::Bold);
    let top = flow.y();
    let baseline = top - 4.0 - bold.ascent(size);
    let (x, w) = (theme.left(), theme.width());
    let content = flow.content();
    draw_text(content, bold, size, x, baseline, text, Some(BANNER_FILL));
    hline(content, x, x + w, baseline - 5.0, 0.8, BANNER_FILL);
    flow.advance(SECTION_TITLE_H);
}

/// Shaded one-line separator introducing a category group.
pub(super) fn category_band(flow: &mut PageFlow, theme: Theme<'_>, name: &str) {
    flow.ensure_space(CATEGORY_BAND_H);
    let size = theme.config.font_size + 1.0;
    let bold = theme.fonts.get(FontStyle::Bold);
    let top = flow.y();
    let (x, w) = (theme.left(), theme.width());
    let name = fit_text(name, bold, size, w - 12.0);
    let content = flow.content();
    fill_rect(content, x, top - CATEGORY_BAND_H, w, CATEGORY_BAND_H, BAND_FILL);
    draw_text(
        content,
        bold,
        size,
        x + 6.0,
        top - (CATEGORY_BAND_H + bold.ascent(size)) / 2.0 - 1.0,
        &name,
        Some(BANNER_FILL),
    );
    flow.advance(CATEGORY_BAND_H);
}

/// Muted single-line message, e.g. for an empty room.
pub(super) fn notice(flow: &mut PageFlow, theme: Theme<'_>, text: &str) {
    flow.ensure_space(NOTICE_H);
    let size = theme.config.font_size + 1.0;
    let regular = theme.fonts.get(FontStyle::Regular);
    let baseline = flow.y() - 4.0 - regular.ascent(size);
    let x = theme.left();
    draw_text(flow.content(), regular, size, x + 6.0, baseline, text, Some(MUTED));
    flow.advance(NOTICE_H);
}

/// Wrapped free text. Unlike the other blocks this one may continue on the
/// next page, one line at a time.
pub(super) fn paragraph(
    flow: &mut PageFlow,
    theme: Theme<'_>,
    text: &str,
    style: FontStyle,
    alignment: Alignment,
) {
    let size = theme.config.font_size + 1.0;
    let font = theme.fonts.get(style);
    let pitch = theme.line_pitch(size);
    let lines = wrap_text(text, font, size, theme.width());
    for line in lines {
        flow.ensure_space(pitch);
        let baseline = flow.y() - font.ascent(size);
        draw_lines(
            flow.content(),
            std::slice::from_ref(&line),
            font,
            size,
            theme.left(),
            theme.width(),
            baseline,
            pitch,
            alignment,
            None,
        );
        flow.advance(pitch);
    }
    flow.advance(pitch / 2.0);
}

/// Bordered box for one party's signature.
pub(super) fn signature_box(flow: &mut PageFlow, theme: Theme<'_>, role: &str, name: &str) {
    flow.ensure_space(SIGNATURE_BOX_H + 12.0);
    let top = flow.y();
    let (x, w) = (theme.left(), theme.width());
    let size = theme.config.font_size + 1.0;
    let bold = theme.fonts.get(FontStyle::Bold);
    let regular = theme.fonts.get(FontStyle::Regular);
    let heading = fit_text(&format!("{role}: {name}"), bold, size, w - 16.0);
    let content = flow.content();

    stroke_rect(content, x, top - SIGNATURE_BOX_H, w, SIGNATURE_BOX_H, 0.8, RULE);
    draw_text(content, bold, size, x + 8.0, top - 8.0 - bold.ascent(size), &heading, None);
    draw_text(
        content,
        regular,
        size - 1.0,
        x + 8.0,
        top - 24.0 - regular.ascent(size - 1.0),
        "Read and approved",
        Some(MUTED),
    );
    let line_y = top - SIGNATURE_BOX_H + 22.0;
    draw_text(content, regular, size - 1.0, x + 8.0, line_y + 4.0, "Date:", Some(MUTED));
    hline(content, x + 40.0, x + w / 2.0 - 16.0, line_y, 0.5, RULE);
    draw_text(
        content,
        regular,
        size - 1.0,
        x + w / 2.0,
        line_y + 4.0,
        "Signature:",
        Some(MUTED),
    );
    hline(content, x + w / 2.0 + 52.0, x + w - 8.0, line_y, 0.5, RULE);
    flow.advance(SIGNATURE_BOX_H + 12.0);
}
