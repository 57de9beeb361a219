use crate::fonts::{FontEntry, FontStyle};
use crate::model::{DASH, Item, flag_label};

use super::blocks::{BANNER_FILL, BANNER_TEXT, RULE, Theme};
use super::flow::PageFlow;
use super::layout::{TextLine, draw_text, fill_rect, fit_text, hline, wrap_text};

pub(super) const HEADER_H: f32 = 18.0;
/// Space kept free below every row.
pub(super) const ROW_MARGIN: f32 = 2.0;
const CELL_PAD: f32 = 4.0;
const ROW_SHADE: [u8; 3] = [244, 246, 248];
const DEFECT_COLOR: [u8; 3] = [176, 32, 32];

/// label, condition, clean, functional, observations
const COLUMN_FRACTIONS: [f32; 5] = [0.25, 0.13, 0.09, 0.11, 0.42];
const HEADERS: [&str; 5] = ["Item", "Condition", "Clean", "Functional", "Observations"];

fn column_edges(theme: Theme<'_>) -> [(f32, f32); 5] {
    let mut x = theme.left();
    let total = theme.width();
    COLUMN_FRACTIONS.map(|frac| {
        let w = total * frac;
        let col = (x, w);
        x += w;
        col
    })
}

fn observations_width(theme: Theme<'_>) -> f32 {
    column_edges(theme)[4].1 - 2.0 * CELL_PAD
}

/// Wrapped observation text: the description, then a distinctly colored
/// defects line when the item has defect tags.
pub(super) struct Observations {
    lines: Vec<(TextLine, bool)>, // (line, is_defect)
}

impl Observations {
    pub(super) fn measure(item: &Item, theme: Theme<'_>) -> Self {
        let font = theme.fonts.get(FontStyle::Regular);
        let size = theme.config.font_size;
        let width = observations_width(theme);
        let mut lines: Vec<(TextLine, bool)> = Vec::new();

        if let Some(desc) = item.description.as_deref() {
            lines.extend(wrap_text(desc, font, size, width).into_iter().map(|l| (l, false)));
        }
        let tags: Vec<&str> = item.defect_tags().collect();
        if !tags.is_empty() {
            let text = format!("Defects: {}", tags.join(", "));
            lines.extend(wrap_text(&text, font, size, width).into_iter().map(|l| (l, true)));
        }
        Self { lines }
    }

    pub(super) fn line_count(&self) -> usize {
        self.lines.len().max(1)
    }
}

/// Height of an item row: one pitch per observation line plus padding, at
/// least one line, never more than `row_max_height`.
pub(super) fn row_height(obs: &Observations, theme: Theme<'_>) -> f32 {
    let pitch = theme.line_pitch(theme.config.font_size);
    let natural = obs.line_count() as f32 * pitch + 2.0 * CELL_PAD;
    let min = pitch + 2.0 * CELL_PAD;
    natural.clamp(min, theme.config.row_max_height.max(min))
}

pub(super) fn draw_header(flow: &mut PageFlow, theme: Theme<'_>) {
    let cols = column_edges(theme);
    let bold = theme.fonts.get(FontStyle::Bold);
    let size = theme.config.font_size - 0.5;
    let top = flow.y();
    let content = flow.content();
    fill_rect(content, theme.left(), top - HEADER_H, theme.width(), HEADER_H, BANNER_FILL);
    let baseline = top - (HEADER_H + bold.ascent(size)) / 2.0 - 1.0;
    for ((x, w), label) in cols.iter().zip(HEADERS) {
        let label = fit_text(label, bold, size, w - 2.0 * CELL_PAD);
        draw_text(content, bold, size, x + CELL_PAD, baseline, &label, Some(BANNER_TEXT));
    }
    flow.advance(HEADER_H);
}

fn cell_text(
    content: &mut pdf_writer::Content,
    font: &FontEntry,
    size: f32,
    (x, w): (f32, f32),
    baseline: f32,
    text: &str,
) {
    let text = fit_text(text, font, size, w - 2.0 * CELL_PAD);
    draw_text(content, font, size, x + CELL_PAD, baseline, &text, None);
}

/// Draw one item row of height `row_h` at the cursor. The caller has already
/// reserved the space. Observation lines past the row height are dropped and
/// the last visible line ends with an ellipsis.
pub(super) fn draw_row(
    flow: &mut PageFlow,
    theme: Theme<'_>,
    item: &Item,
    obs: &Observations,
    row_h: f32,
    shaded: bool,
) {
    let cols = column_edges(theme);
    let regular = theme.fonts.get(FontStyle::Regular);
    let bold = theme.fonts.get(FontStyle::Bold);
    let size = theme.config.font_size;
    let pitch = theme.line_pitch(size);
    let top = flow.y();
    let baseline = top - CELL_PAD - regular.ascent(size);

    log::debug!(
        "row page={} label={:?} lines={} row_h={:.1} y={:.1}",
        flow.page_number(),
        item.label,
        obs.lines.len(),
        row_h,
        top
    );

    let content = flow.content();
    if shaded {
        fill_rect(content, theme.left(), top - row_h, theme.width(), row_h, ROW_SHADE);
    }

    let label = if item.label.trim().is_empty() { DASH } else { item.label.trim() };
    cell_text(content, bold, size, cols[0], baseline, label);
    cell_text(
        content,
        regular,
        size,
        cols[1],
        baseline,
        item.condition.map(|c| c.label()).unwrap_or(DASH),
    );
    cell_text(content, regular, size, cols[2], baseline, flag_label(item.clean));
    cell_text(content, regular, size, cols[3], baseline, flag_label(item.functional));

    let (obs_x, obs_w) = cols[4];
    if obs.lines.is_empty() {
        draw_text(content, regular, size, obs_x + CELL_PAD, baseline, DASH, None);
    } else {
        let visible = (((row_h - 2.0 * CELL_PAD) / pitch).floor() as usize).max(1);
        let truncated = obs.lines.len() > visible;
        for (i, (line, is_defect)) in obs.lines.iter().take(visible).enumerate() {
            let color = is_defect.then_some(DEFECT_COLOR);
            let y = baseline - i as f32 * pitch;
            if truncated && i + 1 == visible {
                let text = fit_text(
                    &format!("{}\u{2026}", line.text),
                    regular,
                    size,
                    obs_w - 2.0 * CELL_PAD,
                );
                draw_text(content, regular, size, obs_x + CELL_PAD, y, &text, color);
            } else {
                draw_text(content, regular, size, obs_x + CELL_PAD, y, &line.text, color);
            }
        }
    }

    hline(content, theme.left(), theme.left() + theme.width(), top - row_h, 0.4, RULE);
    flow.advance(row_h);
}
