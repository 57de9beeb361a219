//! Deferred references: the table of contents and the "Page i / N" footers,
//! both written after every page exists.

use crate::fonts::FontStyle;

use super::blocks::{BANNER_FILL, BANNER_TEXT, MUTED, RULE, Theme, banner, section_title};
use super::flow::{Anchor, ClosedPages, PageFlow};
use super::layout::{Alignment, TextLine, draw_lines, draw_text, fill_rect, fit_text, hline};

const TOC_ROW_H: f32 = 18.0;
const TOC_HEADER_H: f32 = 20.0;
const COUNT_COL_W: f32 = 70.0;
const PAGE_COL_W: f32 = 60.0;

/// One line of the table of contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    pub item_count: usize,
    /// Logical page on which the section banner was drawn, starting at 1.
    pub page: usize,
}

/// Table-of-contents entries in the order their sections were laid out.
#[derive(Debug, Default)]
pub(super) struct Ledger {
    entries: Vec<TocEntry>,
}

impl Ledger {
    pub(super) fn record(&mut self, title: &str, item_count: usize, page: usize) {
        log::debug!("toc: {title:?} ({item_count} items) → page {page}");
        self.entries.push(TocEntry {
            title: title.to_string(),
            item_count,
            page,
        });
    }

    pub(super) fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub(super) fn into_entries(self) -> Vec<TocEntry> {
        self.entries
    }
}

/// Reserved, still empty table-of-contents area. Each slot is a position on
/// a placeholder page and how many rows fit below it.
pub(super) struct TocPlaceholder {
    slots: Vec<(Anchor, usize)>,
}

fn rows_below(y: f32, theme: Theme<'_>) -> usize {
    let avail = y - theme.config.margin_bottom - TOC_HEADER_H;
    ((avail / TOC_ROW_H).floor() as usize).max(1)
}

/// Draw the table-of-contents banner and title and reserve enough placeholder
/// pages for `entry_count` rows. The number of sections is known before the
/// forward pass even though their pages are not.
pub(super) fn placeholder(flow: &mut PageFlow, theme: Theme<'_>, entry_count: usize) -> TocPlaceholder {
    banner(flow, theme, "Contents", None);
    section_title(flow, theme, "Sections");

    let first = flow.anchor();
    let first_rows = rows_below(first.y, theme);
    let mut slots = vec![(first, first_rows)];
    let mut reserved = first_rows;
    while reserved < entry_count {
        flow.break_page();
        section_title(flow, theme, "Sections (continued)");
        let anchor = flow.anchor();
        let rows = rows_below(anchor.y, theme);
        slots.push((anchor, rows));
        reserved += rows;
    }
    log::debug!(
        "toc placeholder: {} page(s) starting at page {} for {entry_count} entries",
        slots.len(),
        first.page
    );
    TocPlaceholder { slots }
}

fn draw_toc_header(content: &mut pdf_writer::Content, theme: Theme<'_>, top: f32) {
    let bold = theme.fonts.get(FontStyle::Bold);
    let size = theme.config.font_size;
    let (x, w) = (theme.left(), theme.width());
    let baseline = top - (TOC_HEADER_H + bold.ascent(size)) / 2.0 - 1.0;
    fill_rect(content, x, top - TOC_HEADER_H, w, TOC_HEADER_H, BANNER_FILL);
    draw_text(content, bold, size, x + 6.0, baseline, "Section", Some(BANNER_TEXT));
    let items_w = bold.text_width("Items", size);
    draw_text(
        content,
        bold,
        size,
        x + w - PAGE_COL_W - 6.0 - items_w,
        baseline,
        "Items",
        Some(BANNER_TEXT),
    );
    let page_w = bold.text_width("Page", size);
    draw_text(content, bold, size, x + w - 6.0 - page_w, baseline, "Page", Some(BANNER_TEXT));
}

/// Fill the reserved placeholder pages with one row per ledger entry.
/// Consumes the placeholder, so the contents can only be written once.
pub(super) fn write_toc(pages: &mut ClosedPages, placeholder: TocPlaceholder, ledger: &Ledger, theme: Theme<'_>) {
    let regular = theme.fonts.get(FontStyle::Regular);
    let size = theme.config.font_size + 1.0;
    let (x, w) = (theme.left(), theme.width());
    let title_w = w - COUNT_COL_W - PAGE_COL_W - 12.0;

    let mut entries = ledger.entries().iter().enumerate().peekable();
    for (anchor, capacity) in placeholder.slots {
        let Some(content) = pages.page_mut(anchor.page) else {
            log::warn!("toc placeholder page {} missing", anchor.page);
            continue;
        };
        draw_toc_header(content, theme, anchor.y);
        let mut y = anchor.y - TOC_HEADER_H;

        for _ in 0..capacity {
            let Some((i, entry)) = entries.next() else {
                break;
            };
            if i % 2 == 1 {
                fill_rect(content, x, y - TOC_ROW_H, w, TOC_ROW_H, [244, 246, 248]);
            }
            let baseline = y - (TOC_ROW_H + regular.ascent(size)) / 2.0 - 1.0;
            let title = fit_text(&entry.title, regular, size, title_w);
            draw_text(content, regular, size, x + 6.0, baseline, &title, None);

            let count = entry.item_count.to_string();
            let count_w = regular.text_width(&count, size);
            draw_text(
                content,
                regular,
                size,
                x + w - PAGE_COL_W - 6.0 - count_w,
                baseline,
                &count,
                Some(MUTED),
            );

            let page = entry.page.to_string();
            let page_w = regular.text_width(&page, size);
            draw_text(content, regular, size, x + w - 6.0 - page_w, baseline, &page, None);

            hline(content, x, x + w, y - TOC_ROW_H, 0.3, RULE);
            y -= TOC_ROW_H;
        }
    }
    if entries.peek().is_some() {
        log::warn!("toc placeholder too small; some entries were not written");
    }
}

/// Stamp "Page i / N" on every page, with `caption` on the left.
pub(super) fn stamp_footers(pages: &mut ClosedPages, theme: Theme<'_>, caption: &str) {
    let total = pages.total();
    let regular = theme.fonts.get(FontStyle::Regular);
    let size = theme.config.font_size - 1.0;
    let (x, w) = (theme.left(), theme.width());
    let baseline = theme.config.footer_baseline;
    let caption = fit_text(caption, regular, size, w * 0.65);

    for (number, content) in pages.iter_mut() {
        hline(content, x, x + w, baseline + size + 2.0, 0.4, RULE);
        draw_text(content, regular, size, x, baseline, &caption, Some(MUTED));
        let text = format!("Page {number} / {total}");
        let label = TextLine {
            width: regular.text_width(&text, size),
            text,
        };
        draw_lines(
            content,
            std::slice::from_ref(&label),
            regular,
            size,
            x,
            w,
            baseline,
            0.0,
            Alignment::Right,
            Some(MUTED),
        );
    }
}
