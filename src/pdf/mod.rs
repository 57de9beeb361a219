mod blocks;
mod flow;
mod images;
mod layout;
mod sections;
mod table;
mod toc;

use std::collections::HashSet;
use std::time::Instant;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, TextStr};

use crate::config::RenderConfig;
use crate::error::Error;
use crate::fonts::{FontSet, FontStyle, register_font};
use crate::model::{DASH, Report};
use crate::photos::PhotoStore;

use blocks::{Theme, banner, key_value, paragraph, section_title, signature_box};
use flow::{ClosedPages, PageFlow};
use layout::Alignment;
use toc::Ledger;

pub use toc::TocEntry;

/// A finished inspection document.
#[derive(Debug)]
pub struct RenderedReport {
    pub pdf: Vec<u8>,
    pub page_count: usize,
    /// Section → page mapping printed in the table of contents.
    pub toc: Vec<TocEntry>,
}

/// Object allocation and image resources shared by the whole document.
pub(crate) struct PdfWriter {
    pdf: Pdf,
    next_id: i32,
    xobjects: Vec<(String, Ref)>,
}

impl PdfWriter {
    fn new() -> Self {
        Self {
            pdf: Pdf::new(),
            next_id: 1,
            xobjects: Vec::new(),
        }
    }

    fn alloc(&mut self) -> Ref {
        let r = Ref::new(self.next_id);
        self.next_id += 1;
        r
    }
}

fn register_fonts(writer: &mut PdfWriter, report: &Report, config: &RenderConfig) -> Result<FontSet, Error> {
    let mut used: HashSet<char> = (' '..='~').collect();
    used.extend(['\u{2014}', '\u{2026}', '\u{2019}']);
    for text in report.text_fragments() {
        used.extend(text.chars().filter(|c| !c.is_control()));
    }

    let PdfWriter { pdf, next_id, .. } = writer;
    let mut alloc = || {
        let r = Ref::new(*next_id);
        *next_id += 1;
        r
    };
    let regular = register_font(pdf, "F1".into(), config.font_path.as_deref(), false, &mut alloc, &used)?;
    let bold_path = config.bold_font_path.as_deref().or(config.font_path.as_deref());
    let bold = register_font(pdf, "F2".into(), bold_path, true, &mut alloc, &used)?;
    Ok(FontSet { regular, bold })
}

fn or_dash(value: Option<&str>) -> &str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(DASH)
}

fn cover_page(flow: &mut PageFlow, theme: Theme<'_>, report: &Report) {
    banner(flow, theme, report.kind.title(), Some(or_dash(report.place.as_deref())));

    section_title(flow, theme, "Inspection details");
    let date = report
        .inspected_at
        .map(|d| d.format("%d/%m/%Y %H:%M").to_string());
    let tenants = report
        .tenants
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    key_value(flow, theme, "Inspection", report.kind.title());
    key_value(flow, theme, "Date", or_dash(date.as_deref()));
    key_value(flow, theme, "Property", or_dash(report.place.as_deref()));
    key_value(flow, theme, "Lease", or_dash(report.lease_ref.as_deref()));
    key_value(flow, theme, "Landlord", or_dash(report.landlord.as_deref()));
    key_value(flow, theme, "Tenants", or_dash(Some(tenants.as_str())));

    let threshold = theme.config.severity_threshold;
    let sections = report.rooms.len() + usize::from(!report.unassigned_items.is_empty());
    let items = report.items().count();
    let photos = report
        .items()
        .flat_map(|i| i.photos.iter())
        .filter(|p| p.reference().is_some())
        .count();
    let important = report.items().filter(|i| i.is_important(threshold)).count();
    section_title(flow, theme, "Summary");
    key_value(flow, theme, "Rooms", &sections.to_string());
    key_value(flow, theme, "Items", &items.to_string());
    key_value(flow, theme, "Photos", &photos.to_string());
    key_value(flow, theme, "Items needing attention", &important.to_string());

    if let Some(notes) = report.general_notes.as_deref().filter(|n| !n.trim().is_empty()) {
        section_title(flow, theme, "General notes");
        paragraph(flow, theme, notes, FontStyle::Regular, Alignment::Left);
    }
}

fn signatures_page(flow: &mut PageFlow, theme: Theme<'_>, report: &Report) {
    banner(flow, theme, "Signatures", Some(report.kind.title()));
    paragraph(
        flow,
        theme,
        "The parties acknowledge that this report was drawn up jointly and \
         reflects the condition of the premises on the date of inspection.",
        FontStyle::Regular,
        Alignment::Center,
    );
    signature_box(flow, theme, "Landlord", or_dash(report.landlord.as_deref()));
    let tenants: Vec<&str> = report
        .tenants
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if tenants.is_empty() {
        signature_box(flow, theme, "Tenant", DASH);
    }
    for tenant in tenants {
        signature_box(flow, theme, "Tenant", tenant);
    }
}

fn assemble(
    mut writer: PdfWriter,
    pages: ClosedPages,
    fonts: &FontSet,
    config: &RenderConfig,
    catalog_id: Ref,
    pages_id: Ref,
    title: &str,
) -> Vec<u8> {
    let contents: Vec<Content> = pages.into_contents();
    let n = contents.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| writer.alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| writer.alloc()).collect();
    let info_id = writer.alloc();

    for (i, c) in contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        writer
            .pdf
            .stream(content_ids[i], &compressed)
            .filter(Filter::FlateDecode);
    }

    writer.pdf.catalog(catalog_id).pages(pages_id);
    writer
        .pdf
        .pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    let font_pairs: Vec<(String, Ref)> = fonts
        .entries()
        .iter()
        .map(|f| (f.pdf_name.clone(), f.font_ref))
        .collect();

    for i in 0..n {
        let mut page = writer.pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, config.page_width, config.page_height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut fonts = resources.fonts();
            for (name, font_ref) in &font_pairs {
                fonts.pair(Name(name.as_bytes()), *font_ref);
            }
        }
        if !writer.xobjects.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &writer.xobjects {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    writer
        .pdf
        .document_info(info_id)
        .title(TextStr(title))
        .producer(TextStr("inspection-pdf"));

    writer.pdf.finish()
}

/// Lay out `report` into a PDF.
///
/// Runs in two passes. The forward pass draws cover, table-of-contents
/// placeholder, one section per room and the signatures page, recording where
/// each section starts. Once every page exists the backfill pass writes the
/// table of contents into the placeholder and stamps page footers.
pub async fn render(
    report: &Report,
    store: &dyn PhotoStore,
    config: &RenderConfig,
) -> Result<RenderedReport, Error> {
    let t0 = Instant::now();
    let mut writer = PdfWriter::new();
    let catalog_id = writer.alloc();
    let pages_id = writer.alloc();

    let fonts = register_fonts(&mut writer, report, config)?;
    let theme = Theme {
        fonts: &fonts,
        config,
    };
    let t_fonts = t0.elapsed();

    // Forward pass
    let rooms = sections::ordered_rooms(report);
    let mut flow = PageFlow::new(config);
    cover_page(&mut flow, theme, report);
    flow.break_page();
    let placeholder = toc::placeholder(&mut flow, theme, rooms.len());
    flow.break_page();

    let mut ledger = Ledger::default();
    for (i, room) in rooms.iter().enumerate() {
        sections::render_room(&mut flow, &mut writer, theme, store, room, i == 0, &mut ledger).await;
    }
    if !flow.at_page_top() {
        flow.break_page();
    }
    signatures_page(&mut flow, theme, report);
    let t_forward = t0.elapsed();

    // Backfill pass: only reachable with every page closed.
    let mut pages = flow.close();
    toc::write_toc(&mut pages, placeholder, &ledger, theme);
    let title = format!(
        "{} {DASH} {}",
        report.kind.title(),
        or_dash(report.place.as_deref())
    );
    toc::stamp_footers(&mut pages, theme, &title);
    let page_count = pages.total();
    let t_backfill = t0.elapsed();

    let pdf = assemble(writer, pages, &fonts, config, catalog_id, pages_id, &title);
    let t_total = t0.elapsed();

    log::info!(
        "Render phases: fonts={:.1}ms, forward={:.1}ms, backfill={:.1}ms, assembly={:.1}ms ({} pages, {} sections, {} bytes)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_forward - t_fonts).as_secs_f64() * 1000.0,
        (t_backfill - t_forward).as_secs_f64() * 1000.0,
        (t_total - t_backfill).as_secs_f64() * 1000.0,
        page_count,
        ledger.entries().len(),
        pdf.len(),
    );

    Ok(RenderedReport {
        pdf,
        page_count,
        toc: ledger.into_entries(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, Photo, ReportKind, Room};
    use crate::photos::{MockPhotoStore, PhotoError};

    fn png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(6, 4, image::Rgb([30, 90, 160]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn report_with_photos(paths: &[&str]) -> Report {
        Report {
            kind: ReportKind::Exit,
            inspected_at: None,
            place: Some("12 rue des Lilas".into()),
            general_notes: None,
            lease_ref: None,
            landlord: None,
            tenants: vec![],
            rooms: vec![Room {
                name: "Kitchen".into(),
                position: 1,
                items: vec![Item {
                    label: "Worktop".into(),
                    category: Some("Surfaces".into()),
                    photos: paths
                        .iter()
                        .map(|p| Photo {
                            bucket: Some("inspections".into()),
                            path: Some(p.to_string()),
                        })
                        .collect(),
                    ..Item::default()
                }],
                ..Room::default()
            }],
            unassigned_items: vec![],
        }
    }

    #[tokio::test]
    async fn thumbnails_fetch_at_most_three_photos_in_order() {
        let mut store = MockPhotoStore::new();
        let mut seq = mockall::Sequence::new();
        for expected in ["a.png", "b.png", "c.png"] {
            store
                .expect_fetch_bytes()
                .withf(move |bucket, path| {
                    bucket.to_string() == "inspections" && path.to_string() == expected
                })
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(png()));
        }
        let report = report_with_photos(&["a.png", "b.png", "c.png", "d.png"]);
        let out = render(&report, &store, &RenderConfig::default()).await.unwrap();
        assert_eq!(out.toc.len(), 1);
        assert!(out.pdf.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn failed_fetches_do_not_fail_the_document() {
        let mut store = MockPhotoStore::new();
        store
            .expect_fetch_bytes()
            .returning(|_, _| Err(PhotoError::Other("timeout".into())));
        let report = report_with_photos(&["a.png", "b.png"]);
        let out = render(&report, &store, &RenderConfig::default()).await.unwrap();
        assert_eq!(out.page_count, 4);
        assert_eq!(out.toc[0].page, 3);
    }

    #[tokio::test]
    async fn photos_without_reference_are_never_fetched() {
        let mut store = MockPhotoStore::new();
        store.expect_fetch_bytes().never();
        let mut report = report_with_photos(&[]);
        report.rooms[0].items[0].photos = vec![
            Photo::default(),
            Photo {
                bucket: Some("inspections".into()),
                path: Some("  ".into()),
            },
        ];
        let out = render(&report, &store, &RenderConfig::default()).await.unwrap();
        assert_eq!(out.page_count, 4);
    }

    #[tokio::test]
    async fn missing_font_file_is_fatal() {
        let store = MockPhotoStore::new();
        let config = RenderConfig {
            font_path: Some("/nonexistent/font.ttf".into()),
            ..RenderConfig::default()
        };
        let err = render(&report_with_photos(&[]), &store, &config).await.unwrap_err();
        assert!(matches!(err, Error::Font(_)));
    }
}
