use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::fonts::FontStyle;
use crate::model::{DASH, Item, Report};
use crate::photos::PhotoStore;

use super::PdfWriter;
use super::blocks::{CATEGORY_BAND_H, Theme, banner, category_band, notice, paragraph};
use super::flow::PageFlow;
use super::images::{PanelMode, photo_panel};
use super::layout::Alignment;
use super::table::{HEADER_H, Observations, ROW_MARGIN, draw_header, draw_row, row_height};
use super::toc::Ledger;

const UNASSIGNED_TITLE: &str = "Unassigned items";
const GROUP_GAP: f32 = 10.0;

/// One rendered section: a room, or the bucket of items without a room.
pub(super) struct RoomView<'a> {
    pub(super) title: String,
    pub(super) notes: Option<&'a str>,
    pub(super) items: Vec<&'a Item>,
}

/// Sort key approximating locale-aware, case-insensitive order: accents are
/// stripped after canonical decomposition and letters are lowercased.
pub(super) fn collation_key(s: &str) -> String {
    s.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Collation key first, raw text second, so the order is total.
fn sort_key(s: &str) -> (String, String) {
    (collation_key(s), s.to_string())
}

/// Rooms by ascending position, then the unassigned bucket when it has items.
pub(super) fn ordered_rooms(report: &Report) -> Vec<RoomView<'_>> {
    let mut rooms: Vec<_> = report.rooms.iter().collect();
    rooms.sort_by_key(|r| r.position);

    let mut views: Vec<RoomView<'_>> = rooms
        .into_iter()
        .map(|room| RoomView {
            title: room.display_name(),
            notes: room.notes.as_deref().filter(|n| !n.trim().is_empty()),
            items: room.items.iter().collect(),
        })
        .collect();

    if !report.unassigned_items.is_empty() {
        views.push(RoomView {
            title: UNASSIGNED_TITLE.to_string(),
            notes: None,
            items: report.unassigned_items.iter().collect(),
        });
    }
    views
}

pub(super) struct CategoryGroup<'a> {
    pub(super) name: String,
    pub(super) items: Vec<&'a Item>,
}

/// Group items by category and order groups and items for display.
///
/// Groups are keyed by the stored spelling, so "Kitchen" and "kitchen" form
/// two groups that sort next to each other. `merge_case` keys them
/// case-insensitively instead, using the first spelling seen as the name.
pub(super) fn group_by_category<'a>(items: &[&'a Item], merge_case: bool) -> Vec<CategoryGroup<'a>> {
    let mut groups: Vec<CategoryGroup<'a>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for &item in items {
        let raw = item.category_key().trim();
        let key = if merge_case { raw.to_lowercase() } else { raw.to_string() };
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(CategoryGroup {
                name: raw.to_string(),
                items: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].items.push(item);
    }

    groups.sort_by_cached_key(|g| sort_key(&g.name));
    for group in &mut groups {
        group.items.sort_by_cached_key(|item| sort_key(&item.label));
    }
    groups
}

/// Lay out one room and record its table-of-contents entry.
///
/// Every room but the first starts on a new page; the first one lands on the
/// page the caller just opened.
pub(super) async fn render_room(
    flow: &mut PageFlow,
    writer: &mut PdfWriter,
    theme: Theme<'_>,
    store: &dyn PhotoStore,
    room: &RoomView<'_>,
    first: bool,
    ledger: &mut Ledger,
) {
    if !first {
        flow.break_page();
    }

    let count = room.items.len();
    let subtitle = match count {
        1 => "1 item".to_string(),
        n => format!("{n} items"),
    };
    banner(flow, theme, &room.title, Some(subtitle.as_str()));
    ledger.record(&room.title, count, flow.page_number());

    if let Some(notes) = room.notes {
        paragraph(flow, theme, notes, FontStyle::Regular, Alignment::Left);
    }

    if room.items.is_empty() {
        notice(flow, theme, "No items recorded for this room.");
        return;
    }

    for group in group_by_category(&room.items, theme.config.merge_category_case) {
        let name = if group.name.is_empty() { DASH } else { group.name.as_str() };

        // Band, header and first row stay together.
        if let Some(first_item) = group.items.first() {
            let first_h = row_height(&Observations::measure(first_item, theme), theme);
            flow.ensure_space(CATEGORY_BAND_H + HEADER_H + first_h + ROW_MARGIN);
        }
        category_band(flow, theme, name);
        draw_header(flow, theme);
        let mut header_page = flow.page_number();

        for (i, &item) in group.items.iter().enumerate() {
            let obs = Observations::measure(item, theme);
            let row_h = row_height(&obs, theme);
            flow.ensure_space(row_h + ROW_MARGIN);
            // The page may have turned here or in the previous photo panel.
            if flow.page_number() != header_page {
                draw_header(flow, theme);
                header_page = flow.page_number();
            }
            draw_row(flow, theme, item, &obs, row_h, i % 2 == 1);

            let mode = PanelMode::for_item(item, theme);
            photo_panel(flow, writer, theme, store, &item.photos, mode).await;
        }
        flow.advance(GROUP_GAP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Condition, ReportKind, Room};

    fn item(label: &str, category: &str) -> Item {
        Item {
            label: label.into(),
            category: Some(category.into()),
            ..Item::default()
        }
    }

    fn names(groups: &[CategoryGroup<'_>]) -> Vec<String> {
        groups.iter().map(|g| g.name.clone()).collect()
    }

    #[test]
    fn collation_ignores_case_and_accents() {
        assert_eq!(collation_key("Éclairage"), "eclairage");
        assert_eq!(collation_key("  Salle d'EAU "), "salle d'eau");
        assert!(collation_key("éviers") < collation_key("Fenêtres"));
    }

    #[test]
    fn categories_sort_locale_aware() {
        let items = [
            item("a", "Sols"),
            item("b", "électricité"),
            item("c", "Murs"),
            item("d", "Fenêtres"),
        ];
        let refs: Vec<&Item> = items.iter().collect();
        let groups = group_by_category(&refs, false);
        assert_eq!(names(&groups), vec!["électricité", "Fenêtres", "Murs", "Sols"]);
    }

    #[test]
    fn case_variants_stay_separate_but_adjacent() {
        let items = [
            item("Sink", "kitchen"),
            item("Door", "Bathroom"),
            item("Oven", "Kitchen"),
            item("Tap", "kitchen"),
            item("Lamp", "Lounge"),
        ];
        let refs: Vec<&Item> = items.iter().collect();
        let groups = group_by_category(&refs, false);
        assert_eq!(names(&groups), vec!["Bathroom", "Kitchen", "kitchen", "Lounge"]);
        assert_eq!(groups[2].items.len(), 2);
    }

    #[test]
    fn merge_case_puts_case_variants_in_one_group() {
        let items = [
            item("Sink", "kitchen"),
            item("Oven", "Kitchen"),
            item("Door", "Bathroom"),
        ];
        let refs: Vec<&Item> = items.iter().collect();
        let groups = group_by_category(&refs, true);
        assert_eq!(names(&groups), vec!["Bathroom", "kitchen"]);
        let labels: Vec<&str> = groups[1].items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Oven", "Sink"]);
    }

    #[test]
    fn items_sort_by_label_within_group() {
        let items = [
            item("radiateur", "Chauffage"),
            item("Chaudière", "Chauffage"),
            item("ballon", "Chauffage"),
        ];
        let refs: Vec<&Item> = items.iter().collect();
        let groups = group_by_category(&refs, false);
        let labels: Vec<&str> = groups[0].items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["ballon", "Chaudière", "radiateur"]);
    }

    #[test]
    fn rooms_follow_position_and_unassigned_comes_last() {
        let report = Report {
            kind: ReportKind::Entry,
            inspected_at: None,
            place: None,
            general_notes: None,
            lease_ref: None,
            landlord: None,
            tenants: vec![],
            rooms: vec![
                Room { name: "Bedroom".into(), position: 2, ..Room::default() },
                Room {
                    name: "Hall".into(),
                    level: Some("RDC".into()),
                    position: 1,
                    ..Room::default()
                },
            ],
            unassigned_items: vec![Item {
                label: "Keys".into(),
                condition: Some(Condition::Good),
                ..Item::default()
            }],
        };
        let titles: Vec<String> = ordered_rooms(&report).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Hall \u{2014} RDC", "Bedroom", "Unassigned items"]);
    }

    #[test]
    fn importance_policy() {
        let base = Item::default();
        assert!(!base.is_important(3));
        assert!(Item { severity: 3, ..Item::default() }.is_important(3));
        assert!(!Item { severity: 2, ..Item::default() }.is_important(3));
        assert!(Item { condition: Some(Condition::Poor), ..Item::default() }.is_important(3));
        assert!(!Item { condition: Some(Condition::Average), ..Item::default() }.is_important(3));
        assert!(Item { defects: vec!["crack".into()], ..Item::default() }.is_important(3));
        assert!(!Item { defects: vec!["  ".into()], ..Item::default() }.is_important(3));
    }
}
