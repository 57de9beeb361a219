use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Placeholder drawn wherever an optional field is missing.
pub const DASH: &str = "\u{2014}";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Entry,
    Exit,
}

impl ReportKind {
    pub fn title(self) -> &'static str {
        match self {
            ReportKind::Entry => "Entry inspection",
            ReportKind::Exit => "Exit inspection",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    New,
    VeryGood,
    Good,
    Average,
    Poor,
}

impl Condition {
    pub fn label(self) -> &'static str {
        match self {
            Condition::New => "New",
            Condition::VeryGood => "Very good",
            Condition::Good => "Good",
            Condition::Average => "Average",
            Condition::Poor => "Poor",
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Photo {
    pub bucket: Option<String>,
    pub path: Option<String>,
}

impl Photo {
    /// `(bucket, path)` when both halves of the storage reference are present.
    pub fn reference(&self) -> Option<(&str, &str)> {
        let bucket = self.bucket.as_deref().map(str::trim).filter(|b| !b.is_empty())?;
        let path = self.path.as_deref().map(str::trim).filter(|p| !p.is_empty())?;
        Some((bucket, path))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Item {
    pub label: String,
    pub category: Option<String>,
    pub condition: Option<Condition>,
    pub clean: Option<bool>,
    pub functional: Option<bool>,
    pub severity: u8, // ordinal, 0 = none
    pub description: Option<String>,
    pub defects: Vec<String>,
    pub photos: Vec<Photo>,
}

impl Item {
    /// An item is important when its severity reaches `severity_threshold`,
    /// its condition is poor, or it carries at least one defect tag.
    /// Important items get a single large photo instead of thumbnails.
    pub fn is_important(&self, severity_threshold: u8) -> bool {
        self.severity >= severity_threshold
            || self.condition == Some(Condition::Poor)
            || self.defect_tags().next().is_some()
    }

    pub fn defect_tags(&self) -> impl Iterator<Item = &str> {
        self.defects
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
    }

    /// Category as stored, or the empty string when unset.
    pub fn category_key(&self) -> &str {
        self.category.as_deref().unwrap_or("")
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Room {
    pub name: String,
    pub level: Option<String>,
    pub notes: Option<String>,
    pub position: i64, // unique within a report
    pub items: Vec<Item>,
}

impl Room {
    /// "Kitchen — Ground floor", or just the name when no level is set.
    pub fn display_name(&self) -> String {
        let name = if self.name.trim().is_empty() {
            DASH
        } else {
            self.name.trim()
        };
        match self.level.as_deref().map(str::trim) {
            Some(level) if !level.is_empty() => format!("{name} {DASH} {level}"),
            _ => name.to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Report {
    pub kind: ReportKind,
    #[serde(default)]
    pub inspected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub general_notes: Option<String>,
    #[serde(default)]
    pub lease_ref: Option<String>,
    #[serde(default)]
    pub landlord: Option<String>,
    #[serde(default)]
    pub tenants: Vec<String>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    /// Items not attached to any room; rendered as a trailing pseudo-room.
    #[serde(default)]
    pub unassigned_items: Vec<Item>,
}

impl Report {
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.rooms
            .iter()
            .flat_map(|r| r.items.iter())
            .chain(self.unassigned_items.iter())
    }

    /// Every piece of free text in the report, for font subsetting.
    pub(crate) fn text_fragments(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        out.extend(self.place.as_deref());
        out.extend(self.general_notes.as_deref());
        out.extend(self.lease_ref.as_deref());
        out.extend(self.landlord.as_deref());
        out.extend(self.tenants.iter().map(String::as_str));
        for room in &self.rooms {
            out.push(&room.name);
            out.extend(room.level.as_deref());
            out.extend(room.notes.as_deref());
        }
        for item in self.items() {
            out.push(&item.label);
            out.extend(item.category.as_deref());
            out.extend(item.description.as_deref());
            out.extend(item.defects.iter().map(String::as_str));
        }
        out
    }
}

/// Yes/No/— for the optional boolean columns.
pub(crate) fn flag_label(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "Yes",
        Some(false) => "No",
        None => DASH,
    }
}
