use std::path::PathBuf;

use serde::Deserialize;

/// Layout constants and policy thresholds. Every value has a tuned default;
/// callers override individual fields (or load the whole thing from JSON).
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub page_width: f32,  // points, A4 by default
    pub page_height: f32, // points
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    /// Distance from the page bottom edge to the footer baseline.
    pub footer_baseline: f32,
    pub font_size: f32,
    /// Table rows never grow past this height; longer observations overflow.
    pub row_max_height: f32,
    /// Items with `severity >= severity_threshold` are important.
    pub severity_threshold: u8,
    pub hero_height: f32,
    pub thumbnail_height: f32,
    pub thumbnail_gap: f32,
    pub hero_photo_limit: usize,
    pub thumbnail_photo_limit: usize,
    /// Photos larger than this (in either dimension) are downscaled before embedding.
    pub max_image_px: u32,
    /// TrueType/OpenType file embedded instead of Helvetica.
    pub font_path: Option<PathBuf>,
    pub bold_font_path: Option<PathBuf>,
    /// Group categories case-insensitively instead of by their stored spelling.
    pub merge_category_case: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page_width: 595.28,
            page_height: 841.89,
            margin_top: 42.0,
            margin_bottom: 56.0,
            margin_left: 42.0,
            margin_right: 42.0,
            footer_baseline: 28.0,
            font_size: 9.0,
            row_max_height: 96.0,
            severity_threshold: 3,
            hero_height: 240.0,
            thumbnail_height: 120.0,
            thumbnail_gap: 8.0,
            hero_photo_limit: 1,
            thumbnail_photo_limit: 3,
            max_image_px: 1600,
            font_path: None,
            bold_font_path: None,
            merge_category_case: false,
        }
    }
}

impl RenderConfig {
    /// Defaults plus font overrides from `INSPECTION_PDF_FONT` and
    /// `INSPECTION_PDF_FONT_BOLD`.
    pub fn from_env() -> Self {
        let path_var = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            font_path: path_var("INSPECTION_PDF_FONT"),
            bold_font_path: path_var("INSPECTION_PDF_FONT_BOLD"),
            ..Self::default()
        }
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    pub(crate) fn content_top(&self) -> f32 {
        self.page_height - self.margin_top
    }
}
