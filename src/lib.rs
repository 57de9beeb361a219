mod config;
mod error;
mod fonts;
mod model;
mod pdf;
mod photos;

pub use config::RenderConfig;
pub use error::Error;
pub use model::{Condition, DASH, Item, Photo, Report, ReportKind, Room};
pub use pdf::{RenderedReport, TocEntry};
pub use photos::{DirPhotoStore, PhotoError, PhotoStore};

use std::path::Path;
use std::time::Instant;

/// Render `report` into an in-memory PDF, fetching photos from `photos`.
///
/// Photo failures never fail the document; only an unusable configured font
/// does.
pub async fn render_report(
    report: &Report,
    photos: &dyn PhotoStore,
    config: &RenderConfig,
) -> Result<RenderedReport, Error> {
    pdf::render(report, photos, config).await
}

pub async fn render_report_to_file(
    report: &Report,
    photos: &dyn PhotoStore,
    config: &RenderConfig,
    output: &Path,
) -> Result<RenderedReport, Error> {
    let t0 = Instant::now();

    let rendered = pdf::render(report, photos, config).await?;
    let t_render = t0.elapsed();

    std::fs::write(output, &rendered.pdf).map_err(Error::Io)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes, {} pages)",
        t_render.as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        rendered.pdf.len(),
        rendered.page_count,
    );

    Ok(rendered)
}
