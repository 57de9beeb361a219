use futures_util::future::join_all;
use image::{ColorType, DynamicImage, ImageFormat};
use pdf_writer::{Filter, Name};

use crate::model::{Item, Photo};
use crate::photos::PhotoStore;

use super::PdfWriter;
use super::blocks::{RULE, Theme};
use super::flow::PageFlow;
use super::layout::stroke_rect;

const FRAME_PAD: f32 = 3.0;

enum ImageData {
    /// JPEG bytes passed through with DCTDecode.
    Jpeg { data: Vec<u8>, gray: bool },
    Flate { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

pub(super) struct PreparedImage {
    pixel_width: u32,
    pixel_height: u32,
    data: ImageData,
}

/// Decode photo bytes into something embeddable. Small RGB/gray JPEGs keep
/// their original bytes; everything else is downscaled to `max_px` and
/// re-encoded as deflated RGB with an optional alpha mask.
pub(super) fn prepare_image(bytes: &[u8], max_px: u32) -> Result<PreparedImage, image::ImageError> {
    let format = image::guess_format(bytes)?;
    let decoded = image::load_from_memory_with_format(bytes, format)?;
    let (w, h) = (decoded.width(), decoded.height());
    let max_px = max_px.max(1);

    if format == ImageFormat::Jpeg && w <= max_px && h <= max_px {
        let gray = match decoded.color() {
            ColorType::L8 => Some(true),
            ColorType::Rgb8 => Some(false),
            _ => None,
        };
        if let Some(gray) = gray {
            return Ok(PreparedImage {
                pixel_width: w,
                pixel_height: h,
                data: ImageData::Jpeg {
                    data: bytes.to_vec(),
                    gray,
                },
            });
        }
    }

    let scaled: DynamicImage = if w > max_px || h > max_px {
        decoded.resize(max_px, max_px, image::imageops::FilterType::Triangle)
    } else {
        decoded
    };
    let rgba = scaled.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());
    let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
    let rgb: Vec<u8> = rgba.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect();
    let alpha = has_alpha.then(|| rgba.pixels().map(|p| p.0[3]).collect::<Vec<u8>>());

    Ok(PreparedImage {
        pixel_width: w,
        pixel_height: h,
        data: ImageData::Flate { rgb, alpha },
    })
}

/// Write the image as an XObject and return its resource name.
pub(super) fn embed_image(writer: &mut PdfWriter, img: &PreparedImage) -> String {
    let xobj_ref = writer.alloc();
    let pdf_name = format!("Im{}", writer.xobjects.len() + 1);
    let (w, h) = (img.pixel_width as i32, img.pixel_height as i32);

    match &img.data {
        ImageData::Jpeg { data, gray } => {
            let mut xobj = writer.pdf.image_xobject(xobj_ref, data);
            xobj.filter(Filter::DctDecode);
            xobj.width(w);
            xobj.height(h);
            if *gray {
                xobj.color_space().device_gray();
            } else {
                xobj.color_space().device_rgb();
            }
            xobj.bits_per_component(8);
        }
        ImageData::Flate { rgb, alpha } => {
            let smask_ref = alpha.as_ref().map(|alpha| {
                let mask_ref = writer.alloc();
                let compressed = miniz_oxide::deflate::compress_to_vec_zlib(alpha, 6);
                let mut mask = writer.pdf.image_xobject(mask_ref, &compressed);
                mask.filter(Filter::FlateDecode);
                mask.width(w);
                mask.height(h);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                mask_ref
            });

            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(rgb, 6);
            let mut xobj = writer.pdf.image_xobject(xobj_ref, &compressed);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }

    writer.xobjects.push((pdf_name.clone(), xobj_ref));
    pdf_name
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum PanelMode {
    /// One large photo across the content width.
    Hero,
    /// A row of equally sized photos.
    Thumbnails,
}

impl PanelMode {
    pub(super) fn for_item(item: &Item, theme: Theme<'_>) -> Self {
        if item.is_important(theme.config.severity_threshold) {
            PanelMode::Hero
        } else {
            PanelMode::Thumbnails
        }
    }

    fn limit(self, theme: Theme<'_>) -> usize {
        match self {
            PanelMode::Hero => theme.config.hero_photo_limit,
            PanelMode::Thumbnails => theme.config.thumbnail_photo_limit,
        }
    }

    fn height(self, theme: Theme<'_>) -> f32 {
        match self {
            PanelMode::Hero => theme.config.hero_height,
            PanelMode::Thumbnails => theme.config.thumbnail_height,
        }
    }

    /// `(x, width)` of the n-th frame.
    fn slot(self, theme: Theme<'_>, n: usize) -> (f32, f32) {
        let gap = theme.config.thumbnail_gap;
        let slots = self.limit(theme).max(1) as f32;
        let w = (theme.width() - gap * (slots - 1.0)) / slots;
        (theme.left() + n as f32 * (w + gap), w)
    }
}

/// Fetch and draw up to the mode's limit of `photos`, in stored order.
/// Photos without a storage reference are ignored; a failed fetch or decode
/// skips that photo only. Returns how many photos were drawn.
pub(super) async fn photo_panel(
    flow: &mut PageFlow,
    writer: &mut PdfWriter,
    theme: Theme<'_>,
    store: &dyn PhotoStore,
    photos: &[Photo],
    mode: PanelMode,
) -> usize {
    let refs: Vec<(&str, &str)> = photos
        .iter()
        .filter_map(Photo::reference)
        .take(mode.limit(theme))
        .collect();
    if refs.is_empty() {
        return 0;
    }

    let height = mode.height(theme);
    let gap = theme.config.thumbnail_gap;
    flow.ensure_space(height + gap);

    // Results come back in request order regardless of completion order.
    let fetched = join_all(
        refs.iter()
            .map(|&(bucket, path)| store.fetch_bytes(bucket, path)),
    )
    .await;

    let top = flow.y();
    let mut drawn = 0usize;
    for (&(bucket, path), result) in refs.iter().zip(fetched) {
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("photo {bucket}/{path} skipped: {e}");
                continue;
            }
        };
        let img = match prepare_image(&bytes, theme.config.max_image_px) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("photo {bucket}/{path} skipped: cannot decode: {e}");
                continue;
            }
        };
        let name = embed_image(writer, &img);

        let (x, w) = mode.slot(theme, drawn);
        let content = flow.content();
        stroke_rect(content, x, top - height, w, height, 0.6, RULE);

        let (inner_w, inner_h) = (w - 2.0 * FRAME_PAD, height - 2.0 * FRAME_PAD);
        let scale = (inner_w / img.pixel_width as f32).min(inner_h / img.pixel_height as f32);
        let (dw, dh) = (img.pixel_width as f32 * scale, img.pixel_height as f32 * scale);
        let dx = x + FRAME_PAD + (inner_w - dw) / 2.0;
        let dy = top - height + FRAME_PAD + (inner_h - dh) / 2.0;
        content.save_state();
        content.transform([dw, 0.0, 0.0, dh, dx, dy]);
        content.x_object(Name(name.as_bytes()));
        content.restore_state();
        drawn += 1;
    }

    if drawn > 0 {
        flow.advance(height + gap);
    }
    log::debug!(
        "photo panel {mode:?}: {drawn}/{} drawn on page {}",
        refs.len(),
        flow.page_number()
    );
    drawn
}
