use super::error::{PdfError, Result};
use image::DynamicImage;
use pdfium_render::prelude::*;

/// Resolution of a page rendered at scale 1.0.
pub const PDF_POINTS_PER_INCH: f32 = 72.0;

/// Rendered dimension cap, matching the largest bitmap pdfium will allocate.
const MAX_IMAGE_DIMENSION: i32 = 65536;

/// Target pixel size of a page rendered at `scale`.
pub fn target_dimensions(width_points: f32, height_points: f32, scale: f32) -> (i32, i32) {
    let clamp = |v: f32| (v.round() as i32).clamp(1, MAX_IMAGE_DIMENSION);
    (clamp(width_points * scale), clamp(height_points * scale))
}

/// Rasterize a loaded page for OCR.
///
/// `scale` multiplies the page's point size, so 1.0 renders at 72 DPI.
pub fn render_page(page: &PdfPage, scale: f32) -> Result<DynamicImage> {
    let (width, height) = target_dimensions(page.width().value, page.height().value, scale);

    let config = PdfRenderConfig::new()
        .set_target_width(width)
        .set_target_height(height)
        .rotate_if_landscape(PdfPageRenderRotation::None, false);

    let bitmap = page
        .render_with_config(&config)
        .map_err(|e| PdfError::RenderingFailed(format!("Failed to render page: {}", e)))?;

    Ok(DynamicImage::ImageRgb8(bitmap.as_image().into_rgb8()))
}
