//! Page encoding: rendered pages → base64 PNG `ImageData`, in page order.
//!
//! Every page reaches the model as a lossless PNG so the small print of a
//! scanned letter stays crisp. pdfium hands back BGRA bitmaps; a letter page
//! carries no transparency, so the alpha channel is dropped before encoding.

use crate::error::DecodeError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// MIME type of every encoded page.
pub const PAGE_MIME_TYPE: &str = "image/png";

/// Encode all pages, keeping their order. The first failure names its page.
pub fn encode_pages(pages: &[DynamicImage]) -> Result<Vec<ImageData>, DecodeError> {
    pages
        .iter()
        .enumerate()
        .map(|(idx, page)| {
            let data = page_png_base64(page).map_err(|e| DecodeError::Rasterisation {
                page: idx + 1,
                detail: format!("PNG encoding failed: {e}"),
            })?;
            debug!(
                "Page {}/{}: {}x{} px → {} bytes base64",
                idx + 1,
                pages.len(),
                page.width(),
                page.height(),
                data.len()
            );
            Ok(ImageData::new(data, PAGE_MIME_TYPE).with_detail("high"))
        })
        .collect()
}

fn page_png_base64(page: &DynamicImage) -> Result<String, image::ImageError> {
    let opaque = match page {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => None,
        other => Some(DynamicImage::ImageRgb8(other.to_rgb8())),
    };

    let mut png = Vec::new();
    opaque
        .as_ref()
        .unwrap_or(page)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(STANDARD.encode(&png))
}
