//! Document rasterisation: uploaded bytes → ordered page images.
//!
//! Images (JPEG/PNG) are decoded directly and yield exactly one page. PDFs
//! are opened from the in-memory byte slice with pdfium and every page is
//! rendered in document order.
//!
//! ## Why spawn_blocking?
//!
//! Both image decoding and pdfium rendering are CPU-bound, and pdfium is not
//! async-safe. `tokio::task::spawn_blocking` keeps that work off the async
//! worker threads so other requests keep moving.
//!
//! ## DPI and the pixel cap
//!
//! Pages are scaled by `dpi / 72` (PDF user space is 72 points per inch), so
//! the default 300 DPI keeps small print legible. `max_rendered_pixels` caps
//! either edge for oversized pages.

use crate::config::AnalyzerConfig;
use crate::document::{MediaType, UploadedDocument};
use crate::error::{AnalyzerError, DecodeError};
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rasterise an uploaded document into an ordered, non-empty page sequence.
///
/// A zero-page PDF is reported as [`DecodeError::EmptyDocument`]; there is no
/// empty success.
pub async fn rasterize(
    document: UploadedDocument,
    config: &AnalyzerConfig,
) -> Result<Vec<DynamicImage>, AnalyzerError> {
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;
    let lib_path = config.pdfium_lib_path.clone();

    let pages = tokio::task::spawn_blocking(move || {
        rasterize_blocking(&document, dpi, max_pixels, lib_path.as_deref())
    })
    .await
    .map_err(|e| AnalyzerError::Internal(format!("Render task panicked: {}", e)))??;

    Ok(require_pages(pages)?)
}

/// Reject an empty page sequence; a letter has at least one page.
pub fn require_pages(pages: Vec<DynamicImage>) -> Result<Vec<DynamicImage>, DecodeError> {
    if pages.is_empty() {
        return Err(DecodeError::EmptyDocument);
    }
    Ok(pages)
}

/// Blocking half of [`rasterize`]. May return an empty vector for a
/// zero-page PDF.
fn rasterize_blocking(
    document: &UploadedDocument,
    dpi: u32,
    max_pixels: u32,
    lib_path: Option<&Path>,
) -> Result<Vec<DynamicImage>, AnalyzerError> {
    match document.media_type {
        MediaType::Jpeg | MediaType::Png => {
            let image = decode_image(&document.bytes, document.media_type)?;
            Ok(vec![image])
        }
        MediaType::Pdf => {
            let pdfium = bind_pdfium(lib_path)?;
            render_pdf_pages(&pdfium, &document.bytes, dpi, max_pixels)
        }
    }
}

/// Decode a single JPEG or PNG using the declared format.
pub fn decode_image(bytes: &[u8], media_type: MediaType) -> Result<DynamicImage, DecodeError> {
    let format = match media_type {
        MediaType::Jpeg => ImageFormat::Jpeg,
        MediaType::Png => ImageFormat::Png,
        MediaType::Pdf => {
            return Err(DecodeError::Image {
                detail: "a PDF is not an image".to_string(),
            })
        }
    };

    let image = image::load_from_memory_with_format(bytes, format).map_err(|e| {
        DecodeError::Image {
            detail: e.to_string(),
        }
    })?;
    debug!(
        "Decoded {} image → {}x{} px",
        media_type,
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Bind to pdfium: the library at `lib_path` when given, else the system one.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, AnalyzerError> {
    let bindings = match lib_path {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| AnalyzerError::PdfiumBindingFailed(describe_lib(lib_path, e.to_string())))?;

    Ok(Pdfium::new(bindings))
}

fn describe_lib(lib_path: Option<&Path>, reason: String) -> String {
    let target = lib_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("<system library>"));
    format!("{}: {}", target.display(), reason)
}

/// Render every page of an in-memory PDF, in document order.
///
/// Returns an empty vector when the document has no pages.
pub fn render_pdf_pages(
    pdfium: &Pdfium,
    bytes: &[u8],
    dpi: u32,
    max_pixels: u32,
) -> Result<Vec<DynamicImage>, AnalyzerError> {
    let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            DecodeError::PasswordProtected
        } else {
            DecodeError::Pdf { detail: err_str }
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(dpi as f32 / 72.0)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut results = Vec::with_capacity(total_pages);

    for (idx, page) in pages.iter().enumerate() {
        let bitmap =
            page.render_with_config(&render_config)
                .map_err(|e| DecodeError::Rasterisation {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })?;

        let image = bitmap.as_image();
        debug!(
            "Processing page {}/{} → {}x{} px",
            idx + 1,
            total_pages,
            image.width(),
            image.height()
        );

        results.push(image);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn encoded(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    fn sample_image() -> DynamicImage {
        let mut img = RgbImage::from_pixel(12, 7, Rgb([255, 255, 255]));
        img.put_pixel(3, 2, Rgb([10, 20, 30]));
        DynamicImage::ImageRgb8(img)
    }

    #[tokio::test]
    async fn png_upload_yields_exactly_the_decoded_image() {
        let original = sample_image();
        let bytes = encoded(&original, ImageFormat::Png);
        let doc = UploadedDocument::new(bytes, MediaType::Png);

        let pages = rasterize(doc, &AnalyzerConfig::default()).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].to_rgb8(), original.to_rgb8());
    }

    #[tokio::test]
    async fn jpeg_upload_yields_one_page() {
        let bytes = encoded(&sample_image(), ImageFormat::Jpeg);
        let doc = UploadedDocument::new(bytes, MediaType::Jpeg);

        let pages = rasterize(doc, &AnalyzerConfig::default()).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!((pages[0].width(), pages[0].height()), (12, 7));
    }

    #[tokio::test]
    async fn malformed_image_is_a_decode_error() {
        let doc = UploadedDocument::new(b"definitely not a png".to_vec(), MediaType::Png);
        let err = rasterize(doc, &AnalyzerConfig::default()).await.unwrap_err();
        assert!(
            matches!(err, AnalyzerError::Decode(DecodeError::Image { .. })),
            "got: {err:?}"
        );
    }

    #[test]
    fn no_pages_is_an_empty_document() {
        let err = require_pages(Vec::new()).unwrap_err();
        assert!(matches!(err, DecodeError::EmptyDocument), "got: {err:?}");
        assert!(!err.is_model_output());
    }

    #[test]
    fn pages_pass_through_in_order() {
        let pages = vec![
            DynamicImage::ImageRgb8(RgbImage::new(1, 1)),
            DynamicImage::ImageRgb8(RgbImage::new(2, 1)),
        ];
        let kept = require_pages(pages).unwrap();
        let widths: Vec<u32> = kept.iter().map(|p| p.width()).collect();
        assert_eq!(widths, [1, 2]);
    }

    #[test]
    fn declared_format_wins_over_content() {
        // PNG bytes declared as JPEG must not silently decode.
        let bytes = encoded(&sample_image(), ImageFormat::Png);
        assert!(decode_image(&bytes, MediaType::Jpeg).is_err());
    }

    #[test]
    fn bind_to_missing_library_fails() {
        let err = bind_pdfium(Some(Path::new("/nonexistent/libpdfium.so"))).unwrap_err();
        assert!(matches!(err, AnalyzerError::PdfiumBindingFailed(_)));
        assert!(err.to_string().contains("/nonexistent/libpdfium.so"));
    }
}
