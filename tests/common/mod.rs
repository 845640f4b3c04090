//! Helpers shared by the integration tests.
#![allow(dead_code)]

use letter_analyzer::pipeline::render::bind_pdfium;
use pdfium_render::prelude::Pdfium;
use std::path::PathBuf;

/// pdfium library given by `PDFIUM_LIB_PATH`, if any.
pub fn pdfium_lib_path() -> Option<PathBuf> {
    std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from)
}

/// Bind pdfium, or return `None` so the caller can skip.
///
/// With `LETTER_ANALYZER_REQUIRE_PDFIUM` set, a missing library fails the
/// test instead of skipping it.
pub fn pdfium() -> Option<Pdfium> {
    match bind_pdfium(pdfium_lib_path().as_deref()) {
        Ok(p) => Some(p),
        Err(e) if std::env::var_os("LETTER_ANALYZER_REQUIRE_PDFIUM").is_some() => {
            panic!("pdfium is required but could not be bound: {e}")
        }
        Err(e) => {
            eprintln!("skipping: {e}");
            None
        }
    }
}

/// Build a PDF with one blank page per `(width, height)` entry, in points.
pub fn blank_pdf(pages: &[(u32, u32)]) -> Vec<u8> {
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 3 + i).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
    ];
    for (w, h) in pages {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {w} {h}] >>"
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for off in offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}
