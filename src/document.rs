//! The uploaded document and its declared media type.

use crate::error::AnalyzerError;
use std::fmt;
use std::path::Path;

/// Media types the analyzer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Pdf,
    Jpeg,
    Png,
}

impl MediaType {
    /// Parse a declared `Content-Type`.
    ///
    /// Parameters (`; charset=…`) and letter case are ignored. Anything other
    /// than `application/pdf`, `image/jpeg` or `image/png` is rejected.
    pub fn from_content_type(content_type: &str) -> Result<Self, AnalyzerError> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/pdf" => Ok(MediaType::Pdf),
            "image/jpeg" => Ok(MediaType::Jpeg),
            "image/png" => Ok(MediaType::Png),
            _ => Err(AnalyzerError::UnsupportedMediaType {
                content_type: content_type.to_string(),
            }),
        }
    }

    /// Infer the media type from a file extension (CLI input).
    pub fn from_path(path: &Path) -> Result<Self, AnalyzerError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(MediaType::Pdf),
            "jpg" | "jpeg" => Ok(MediaType::Jpeg),
            "png" => Ok(MediaType::Png),
            _ => Err(AnalyzerError::UnsupportedMediaType {
                content_type: format!("(file extension '{ext}')"),
            }),
        }
    }

    /// Canonical MIME string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One uploaded document: raw bytes plus declared media type.
///
/// Lives for a single request and is consumed by rasterisation.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
    pub filename: Option<String>,
}

impl UploadedDocument {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: MediaType) -> Self {
        Self {
            bytes: bytes.into(),
            media_type,
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Name used in log lines.
    pub fn display_name(&self) -> &str {
        self.filename.as_deref().unwrap_or("<unnamed>")
    }
}
