//! Error types for the letter-analyzer library.
//!
//! Every request ends in exactly one of two outcomes: a decoded analysis or a
//! single [`AnalyzerError`]. The error carries enough structure to choose the
//! HTTP status without string matching:
//!
//! * [`AnalyzerError::UnsupportedMediaType`] / [`AnalyzerError::InvalidUpload`]
//!   are caller mistakes and map to `400 Bad Request`.
//! * [`DecodeError`] covers everything that could not be *read*: the uploaded
//!   document itself, or the model's answer. Maps to `500`.
//! * [`ProviderError`] covers the outbound model call. Maps to `500` with the
//!   provider's message included.
//!
//! Raw model output attached to a [`DecodeError`] is for server-side logs
//! only and is never written into a response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// All errors returned by the letter-analyzer library.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The upload declared a content type other than PDF, JPEG or PNG.
    #[error("Invalid file type '{content_type}'. Supported types: application/pdf, image/jpeg, image/png")]
    UnsupportedMediaType { content_type: String },

    /// The request body could not be read as a file upload.
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// The document or the model's answer could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The external model call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure to read either the uploaded document or the model's answer.
#[derive(Debug, Error)]
pub enum DecodeError {
    // ── Document side ─────────────────────────────────────────────────────
    /// Image bytes were not a valid JPEG/PNG.
    #[error("image could not be decoded: {detail}")]
    Image { detail: String },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF could not be opened: {detail}")]
    Pdf { detail: String },

    /// PDF requires a password.
    #[error("PDF is encrypted and requires a password")]
    PasswordProtected,

    /// pdfium failed to render a specific page (1-indexed).
    #[error("rasterisation failed for page {page}: {detail}")]
    Rasterisation { page: usize, detail: String },

    /// Rasterisation succeeded but produced no pages.
    #[error("document contains no pages to analyse")]
    EmptyDocument,

    // ── Model side ────────────────────────────────────────────────────────
    /// The model's answer is not JSON at all.
    #[error("model response is not valid JSON: {source}")]
    NotJson {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    /// The model's answer is JSON, but not an object.
    #[error("model response is JSON but not an object")]
    NotAnObject { raw: String },

    /// The model's answer is a JSON object that does not match the schema.
    #[error("model response does not match the analysis schema: {detail}")]
    Schema { detail: String, raw: String },
}

impl DecodeError {
    /// `true` when the failure is in the model's answer, not the upload.
    pub fn is_model_output(&self) -> bool {
        matches!(
            self,
            DecodeError::NotJson { .. } | DecodeError::NotAnObject { .. } | DecodeError::Schema { .. }
        )
    }

    /// The raw model text, when the failure is in the model's answer.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            DecodeError::NotJson { raw, .. }
            | DecodeError::NotAnObject { raw }
            | DecodeError::Schema { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Failure of the single outbound call to the model provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The provider could not be constructed (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured: {hint}")]
    NotConfigured { provider: String, hint: String },

    /// The provider answered with a non-success status.
    #[error("LLM API error{}: {message}", status_suffix(.status))]
    Api { status: Option<u16>, message: String },

    /// The request never produced an answer (DNS, TLS, connection reset, …).
    #[error("LLM transport error: {0}")]
    Transport(String),

    /// The call exceeded the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The provider answered, but with no text.
    #[error("LLM returned an empty response")]
    EmptyResponse,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

// ── HTTP mapping ─────────────────────────────────────────────────────────────

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: &'static str,
}

impl AnalyzerError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalyzerError::UnsupportedMediaType { .. } | AnalyzerError::InvalidUpload(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            AnalyzerError::UnsupportedMediaType { .. } => "invalid_file_type",
            AnalyzerError::InvalidUpload(_) => "invalid_upload",
            AnalyzerError::Decode(e) if e.is_model_output() => "invalid_model_output",
            AnalyzerError::Decode(_) => "invalid_document",
            AnalyzerError::Provider(_) => "provider_error",
            AnalyzerError::PdfiumBindingFailed(_)
            | AnalyzerError::InvalidConfig(_)
            | AnalyzerError::Internal(_) => "internal_error",
        }
    }

    /// The message shown to the caller.
    ///
    /// Model-output failures get a fixed message; the raw text stays in the
    /// server log.
    pub fn public_message(&self) -> String {
        match self {
            AnalyzerError::UnsupportedMediaType { .. } | AnalyzerError::InvalidUpload(_) => {
                self.to_string()
            }
            AnalyzerError::Decode(e) if e.is_model_output() => {
                "The AI model returned an invalid format.".to_string()
            }
            AnalyzerError::Decode(e) => format!("The uploaded document could not be read: {e}"),
            AnalyzerError::Provider(e) => format!("An internal server error occurred: {e}"),
            // The binding hint names host paths; it stays in the log.
            AnalyzerError::PdfiumBindingFailed(_) => {
                "An internal server error occurred: PDF rendering is unavailable.".to_string()
            }
            other => format!("An internal server error occurred: {other}"),
        }
    }
}

impl IntoResponse for AnalyzerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let body = ErrorResponse {
            message: self.public_message(),
            code: self.error_code(),
        };
        (status, Json(body)).into_response()
    }
}
