//! Request orchestration: one uploaded document in, one JSON object out.
//!
//! The stages run strictly in order and the first failure ends the request:
//!
//! 1. Rasterise the document into page images.
//! 2. Encode each page as base64 PNG.
//! 3. Compose the instruction + pages payload.
//! 4. Make exactly one model call.
//! 5. Strip fences and parse the answer as a JSON object.
//! 6. Check the object against the analysis schema (warn or reject).
//!
//! Nothing is retained between requests.

use crate::config::AnalyzerConfig;
use crate::document::{MediaType, UploadedDocument};
use crate::error::{AnalyzerError, DecodeError};
use crate::pipeline::compose::compose_request;
use crate::pipeline::llm::{resolve_model, LetterModel};
use crate::pipeline::{decode, encode, render};
use serde_json::Value;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Analyse one uploaded letter with the given model.
///
/// # Returns
/// The model's JSON object, unchanged. With `strict_schema` off, a schema
/// mismatch is logged and the object is still returned.
///
/// # Errors
/// * [`DecodeError`] for unreadable documents or unparseable model output.
/// * [`crate::error::ProviderError`] when the model call fails.
pub async fn analyze_document(
    document: UploadedDocument,
    config: &AnalyzerConfig,
    model: &dyn LetterModel,
) -> Result<Value, AnalyzerError> {
    let total_start = Instant::now();
    let name = document.display_name().to_string();
    let media_type = document.media_type;
    info!("Analysing '{}' ({}, {} bytes)", name, media_type, document.bytes.len());

    // ── Step 1: Rasterise ────────────────────────────────────────────────
    let render_start = Instant::now();
    let images = render::rasterize(document, config).await?;
    debug!(
        "Rasterised {} page(s) in {}ms",
        images.len(),
        render_start.elapsed().as_millis()
    );

    // ── Step 2: Encode ───────────────────────────────────────────────────
    let pages = encode::encode_pages(&images)?;
    drop(images);

    // ── Step 3: Compose ──────────────────────────────────────────────────
    let request = compose_request(config.instruction(), pages);

    // ── Step 4: Model call ───────────────────────────────────────────────
    let llm_start = Instant::now();
    let raw = model.generate(&request).await?;
    info!(
        "{} answered for {} page(s) in {}ms",
        model.name(),
        request.page_count(),
        llm_start.elapsed().as_millis()
    );

    // ── Step 5: Decode ───────────────────────────────────────────────────
    let value = decode::decode_response(&raw).inspect_err(|e| {
        error!("Could not decode model answer: {}", e);
        error!("Raw model answer: {}", raw);
    })?;

    // ── Step 6: Schema check ─────────────────────────────────────────────
    if let Err(e) = decode::validate_analysis(&value) {
        if config.strict_schema {
            error!("Rejecting model answer for '{}': {}", name, e);
            error!("Raw model answer: {}", raw);
            let e = match e {
                DecodeError::Schema { detail, .. } => DecodeError::Schema { detail, raw },
                other => other,
            };
            return Err(e.into());
        }
        warn!("Model answer for '{}' deviates from the schema: {}", name, e);
    }

    info!(
        "Analysis of '{}' complete in {}ms",
        name,
        total_start.elapsed().as_millis()
    );
    Ok(value)
}

/// Analyse a file on disk, inferring the media type from its extension.
///
/// The model backend is built from `config`.
pub async fn analyze_file(
    path: impl AsRef<Path>,
    config: &AnalyzerConfig,
) -> Result<Value, AnalyzerError> {
    let path = path.as_ref();
    let media_type = MediaType::from_path(path)?;
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        AnalyzerError::InvalidUpload(format!("cannot read {}: {}", path.display(), e))
    })?;

    let mut document = UploadedDocument::new(bytes, media_type);
    if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
        document = document.with_filename(file_name);
    }

    let model = resolve_model(config)?;
    analyze_document(document, config, model.as_ref()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::pipeline::compose::ModelRequest;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use serde_json::json;
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Returns a canned answer and records what it was asked.
    struct CannedModel {
        answer: Result<String, ProviderError>,
        seen: Mutex<Vec<(String, usize)>>,
    }

    impl CannedModel {
        fn answering(text: &str) -> Self {
            Self {
                answer: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(err: ProviderError) -> Self {
            Self {
                answer: Err(err),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LetterModel for CannedModel {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate(&self, request: &ModelRequest) -> Result<String, ProviderError> {
            self.seen
                .lock()
                .unwrap()
                .push((request.instruction().to_string(), request.page_count()));
            self.answer.clone()
        }
    }

    fn png_letter() -> UploadedDocument {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 30, Rgb([250, 250, 250])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        UploadedDocument::new(buf, MediaType::Png).with_filename("rechnung.png")
    }

    fn config() -> AnalyzerConfig {
        AnalyzerConfig::builder().api_key("test-key").build().unwrap()
    }

    const INVOICE: &str = r#"```json
{
  "category": "FINANCIAL",
  "summary_german": "Rechnung Nr. 123 der ABC GmbH über 50 EUR, fällig am 31.05.2024.",
  "deadline_date": "2024-05-31T21:00:00",
  "deadline_subject": "Payment for Rechnung 123",
  "payment_amount": 50,
  "payment_currency": "EUR",
  "payment_recipient": "ABC GmbH",
  "full_analysis_log": "Invoice with amount and due date."
}
```"#;

    #[tokio::test]
    async fn invoice_image_yields_financial_analysis() {
        let model = CannedModel::answering(INVOICE);
        let value = analyze_document(png_letter(), &config(), &model).await.unwrap();

        assert_eq!(value["category"], "FINANCIAL");
        assert_eq!(value["payment_amount"], json!(50));
        assert_eq!(value["payment_currency"], "EUR");
        assert_eq!(value["deadline_date"], "2024-05-31T21:00:00");

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1, "exactly one model call");
        assert_eq!(seen[0].0, crate::prompts::SYSTEM_PROMPT);
        assert_eq!(seen[0].1, 1);
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let model = CannedModel::failing(ProviderError::Api {
            status: Some(503),
            message: "model overloaded".into(),
        });
        let err = analyze_document(png_letter(), &config(), &model)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Provider(ProviderError::Api { .. })));
        assert!(err.public_message().contains("model overloaded"));
    }

    #[tokio::test]
    async fn prose_answer_is_invalid_model_output() {
        let model = CannedModel::answering("Ich kann diesen Brief nicht lesen.");
        let err = analyze_document(png_letter(), &config(), &model)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_model_output");
    }

    #[tokio::test]
    async fn schema_drift_is_tolerated_unless_strict() {
        let drifted = r#"{"category": "FINANCIAL", "payment_amount": "50 EUR"}"#;

        let model = CannedModel::answering(drifted);
        let value = analyze_document(png_letter(), &config(), &model).await.unwrap();
        assert_eq!(value["payment_amount"], "50 EUR");

        let strict = AnalyzerConfig::builder()
            .api_key("test-key")
            .strict_schema(true)
            .build()
            .unwrap();
        let err = analyze_document(png_letter(), &strict, &model)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::Decode(DecodeError::Schema { .. })
        ));
    }

    #[tokio::test]
    async fn strict_rejection_keeps_the_model_text() {
        let drifted = "```json\n{\"category\": \"URGENT\"}\n```";
        let model = CannedModel::answering(drifted);
        let strict = AnalyzerConfig::builder()
            .api_key("test-key")
            .strict_schema(true)
            .build()
            .unwrap();

        let err = analyze_document(png_letter(), &strict, &model)
            .await
            .unwrap_err();
        let AnalyzerError::Decode(decode_err) = &err else {
            panic!("expected a decode error, got {err:?}");
        };
        assert_eq!(decode_err.raw_response(), Some(drifted));
        assert_eq!(err.public_message(), "The AI model returned an invalid format.");
    }

    #[tokio::test]
    async fn unreadable_image_never_reaches_the_model() {
        let model = CannedModel::answering(INVOICE);
        let doc = UploadedDocument::new(b"not an image".to_vec(), MediaType::Jpeg);
        let err = analyze_document(doc, &config(), &model).await.unwrap_err();
        assert_eq!(err.error_code(), "invalid_document");
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn analyze_file_rejects_unknown_extension() {
        let err = analyze_file("letter.docx", &config()).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::UnsupportedMediaType { .. }));
    }
}
