//! # letter-analyzer
//!
//! Analyse German official letters with a vision-capable LLM and return a
//! structured JSON summary: category, German summary, deadline and payment
//! details.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (PDF / JPEG / PNG)
//!  │
//!  ├─ 1. Validate  declared content type, before reading the body
//!  ├─ 2. Render    PDF pages at 300 DPI via pdfium (spawn_blocking)
//!  ├─ 3. Encode    PNG → base64 ImageData
//!  ├─ 4. Model     one call: fixed instruction + all pages, temperature 0.1
//!  └─ 5. Decode    strip ```json fences, parse the JSON object
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use letter_analyzer::{analyze_file, AnalyzerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalyzerConfig::builder()
//!         .api_key(std::env::var("GOOGLE_API_KEY")?)
//!         .build()?;
//!     let analysis = analyze_file("brief.pdf", &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&analysis)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `letter-analyzer` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analysis;
pub mod analyze;
pub mod config;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analysis::{Category, LetterAnalysis};
pub use analyze::{analyze_document, analyze_file};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder};
pub use document::{MediaType, UploadedDocument};
pub use error::{AnalyzerError, DecodeError, ErrorResponse, ProviderError};
pub use pipeline::llm::{resolve_model, LetterModel};
pub use server::{router, serve, AppState, SERVICE_NAME};
