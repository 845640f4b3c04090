//! HTTP surface: liveness probe and the letter-analysis upload endpoint.

use crate::analyze::analyze_document;
use crate::config::AnalyzerConfig;
use crate::document::{MediaType, UploadedDocument};
use crate::error::AnalyzerError;
use crate::pipeline::llm::LetterModel;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Name reported by the liveness probe.
pub const SERVICE_NAME: &str = "German Letter Analyzer API";

/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

/// Default cap on the request body, in bytes.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Shared, read-only per-process state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AnalyzerConfig>,
    pub model: Arc<dyn LetterModel>,
}

impl AppState {
    pub fn new(config: AnalyzerConfig, model: Arc<dyn LetterModel>) -> Self {
        Self {
            config: Arc::new(config),
            model,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route(
            "/analyze-letter/",
            post(analyze_letter_handler).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Bind `addr` and serve until SIGINT/SIGTERM.
pub async fn serve(app: Router, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("{} listening on http://{}", SERVICE_NAME, listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn root_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        message: format!("{SERVICE_NAME} is running."),
    })
}

/// Accept one multipart upload and return the model's JSON object.
///
/// The declared content type is checked before the body of the file part is
/// read, so rejected uploads never reach rasterisation or the model.
async fn analyze_letter_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AnalyzerError> {
    let mut multipart = multipart.map_err(|e| AnalyzerError::InvalidUpload(e.body_text()))?;
    let document = read_file_field(&mut multipart).await?;
    let value = analyze_document(document, &state.config, state.model.as_ref()).await?;
    Ok(Json(value))
}

async fn read_file_field(multipart: &mut Multipart) -> Result<UploadedDocument, AnalyzerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AnalyzerError::InvalidUpload(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        let media_type = MediaType::from_content_type(field.content_type().unwrap_or(""))?;
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AnalyzerError::InvalidUpload(e.body_text()))?;

        let document = UploadedDocument::new(bytes.to_vec(), media_type);
        return Ok(match filename {
            Some(name) => document.with_filename(name),
            None => document,
        });
    }

    Err(AnalyzerError::InvalidUpload(format!(
        "missing multipart field '{FILE_FIELD}'"
    )))
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
