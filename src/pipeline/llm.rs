//! Model interaction: send a [`ModelRequest`] and get raw text back.
//!
//! This module is intentionally thin. All prompt engineering lives in
//! [`crate::prompts`] and all parsing in [`super::decode`].
//!
//! Every backend is an `edgequake_llm` provider wrapped in [`ProviderModel`]:
//!
//! * `gemini` (the default) is built directly with the API key held in
//!   [`AnalyzerConfig`], so no process environment is consulted per request.
//! * Any other provider name is resolved through `ProviderFactory`, which
//!   reads the matching `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, … itself.
//!
//! Exactly one attempt is made per request, bounded by
//! `AnalyzerConfig::api_timeout_secs`.

use super::compose::ModelRequest;
use crate::config::AnalyzerConfig;
use crate::error::{AnalyzerError, ProviderError};
use async_trait::async_trait;
use edgequake_llm::{
    ChatMessage, CompletionOptions, GeminiProvider, LLMProvider, LlmError, ProviderFactory,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A vision model that answers a [`ModelRequest`] with raw text.
#[async_trait]
pub trait LetterModel: Send + Sync {
    /// Provider/model label for log lines.
    fn name(&self) -> &str;

    /// Perform one model call.
    async fn generate(&self, request: &ModelRequest) -> Result<String, ProviderError>;
}

/// Build the model backend selected by `config`.
pub fn resolve_model(config: &AnalyzerConfig) -> Result<Arc<dyn LetterModel>, AnalyzerError> {
    let model = ProviderModel::from_config(config)?;
    info!("Using model '{}'", model.name());
    Ok(Arc::new(model))
}

/// [`LetterModel`] backed by any `edgequake_llm` provider.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    label: String,
    options: CompletionOptions,
    timeout: Duration,
}

impl ProviderModel {
    /// Wrap an already-constructed provider.
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        label: impl Into<String>,
        config: &AnalyzerConfig,
    ) -> Self {
        Self {
            provider,
            label: label.into(),
            options: build_options(config),
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    /// Instantiate `config.provider_name` with its resolved model.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let name = config.provider_name.as_str();
        let model = config.model_or_default();
        let label = format!("{name}/{model}");

        if config.uses_gemini() {
            let key = config
                .api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| ProviderError::NotConfigured {
                    provider: name.to_string(),
                    hint: "set GOOGLE_API_KEY".to_string(),
                })?;
            let provider = GeminiProvider::new(key).with_model(model);
            return Ok(Self::new(Arc::new(provider), label, config));
        }

        let provider = ProviderFactory::create_llm_provider(name, model).map_err(|e| {
            ProviderError::NotConfigured {
                provider: name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider, label, config))
    }

    /// Model identifier the wrapped provider will request.
    pub fn model_id(&self) -> &str {
        self.provider.model()
    }
}

#[async_trait]
impl LetterModel for ProviderModel {
    fn name(&self) -> &str {
        &self.label
    }

    /// The instruction and all pages go out as a single user turn, matching
    /// the payload order: instruction text first, then images.
    async fn generate(&self, request: &ModelRequest) -> Result<String, ProviderError> {
        let messages = vec![ChatMessage::user_with_images(
            request.instruction(),
            request.pages().to_vec(),
        )];

        let start = Instant::now();
        let response = tokio::time::timeout(
            self.timeout,
            self.provider.chat(&messages, Some(&self.options)),
        )
        .await
        .map_err(|_| ProviderError::Timeout {
            secs: self.timeout.as_secs(),
        })?
        .map_err(|e| provider_error(e, self.timeout))?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.label,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(response.content)
    }
}

/// Build `CompletionOptions` from the analyzer config.
fn build_options(config: &AnalyzerConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Classify a provider failure.
fn provider_error(err: LlmError, timeout: Duration) -> ProviderError {
    match err {
        LlmError::Timeout => ProviderError::Timeout {
            secs: timeout.as_secs(),
        },
        LlmError::NetworkError(msg) => ProviderError::Transport(msg),
        other => ProviderError::Api {
            status: None,
            message: other.to_string(),
        },
    }
}
