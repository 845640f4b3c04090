//! Configuration for letter analysis.
//!
//! All pipeline behaviour is controlled through [`AnalyzerConfig`], built via
//! its [`AnalyzerConfigBuilder`]. The config is created once at startup,
//! wrapped in an `Arc`, and shared read-only by every request. The model
//! credential lives here as well, so the client constructor receives it
//! explicitly instead of reading process-global state.

use crate::error::AnalyzerError;
use std::fmt;
use std::path::PathBuf;

/// Provider used when none is configured.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Model used with the default provider.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Vision-capable model for a provider when `--model` is not given.
///
/// Returns `None` for providers without a sensible default; those need an
/// explicit model.
pub fn default_model_for(provider: &str) -> Option<&'static str> {
    match provider.trim().to_ascii_lowercase().as_str() {
        "gemini" | "google" => Some(DEFAULT_MODEL),
        "openai" => Some("gpt-4.1-nano"),
        "anthropic" | "claude" => Some("claude-sonnet-4-20250514"),
        "mistral" => Some("pixtral-12b-2409"),
        "ollama" | "lmstudio" | "lm-studio" => Some("llava"),
        "mock" => Some("mock-model"),
        _ => None,
    }
}

/// Configuration for the letter-analysis pipeline.
///
/// # Example
/// ```rust
/// use letter_analyzer::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .api_key("test-key")
///     .dpi(200)
///     .api_timeout_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–600. Default: 300.
    ///
    /// Letters are often scanned with small print (footers, bank details).
    /// 300 DPI keeps that legible for the model.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 4000.
    ///
    /// An A4 page at 300 DPI is 2480 × 3508 px. The cap only bites for
    /// oversized pages and keeps a single upload from exhausting memory.
    pub max_rendered_pixels: u32,

    /// LLM provider name. `"gemini"` is built with [`Self::api_key`]; any
    /// other name is resolved through `edgequake_llm::ProviderFactory`.
    pub provider_name: String,

    /// Model identifier. If None, uses [`default_model_for`] the provider.
    pub model: Option<String>,

    /// API key for the Gemini provider. Required when `provider_name == "gemini"`.
    pub api_key: Option<String>,

    /// Sampling temperature for the model call. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    pub max_tokens: usize,

    /// Upper bound on one model call, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Custom instruction text. If None, uses [`crate::prompts::SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Reject model answers that do not match the analysis schema. Default: false.
    ///
    /// When false, schema drift is logged and the object is returned as-is.
    pub strict_schema: bool,

    /// Path to the pdfium shared library. If None, the system library is used.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            max_rendered_pixels: 4000,
            provider_name: DEFAULT_PROVIDER.to_string(),
            model: None,
            api_key: None,
            temperature: 0.1,
            max_tokens: 4096,
            api_timeout_secs: 120,
            system_prompt: None,
            strict_schema: false,
            pdfium_lib_path: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("strict_schema", &self.strict_schema)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model identifier to request: the explicit model, else the
    /// provider's default. Empty only for an unvalidated config.
    pub fn model_or_default(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| default_model_for(&self.provider_name))
            .unwrap_or("")
    }

    /// The instruction text sent ahead of the page images.
    pub fn instruction(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(crate::prompts::SYSTEM_PROMPT)
    }

    /// `true` when the Gemini provider is built from [`Self::api_key`].
    pub fn uses_gemini(&self) -> bool {
        self.provider_name.eq_ignore_ascii_case(DEFAULT_PROVIDER)
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn strict_schema(mut self, v: bool) -> Self {
        self.config.strict_schema = v;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, AnalyzerError> {
        let c = &self.config;
        if c.provider_name.trim().is_empty() {
            return Err(AnalyzerError::InvalidConfig(
                "Provider name must not be empty".into(),
            ));
        }
        if c.uses_gemini() && c.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(AnalyzerError::InvalidConfig(
                "GOOGLE_API_KEY is not set; the gemini provider needs an API key".into(),
            ));
        }
        if c.model_or_default().is_empty() {
            return Err(AnalyzerError::InvalidConfig(format!(
                "Provider '{}' has no default model; pass --model",
                c.provider_name
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
