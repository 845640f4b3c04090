//! CLI binary for letter-analyzer.
//!
//! `serve` runs the HTTP API; `analyze` runs one local file through the same
//! pipeline and prints the JSON answer.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use letter_analyzer::server::DEFAULT_MAX_UPLOAD_BYTES;
use letter_analyzer::{analyze_file, resolve_model, router, serve, AnalyzerConfig, AppState};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP API on 0.0.0.0:8000
  letter-analyzer serve

  # Analyse a single letter from disk
  letter-analyzer analyze brief.pdf

  # Upload against a running server
  curl -F "file=@brief.pdf;type=application/pdf" http://localhost:8000/analyze-letter/

ENVIRONMENT VARIABLES:
  GOOGLE_API_KEY              Gemini API key (required for the default provider)
  LETTER_ANALYZER_PROVIDER    Provider name (default: gemini)
  LETTER_ANALYZER_MODEL       Model ID (default depends on the provider)
  OPENAI_API_KEY, ...         Keys for non-Gemini providers
  PDFIUM_LIB_PATH             Path to libpdfium; the system library is used otherwise
  HOST / PORT                 Bind address for `serve`
  RUST_LOG                    Log filter, overrides --verbose

A .env file in the working directory is loaded on startup.
"#;

/// Analyse German official letters with a vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "letter-analyzer",
    version,
    about = "Analyse German official letters (PDF, JPEG, PNG) with a vision LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    model: ModelArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "LETTER_ANALYZER_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// LLM provider: gemini, openai, anthropic, mistral, ollama, lmstudio, or any other edgequake-llm provider name.
    #[arg(long, global = true, env = "LETTER_ANALYZER_PROVIDER", default_value = "gemini")]
    provider: String,

    /// Model ID. Defaults per provider (gemini-1.5-flash, gpt-4.1-nano, llava, ...).
    #[arg(long, global = true, env = "LETTER_ANALYZER_MODEL")]
    model: Option<String>,

    /// Gemini API key.
    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Rendering DPI for PDF pages (72–600).
    #[arg(long, global = true, env = "LETTER_ANALYZER_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Maximum rendered page edge in pixels.
    #[arg(long, global = true, env = "LETTER_ANALYZER_MAX_PIXELS", default_value_t = 4000)]
    max_pixels: u32,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "LETTER_ANALYZER_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, global = true, env = "LETTER_ANALYZER_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM call timeout in seconds.
    #[arg(long, global = true, env = "LETTER_ANALYZER_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Reject model answers that do not match the analysis schema.
    #[arg(long, global = true, env = "LETTER_ANALYZER_STRICT_SCHEMA")]
    strict_schema: bool,

    /// Path to a text file containing a custom instruction.
    #[arg(long, global = true, env = "LETTER_ANALYZER_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Path to the pdfium shared library.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// Interface to bind.
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: IpAddr,

        /// Port to bind.
        #[arg(long, env = "PORT", default_value_t = 8000)]
        port: u16,

        /// Maximum upload size in MiB.
        #[arg(long, env = "LETTER_ANALYZER_MAX_UPLOAD_MB", default_value_t = DEFAULT_MAX_UPLOAD_BYTES / (1024 * 1024))]
        max_upload_mb: usize,
    },

    /// Analyse one local file and print the JSON answer.
    Analyze {
        /// PDF, JPEG or PNG file.
        file: PathBuf,

        /// Print compact JSON instead of pretty-printed.
        #[arg(long)]
        compact: bool,

        /// Disable the spinner.
        #[arg(long)]
        no_progress: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli.model).await?;

    match cli.command {
        Command::Serve {
            host,
            port,
            max_upload_mb,
        } => {
            let model = resolve_model(&config).context("Failed to initialise the model client")?;
            let app = router(AppState::new(config, model), max_upload_mb * 1024 * 1024);
            serve(app, SocketAddr::new(host, port))
                .await
                .context("HTTP server failed")?;
        }
        Command::Analyze {
            file,
            compact,
            no_progress,
        } => {
            let spinner = (!no_progress).then(|| {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner())
                        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
                );
                bar.set_prefix("Analysing");
                bar.set_message(file.display().to_string());
                bar.enable_steady_tick(Duration::from_millis(80));
                bar
            });

            let result = analyze_file(&file, &config).await;
            if let Some(bar) = spinner {
                bar.finish_and_clear();
            }
            let value = result.with_context(|| format!("Analysis of {} failed", file.display()))?;

            let json = if compact {
                serde_json::to_string(&value)
            } else {
                serde_json::to_string_pretty(&value)
            }
            .context("Failed to serialise analysis")?;
            println!("{json}");
        }
    }

    Ok(())
}

/// Map CLI args to `AnalyzerConfig`.
async fn build_config(args: &ModelArgs) -> Result<AnalyzerConfig> {
    let mut builder = AnalyzerConfig::builder()
        .provider_name(&args.provider)
        .dpi(args.dpi)
        .max_rendered_pixels(args.max_pixels)
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .api_timeout_secs(args.api_timeout)
        .strict_schema(args.strict_schema);

    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref key) = args.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref path) = args.pdfium_lib {
        builder = builder.pdfium_lib_path(path);
    }
    if let Some(ref path) = args.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
