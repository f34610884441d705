//! CLI binary for healthlens.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, runs one analysis, and prints the report.

use anyhow::{Context, Result};
use clap::Parser;
use healthlens::{
    analyze_document, generate_document, render, AnalysisConfig, ProviderKind, ReportRegion,
    LOADING_PLACEHOLDER,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyze a lab report photo (report on stdout)
  healthlens blood-test.jpg

  # Structured JSON instead of the text report
  healthlens blood-test.jpg --json

  # Use Groq's two-phase vision pipeline
  healthlens scan.png --provider groq

  # Analyze and export a PDF into ./reports/
  healthlens scan.png --export reports

  # Export only the findings section
  healthlens scan.png --export reports --region findings

SUPPORTED PROVIDERS & MODELS:
  Provider   Default model                   Pipeline
  ────────   ─────────────────────────────   ─────────────────────
  openai     gpt-4o                          single-shot
  groq       llama-3.2-11b-vision-preview    extract → format

REPORT REGIONS:
  full-report (default), summary, findings, terms, recommendations

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  GROQ_API_KEY            Groq API key
  HEALTHLENS_PROVIDER     Override provider (openai, groq)
  HEALTHLENS_MODEL        Override model ID

SETUP:
  1. Set API key:   export OPENAI_API_KEY=sk-...
  2. Analyze:       healthlens lab-results.png

Accepted inputs: PNG, JPEG, or PDF up to 10 MiB. Output is informational
and never a diagnosis — always confirm with a healthcare professional.
"#;

/// Analyze medical documents with vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "healthlens",
    version,
    about = "Analyze medical documents (lab reports, prescriptions, scans) with vision LLMs",
    long_about = "Analyze a photo or scan of a medical document with a vision language model \
and print a structured, patient-friendly report: summary, per-finding status, term \
explanations, and recommendations. Supports OpenAI and Groq.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the document image (PNG, JPEG, or PDF).
    input: PathBuf,

    /// Provider: openai or groq.
    #[arg(
        long,
        env = "HEALTHLENS_PROVIDER",
        long_help = "Vision provider. Auto-detected from API key env vars if not set.\n\
          openai runs a single-shot analysis; groq runs extract-then-format."
    )]
    provider: Option<String>,

    /// Model ID (e.g. gpt-4o, llama-3.2-11b-vision-preview).
    #[arg(long, env = "HEALTHLENS_MODEL")]
    model: Option<String>,

    /// Output structured JSON (AnalysisData) instead of the text report.
    #[arg(long, env = "HEALTHLENS_JSON")]
    json: bool,

    /// Export a PDF report into this directory.
    #[arg(long, env = "HEALTHLENS_EXPORT", value_name = "DIR")]
    export: Option<PathBuf>,

    /// Report region to print / export.
    #[arg(long, env = "HEALTHLENS_REGION", default_value = "full-report")]
    region: String,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "HEALTHLENS_TEMPERATURE", default_value_t = 1.0)]
    temperature: f32,

    /// Max completion tokens for the provider call.
    #[arg(long, env = "HEALTHLENS_MAX_TOKENS", default_value_t = 1500)]
    max_tokens: usize,

    /// Max input file size in MiB.
    #[arg(long, env = "HEALTHLENS_MAX_FILE_SIZE", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..=100))]
    max_file_size: u64,

    /// Provider call timeout in seconds.
    #[arg(long, env = "HEALTHLENS_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "HEALTHLENS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "HEALTHLENS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "HEALTHLENS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library logs go to stderr; the report owns stdout.
    let show_spinner = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_spinner {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // Region is validated up front so a typo fails before any API spend.
    let region = ReportRegion::from_id(&cli.region)
        .with_context(|| format!("Unknown report region '{}'", cli.region))?;

    let config = build_config(&cli)?;

    // ── Run analysis ─────────────────────────────────────────────────────
    let spinner = if show_spinner {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(LOADING_PLACEHOLDER);
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let result = analyze_document(&cli.input, &config).await;

    if let Some(ref bar) = spinner {
        bar.finish_and_clear();
    }

    let data = match result {
        Ok(data) => data,
        Err(err) => {
            // Technical detail stays on the log stream; the terminal gets
            // only the generic user-safe message.
            tracing::error!("Analysis failed: {err}");
            eprintln!("{} {}", red("✘"), err.user_message());
            std::process::exit(1);
        }
    };

    // ── Print result ─────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&data).context("Failed to serialise analysis")?;
        println!("{json}");
    } else if !cli.quiet {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(render(&data, region).as_bytes())
            .context("Failed to write to stdout")?;

        let (normal, abnormal, critical) = healthlens::report::status_counts(&data);
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(&data.document_type),
            dim(&format!(
                "{normal} normal / {abnormal} abnormal / {critical} critical"
            )),
        );
        if critical > 0 {
            eprintln!("{} critical findings present — contact your doctor", yellow("⚠"));
        }
    }

    // ── Optional PDF export ──────────────────────────────────────────────
    if let Some(ref out_dir) = cli.export {
        match generate_document(&data, region.id(), out_dir) {
            Ok(path) => {
                if !cli.quiet {
                    eprintln!("{} PDF saved to {}", green("✔"), bold(&path.display().to_string()));
                }
            }
            Err(err) => {
                tracing::error!("Export failed: {err}");
                eprintln!("{} {}", red("✘"), err.user_message());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Map CLI args to `AnalysisConfig`.
///
/// Keys, provider auto-detection, and `HEALTHLENS_*` reads live in
/// `AnalysisConfig::from_env`; flags are applied on top.
fn build_config(cli: &Cli) -> Result<AnalysisConfig> {
    let env = AnalysisConfig::from_env().context("Invalid configuration")?;

    let mut builder = AnalysisConfig::builder()
        .provider(env.provider)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_file_bytes(cli.max_file_size * 1024 * 1024)
        .api_timeout_secs(cli.api_timeout);

    if let Some(key) = env.openai_api_key {
        builder = builder.openai_api_key(key);
    }
    if let Some(key) = env.groq_api_key {
        builder = builder.groq_api_key(key);
    }
    if let Some(model) = env.model {
        builder = builder.model(model);
    }

    if let Some(ref name) = cli.provider {
        let provider =
            ProviderKind::from_str(name).with_context(|| format!("Unknown provider '{name}'"))?;
        builder = builder.provider(provider);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }

    builder.build().context("Invalid configuration")
}
