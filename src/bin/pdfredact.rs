//! CLI binary for edgequake-redact.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RedactionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_redact::{
    redact_file, PipelineStage, ProgressCallback, RedactionConfig, RedactionProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner showing the running stage plus one
/// log line per finished stage with the artifact it produced.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(PipelineStage::ALL.len() as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{pos}/{len}]  {msg}  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Redacting");
        bar.set_message("connecting…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl RedactionProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_stages: usize) {
        self.bar.set_length(total_stages as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Starting redaction ({total_stages} stages)…"))
        ));
    }

    fn on_stage_start(&self, stage: PipelineStage) {
        self.bar.set_message(stage.label());
    }

    fn on_stage_complete(&self, stage: PipelineStage, artifact: &str) {
        self.bar.println(format!(
            "  {} {:<26} {}",
            green("✓"),
            stage.label(),
            dim(artifact)
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _output_bytes: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Redact a local PDF through a server on localhost
  pdfredact --pd http://localhost:18681 --in statement.pdf --out statement.redacted.pdf

  # Print the artifact trace as JSON
  pdfredact -p http://localhost:18681 -i in.pdf -o out.pdf --json

  # Give up on any job still processing after 10 minutes
  pdfredact -p http://localhost:18681 -i in.pdf -o out.pdf --max-polls 600

PIPELINE:
  upload → OCR → search context → PII detection → markup → burn
         → flatten (TIFF) → re-OCR → download

ENVIRONMENT VARIABLES:
  PDFREDACT_SERVER          Server base URL (same as --pd)
  PDFREDACT_POLL_INTERVAL   Milliseconds between job status checks
  PDFREDACT_MAX_POLLS       Status checks per job before giving up
  RUST_LOG                  Override the log filter (e.g. edgequake_redact=debug)
"#;

/// Redact PII from a PDF using a remote document-processing server.
#[derive(Parser, Debug)]
#[command(
    name = "pdfredact",
    version,
    about = "Redact PII from a PDF using a remote document-processing server",
    long_about = "Upload a PDF, OCR it, detect personally identifiable information, burn \
black redaction marks over every detected line, flatten the result so the underlying text \
cannot be recovered, and OCR it again before writing the final PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Root URL of the document-processing server (no trailing slash).
    #[arg(short = 'p', long = "pd", env = "PDFREDACT_SERVER")]
    server: String,

    /// Path to the input file (must be a PDF).
    #[arg(short = 'i', long = "in")]
    input: PathBuf,

    /// Path to write the redacted PDF to.
    #[arg(short = 'o', long = "out")]
    output: PathBuf,

    /// Milliseconds to wait between job status checks.
    #[arg(long, env = "PDFREDACT_POLL_INTERVAL", default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Status checks per job before giving up (default: wait indefinitely).
    #[arg(long, env = "PDFREDACT_MAX_POLLS")]
    max_polls: Option<u32>,

    /// OCR language.
    #[arg(long, env = "PDFREDACT_LANGUAGE", default_value = "english")]
    language: String,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "PDFREDACT_REQUEST_TIMEOUT", default_value_t = 120)]
    request_timeout: u64,

    /// Print the pipeline trace and stats as JSON on stdout.
    #[arg(long, env = "PDFREDACT_JSON")]
    json: bool,

    /// Disable progress display.
    #[arg(long, env = "PDFREDACT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFREDACT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFREDACT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // With the progress display active, per-stage INFO lines would duplicate
    // what the bar already prints.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn RedactionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = redact_file(&cli.input, &cli.output, &config)
        .await
        .with_context(|| format!("Redaction of '{}' failed", cli.input.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}  {} marks over {} PII entities  {}ms  →  {}",
            green("✔"),
            output.trace.mark_count,
            output.trace.pii_entity_count,
            output.stats.total_duration_ms,
            bold(&cli.output.display().to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `RedactionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RedactionConfig> {
    let mut builder = RedactionConfig::builder(cli.server.clone())
        .poll_interval_ms(cli.poll_interval_ms)
        .ocr_language(cli.language.clone())
        .request_timeout_secs(cli.request_timeout);

    if let Some(n) = cli.max_polls {
        builder = builder.max_polls(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
