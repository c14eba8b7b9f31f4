//! Redaction entry points: run the whole pipeline for one document.
//!
//! The order is fixed and linear:
//!
//! ```text
//! upload → OCR → search context → PII search → markup → burn → flatten → re-OCR → download
//! ```
//!
//! Each stage starts only once the previous one has produced its artifact
//! id. The first failure aborts the run; artifacts already created on the
//! server are left there.

use crate::client::ServerClient;
use crate::config::RedactionConfig;
use crate::error::RedactError;
use crate::output::{PipelineTrace, RedactionOutput, RedactionStats};
use crate::pipeline::job::{JobClient, PollSleeper};
use crate::pipeline::workfile::WorkFileStore;
use crate::pipeline::{burn, convert, input, markup, search};
use crate::progress::PipelineStage;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Runs the redaction pipeline against one server.
#[derive(Clone)]
pub struct Redactor {
    config: RedactionConfig,
    jobs: JobClient,
    store: WorkFileStore,
}

impl Redactor {
    pub fn new(config: &RedactionConfig) -> Result<Self, RedactError> {
        let server = ServerClient::new(config)?;
        Ok(Self {
            config: config.clone(),
            jobs: JobClient::new(server.clone(), config),
            store: WorkFileStore::new(server),
        })
    }

    /// Replace the sleeper used between job status polls.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn PollSleeper>) -> Self {
        self.jobs = self.jobs.with_sleeper(sleeper);
        self
    }

    /// Redact `pdf` and return the final document bytes.
    pub async fn run(&self, pdf: Vec<u8>) -> Result<RedactionOutput, RedactError> {
        let start = Instant::now();
        let input_bytes = pdf.len();
        let mut trace = PipelineTrace::default();

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_run_start(PipelineStage::ALL.len());
        }
        info!(
            "Redacting {} bytes via {}",
            input_bytes,
            self.jobs.server().base_url()
        );

        // ── Upload ───────────────────────────────────────────────────────
        self.stage_start(PipelineStage::Upload);
        trace.input_file_id = self.store.upload(pdf, "application/pdf", "pdf").await?;
        self.stage_done(PipelineStage::Upload, &trace.input_file_id);

        // ── OCR ──────────────────────────────────────────────────────────
        self.stage_start(PipelineStage::Ocr);
        trace.searchable_file_id = convert::create_searchable_pdf(
            &self.jobs,
            &trace.input_file_id,
            &self.config.ocr_language,
        )
        .await?;
        self.stage_done(PipelineStage::Ocr, &trace.searchable_file_id);

        // ── Search context ───────────────────────────────────────────────
        self.stage_start(PipelineStage::SearchContext);
        trace.search_context_id =
            search::create_search_context(&self.jobs, &trace.searchable_file_id).await?;
        self.stage_done(PipelineStage::SearchContext, &trace.search_context_id);

        // ── PII search ───────────────────────────────────────────────────
        self.stage_start(PipelineStage::PiiSearch);
        let entities = search::perform_pii_search(&self.jobs, &trace.search_context_id).await?;
        trace.pii_entity_count = entities.len();
        self.stage_done(
            PipelineStage::PiiSearch,
            &format!("{} entities", entities.len()),
        );

        // ── Markup ───────────────────────────────────────────────────────
        self.stage_start(PipelineStage::Markup);
        let layer = markup::synthesize_markup(&entities);
        trace.mark_count = layer.len();
        trace.markup_file_id = markup::upload_markup(&self.store, &layer).await?;
        self.stage_done(PipelineStage::Markup, &trace.markup_file_id);

        // ── Burn ─────────────────────────────────────────────────────────
        self.stage_start(PipelineStage::Burn);
        trace.burned_file_id = burn::burn_markup(
            &self.jobs,
            &trace.searchable_file_id,
            &trace.markup_file_id,
        )
        .await?;
        self.stage_done(PipelineStage::Burn, &trace.burned_file_id);

        // ── Flatten ──────────────────────────────────────────────────────
        self.stage_start(PipelineStage::Flatten);
        trace.flattened_file_id =
            convert::create_flattened_pdf(&self.jobs, &trace.burned_file_id).await?;
        self.stage_done(PipelineStage::Flatten, &trace.flattened_file_id);

        // ── Re-OCR ───────────────────────────────────────────────────────
        self.stage_start(PipelineStage::ReOcr);
        trace.final_file_id = convert::create_searchable_pdf(
            &self.jobs,
            &trace.flattened_file_id,
            &self.config.ocr_language,
        )
        .await?;
        self.stage_done(PipelineStage::ReOcr, &trace.final_file_id);

        // ── Download ─────────────────────────────────────────────────────
        self.stage_start(PipelineStage::Download);
        let pdf = self.store.download(&trace.final_file_id).await?;
        self.stage_done(PipelineStage::Download, &format!("{} bytes", pdf.len()));

        let stats = RedactionStats {
            input_bytes,
            output_bytes: pdf.len(),
            total_duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "Redaction complete: {} marks over {} entities, {}ms total",
            trace.mark_count, trace.pii_entity_count, stats.total_duration_ms
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_run_complete(pdf.len());
        }

        Ok(RedactionOutput { pdf, trace, stats })
    }

    /// Read `input_path`, redact it, and write the result to `output_path`.
    ///
    /// Uses atomic write (temp file + rename) so a failed run never leaves a
    /// partial output behind.
    pub async fn redact_file(
        &self,
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
    ) -> Result<RedactionOutput, RedactError> {
        let bytes = input::read_input_pdf(input_path.as_ref()).await?;
        let output = self.run(bytes).await?;
        write_atomic(output_path.as_ref(), &output.pdf).await?;
        info!("Wrote {}", output_path.as_ref().display());
        Ok(output)
    }

    fn stage_start(&self, stage: PipelineStage) {
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage_start(stage);
        }
    }

    fn stage_done(&self, stage: PipelineStage, artifact: &str) {
        info!("{}: {}", stage, artifact);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage_complete(stage, artifact);
        }
    }
}

/// Redact PDF bytes held in memory.
pub async fn redact_bytes(
    pdf: Vec<u8>,
    config: &RedactionConfig,
) -> Result<RedactionOutput, RedactError> {
    input::check_pdf_magic(&pdf, Path::new("<memory>"))?;
    Redactor::new(config)?.run(pdf).await
}

/// Redact the PDF at `input_path` into `output_path`.
pub async fn redact_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &RedactionConfig,
) -> Result<RedactionOutput, RedactError> {
    Redactor::new(config)?
        .redact_file(input_path, output_path)
        .await
}

/// Synchronous wrapper around [`redact_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn redact_sync(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &RedactionConfig,
) -> Result<RedactionOutput, RedactError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| RedactError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(redact_file(input_path, output_path, config))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RedactError> {
    let write_err = |source: std::io::Error| RedactError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let tmp = tmp_path(path);
    let written = match tokio::fs::write(&tmp, bytes).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!("Could not remove '{}': {}", tmp.display(), cleanup);
            }
        }
        return Err(write_err(e));
    }
    Ok(())
}
