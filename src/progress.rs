//! Progress-callback trait for stage-level pipeline events.
//!
//! Inject an [`Arc<dyn RedactionProgressCallback>`] via
//! [`crate::config::RedactionConfigBuilder::progress_callback`] to be told
//! when each remote stage starts and which artifact it produced.
//!
//! # Example
//!
//! ```rust
//! use edgequake_redact::{PipelineStage, RedactionConfig, RedactionProgressCallback};
//! use std::sync::Arc;
//!
//! struct PrintStages;
//!
//! impl RedactionProgressCallback for PrintStages {
//!     fn on_stage_complete(&self, stage: PipelineStage, artifact: &str) {
//!         eprintln!("{stage}: {artifact}");
//!     }
//! }
//!
//! let config = RedactionConfig::builder("http://localhost:18681")
//!     .progress_callback(Arc::new(PrintStages))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The observable steps of a redaction run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Upload,
    Ocr,
    SearchContext,
    PiiSearch,
    Markup,
    Burn,
    Flatten,
    ReOcr,
    Download,
}

impl PipelineStage {
    /// Every stage in the order the orchestrator runs them.
    pub const ALL: [PipelineStage; 9] = [
        PipelineStage::Upload,
        PipelineStage::Ocr,
        PipelineStage::SearchContext,
        PipelineStage::PiiSearch,
        PipelineStage::Markup,
        PipelineStage::Burn,
        PipelineStage::Flatten,
        PipelineStage::ReOcr,
        PipelineStage::Download,
    ];

    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Upload => "upload input",
            PipelineStage::Ocr => "OCR to searchable PDF",
            PipelineStage::SearchContext => "create search context",
            PipelineStage::PiiSearch => "detect PII",
            PipelineStage::Markup => "build redaction markup",
            PipelineStage::Burn => "burn markup",
            PipelineStage::Flatten => "flatten to image",
            PipelineStage::ReOcr => "re-OCR flattened output",
            PipelineStage::Download => "download result",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the orchestrator as it moves through the pipeline.
///
/// Stages run strictly one after another, so calls never overlap, but the
/// trait is `Send + Sync` so a callback can be shared with other tasks.
/// All methods default to no-ops.
pub trait RedactionProgressCallback: Send + Sync {
    /// Called once before the input is uploaded.
    fn on_run_start(&self, total_stages: usize) {
        let _ = total_stages;
    }

    /// Called just before a stage issues its first request.
    fn on_stage_start(&self, stage: PipelineStage) {
        let _ = stage;
    }

    /// Called when a stage has finished.
    ///
    /// `artifact` is the identifier the stage produced: a work-file id, the
    /// search context id, or, for [`PipelineStage::PiiSearch`] and
    /// [`PipelineStage::Download`], a short count summary.
    fn on_stage_complete(&self, stage: PipelineStage, artifact: &str) {
        let _ = (stage, artifact);
    }

    /// Called once after the output bytes have been retrieved.
    fn on_run_complete(&self, output_bytes: usize) {
        let _ = output_bytes;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RedactionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RedactionConfig`].
pub type ProgressCallback = Arc<dyn RedactionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCallback {
        events: Mutex<Vec<(PipelineStage, String)>>,
    }

    impl RedactionProgressCallback for RecordingCallback {
        fn on_stage_complete(&self, stage: PipelineStage, artifact: &str) {
            self.events
                .lock()
                .unwrap()
                .push((stage, artifact.to_string()));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(9);
        cb.on_stage_start(PipelineStage::Upload);
        cb.on_stage_complete(PipelineStage::Upload, "wf-1");
        cb.on_run_complete(1024);
    }

    #[test]
    fn recording_callback_receives_events() {
        let cb = RecordingCallback::default();
        cb.on_stage_complete(PipelineStage::Upload, "A");
        cb.on_stage_complete(PipelineStage::Ocr, "B");
        let events = cb.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], (PipelineStage::Ocr, "B".to_string()));
    }

    #[test]
    fn stage_order_starts_with_upload_and_ends_with_download() {
        assert_eq!(PipelineStage::ALL.first(), Some(&PipelineStage::Upload));
        assert_eq!(PipelineStage::ALL.last(), Some(&PipelineStage::Download));
        assert_eq!(PipelineStage::ReOcr.to_string(), "re-OCR flattened output");
    }
}
