//! Result types returned by a redaction run.

use serde::{Deserialize, Serialize};

/// Every identifier produced while threading one document through the
/// pipeline, in the order they were created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineTrace {
    /// Work file holding the uploaded input.
    pub input_file_id: String,
    /// Searchable PDF produced by the first OCR pass.
    pub searchable_file_id: String,
    /// Search context indexing the searchable PDF.
    pub search_context_id: String,
    /// Number of PII entities the detector reported.
    pub pii_entity_count: usize,
    /// Number of redaction marks drawn.
    pub mark_count: usize,
    /// Work file holding the serialised markup layer.
    pub markup_file_id: String,
    /// Searchable PDF with the markup burned in.
    pub burned_file_id: String,
    /// Rasterised (text-free) version of the burned document.
    pub flattened_file_id: String,
    /// Final, re-OCRed document.
    pub final_file_id: String,
}

/// The redacted document and how it was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionOutput {
    /// Bytes of the final PDF.
    #[serde(skip)]
    pub pdf: Vec<u8>,
    pub trace: PipelineTrace,
    pub stats: RedactionStats,
}

/// Timing and size figures for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionStats {
    pub input_bytes: usize,
    pub output_bytes: usize,
    pub total_duration_ms: u64,
}
