//! # edgequake-redact
//!
//! Redact personally identifiable information (PII) from PDF documents using
//! a remote document-processing server.
//!
//! The server does the heavy lifting (OCR, PII detection, rendering); this
//! crate drives it. Every server operation is an asynchronous job that is
//! created with one request and polled until it completes, and each job's
//! output artifact is the next job's input.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Upload    send the bytes, get a work-file id
//!  ├─ 2. OCR       convert to a searchable PDF
//!  ├─ 3. Index     create a search context over the searchable PDF
//!  ├─ 4. Detect    run PII detection, fetch the entity list
//!  ├─ 5. Markup    one black rectangle per detected text line
//!  ├─ 6. Burn      composite the markup into the document
//!  ├─ 7. Flatten   rasterise to TIFF so no text survives under the marks
//!  ├─ 8. Re-OCR    make the flattened result searchable again
//!  └─ 9. Download  fetch the final PDF bytes
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_redact::{redact_file, RedactionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RedactionConfig::builder("http://localhost:18681").build()?;
//!     let output = redact_file("statement.pdf", "statement.redacted.pdf", &config).await?;
//!     eprintln!("{} marks over {} PII entities",
//!         output.trace.mark_count,
//!         output.trace.pii_entity_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfredact` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Known limitation
//!
//! Only the first line group of each PII entity is redacted. An entity that
//! the detector splits over several line groups keeps its later groups
//! visible; such entities are logged at `warn` level.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod redact;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RedactionConfig, RedactionConfigBuilder};
pub use error::RedactError;
pub use output::{PipelineTrace, RedactionOutput, RedactionStats};
pub use pipeline::job::{JobClient, JobResource, JobState, PollSleeper, TokioSleeper};
pub use pipeline::markup::{
    synthesize_markup, LineGroup, MarkupLayer, PiiEntity, Rectangle, RedactionMark,
};
pub use pipeline::workfile::WorkFileStore;
pub use progress::{
    NoopProgressCallback, PipelineStage, ProgressCallback, RedactionProgressCallback,
};
pub use redact::{redact_bytes, redact_file, redact_sync, Redactor};
