//! Pipeline stages for PDF redaction.
//!
//! Each submodule wraps one remote concern. All long-running operations go
//! through [`job::JobClient`]; bytes only cross the wire in [`workfile`].
//!
//! ## Data Flow
//!
//! ```text
//! input ─▶ upload ─▶ OCR ─▶ search ctx ─▶ PII ─▶ markup ─▶ burn ─▶ flatten ─▶ OCR ─▶ download
//! (file)   (bytes)  (id)    (id)         (entities) (id)   (id)    (id)        (id)   (bytes)
//! ```
//!
//! 1. [`input`]    : read and validate the local PDF
//! 2. [`workfile`] : upload/download raw bytes
//! 3. [`convert`]  : searchable-PDF OCR and TIFF flattening
//! 4. [`search`]   : search context creation and PII detection
//! 5. [`markup`]   : pure entity → annotation synthesis, plus its upload
//! 6. [`burn`]     : composite the markup into the document
//! 7. [`job`]      : the shared create/poll/complete protocol

pub mod burn;
pub mod convert;
pub mod input;
pub mod job;
pub mod markup;
pub mod search;
pub mod workfile;
