//! Error types for the edgequake-redact library.
//!
//! Every failure is fatal: the pipeline is a strict chain where each stage
//! consumes the artifact produced by the previous one, so there is nothing
//! meaningful to continue with once a call fails. [`RedactError`] is returned
//! from every public entry point and the run stops at the first one.
//!
//! The six remote-protocol variants map one-to-one onto the places a server
//! call can go wrong:
//!
//! | Variant | Raised when |
//! |---------|-------------|
//! | [`RedactError::Upload`] | work-file upload got no response or a non-2xx |
//! | [`RedactError::Download`] | work-file download got no response or a non-2xx |
//! | [`RedactError::JobCreation`] | a `POST` that starts a job got no response or a non-2xx |
//! | [`RedactError::JobStatus`] | a status poll got no response or a non-2xx |
//! | [`RedactError::UnexpectedJobState`] | a job reached a state other than `processing`/`complete` |
//! | [`RedactError::EntityFetch`] | the PII entity list could not be fetched |
//!
//! A poll that reaches an unknown state, or whose `state` is missing, is an
//! [`RedactError::UnexpectedJobState`] rather than a status failure.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-redact library.
#[derive(Debug, Error)]
pub enum RedactError {
    // ── Remote protocol errors ────────────────────────────────────────────
    //
    // `status` is `None` when no HTTP response arrived; `source` then holds
    // the transport error.
    /// The server refused a work-file upload.
    #[error("Work file upload failed ({}): {body}", status_label(.status))]
    Upload {
        status: Option<u16>,
        body: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The server refused to return the bytes of a work file.
    #[error("Retrieving work file '{file_id}' failed ({}): {body}", status_label(.status))]
    Download {
        file_id: String,
        status: Option<u16>,
        body: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Creating a job under `resource` failed.
    #[error("Creating {resource} job failed ({}): {body}", status_label(.status))]
    JobCreation {
        resource: String,
        status: Option<u16>,
        body: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Checking the status of job `job_id` failed.
    #[error(
        "Checking status of {resource}/{job_id} failed ({}): {body}",
        status_label(.status)
    )]
    JobStatus {
        resource: String,
        job_id: String,
        status: Option<u16>,
        body: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// A job finished in a state other than `complete`.
    ///
    /// `body` holds the full status document returned by the server.
    #[error("{resource}/{job_id} process state unexpected: {state}\n{body}")]
    UnexpectedJobState {
        resource: String,
        job_id: String,
        state: String,
        body: String,
    },

    /// The entity list of a finished PII detector could not be fetched.
    #[error(
        "Fetching PII entities for detector '{process_id}' failed ({}): {body}",
        status_label(.status)
    )]
    EntityFetch {
        process_id: String,
        status: Option<u16>,
        body: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// A job was still `processing` after the configured number of polls.
    #[error("{resource}/{job_id} still processing after {polls} status checks")]
    PollLimitExceeded {
        resource: String,
        job_id: String,
        polls: u32,
    },

    // ── Decoding ──────────────────────────────────────────────────────────
    /// A success response did not have the shape the protocol requires.
    #[error("Malformed response from {context}: {detail}")]
    MalformedResponse { context: String, detail: String },

    // ── Local I/O ─────────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the input file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input file exists but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// Reading the input file failed after it was opened.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output PDF.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {}", code),
        None => "no response".to_string(),
    }
}

impl RedactError {
    /// HTTP status attached to a remote-protocol error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            RedactError::Upload { status, .. }
            | RedactError::Download { status, .. }
            | RedactError::JobCreation { status, .. }
            | RedactError::JobStatus { status, .. }
            | RedactError::EntityFetch { status, .. } => *status,
            _ => None,
        }
    }
}
