//! Configuration types for a redaction run.
//!
//! All run behaviour is controlled through [`RedactionConfig`], built via its
//! [`RedactionConfigBuilder`]. The config is handed to every component
//! constructor explicitly; nothing is read from process-wide state once the
//! pipeline has started.

use crate::error::RedactError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Configuration for one redaction run.
///
/// # Example
/// ```rust
/// use edgequake_redact::RedactionConfig;
///
/// let config = RedactionConfig::builder("http://localhost:18681/")
///     .poll_interval_ms(500)
///     .build()
///     .unwrap();
/// assert_eq!(config.server_url, "http://localhost:18681");
/// ```
#[derive(Clone)]
pub struct RedactionConfig {
    /// Base URL of the document-processing server, without a trailing slash.
    pub server_url: String,

    /// Delay between two status checks of the same job. Default: 1000.
    ///
    /// Fixed interval, no growth and no jitter.
    pub poll_interval_ms: u64,

    /// Maximum status checks per job. Default: `None` (poll until the job
    /// leaves the `processing` state).
    pub max_polls: Option<u32>,

    /// OCR language requested from searchable-PDF conversion. Default: "english".
    pub ocr_language: String,

    /// Timeout applied to each individual HTTP request. Default: 120.
    pub request_timeout_secs: u64,

    /// Receives stage-level progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            poll_interval_ms: 1000,
            max_polls: None,
            ocr_language: "english".to_string(),
            request_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RedactionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactionConfig")
            .field("server_url", &self.server_url)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_polls", &self.max_polls)
            .field("ocr_language", &self.ocr_language)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn RedactionProgressCallback>"),
            )
            .finish()
    }
}

impl RedactionConfig {
    /// Create a new builder targeting the server at `server_url`.
    pub fn builder(server_url: impl Into<String>) -> RedactionConfigBuilder {
        RedactionConfigBuilder {
            config: Self {
                server_url: server_url.into(),
                ..Self::default()
            },
        }
    }
}

/// Builder for [`RedactionConfig`].
#[derive(Debug)]
pub struct RedactionConfigBuilder {
    config: RedactionConfig,
}

impl RedactionConfigBuilder {
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn max_polls(mut self, n: u32) -> Self {
        self.config.max_polls = Some(n.max(1));
        self
    }

    pub fn ocr_language(mut self, language: impl Into<String>) -> Self {
        self.config.ocr_language = language.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Trailing slashes are stripped from the server URL so resource paths
    /// can be appended with a single `/`.
    pub fn build(mut self) -> Result<RedactionConfig, RedactError> {
        let trimmed = self.config.server_url.trim().trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            return Err(RedactError::InvalidConfig(
                "Server URL must not be empty".into(),
            ));
        }
        let parsed = reqwest::Url::parse(&trimmed).map_err(|e| {
            RedactError::InvalidConfig(format!("Server URL '{}' is invalid: {}", trimmed, e))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(RedactError::InvalidConfig(format!(
                "Server URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }
        if self.config.ocr_language.trim().is_empty() {
            return Err(RedactError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        self.config.server_url = trimmed;
        Ok(self.config)
    }
}
