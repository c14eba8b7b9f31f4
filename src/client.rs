//! Shared HTTP connection to the document-processing server.
//!
//! [`ServerClient`] owns the `reqwest::Client` and the base URL; every
//! pipeline component clones it (cheap: `reqwest::Client` is an `Arc`
//! internally) and builds its request URLs through [`ServerClient::url`].

use crate::config::RedactionConfig;
use crate::error::RedactError;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{error, warn};

/// HTTP client bound to one server base URL.
#[derive(Debug, Clone)]
pub struct ServerClient {
    http: reqwest::Client,
    base_url: String,
}

impl ServerClient {
    /// Build a client from the run configuration.
    pub fn new(config: &RedactionConfig) -> Result<Self, RedactError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RedactError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.server_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a server-relative path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Send a request and require a 2xx answer.
    ///
    /// Both a missing response and a non-success status come back as a
    /// [`CallFailure`], which each caller attaches to its own error variant.
    pub(crate) async fn call(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
        context: &str,
    ) -> Result<reqwest::Response, CallFailure> {
        match request.send().await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(CallFailure::from_response(response, context).await),
            Err(source) => Err(CallFailure::transport(url, context, source)),
        }
    }
}

/// A server call that did not produce a usable response.
#[derive(Debug)]
pub(crate) struct CallFailure {
    /// `None` when no HTTP response was received at all.
    pub(crate) status: Option<u16>,
    pub(crate) body: String,
    pub(crate) source: Option<reqwest::Error>,
}

impl CallFailure {
    pub(crate) fn transport(url: &str, context: &str, source: reqwest::Error) -> Self {
        let body = format!("request to '{}' failed: {}", url, source);
        error!("{} failed: {}", context, body);
        Self {
            status: None,
            body,
            source: Some(source),
        }
    }

    /// Read a non-2xx response body for diagnostics and log it.
    ///
    /// The server usually answers errors with a JSON document (`errorCode`,
    /// `errorDetails`); it is pretty-printed when it parses, otherwise the raw
    /// text is kept.
    pub(crate) async fn from_response(response: reqwest::Response, context: &str) -> Self {
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(text) => match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(json) => serde_json::to_string_pretty(&json).unwrap_or(text),
                Err(_) => text,
            },
            Err(e) => {
                warn!("{}: HTTP {} body could not be read: {}", context, status, e);
                format!("<body unreadable: {}>", e)
            }
        };
        error!("{} failed with HTTP {}: {}", context, status, body);
        Self {
            status: Some(status),
            body,
            source: None,
        }
    }
}

/// Deserialize a success response body into `T`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    context: &str,
) -> Result<T, RedactError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| RedactError::MalformedResponse {
            context: context.to_string(),
            detail: e.to_string(),
        })?;
    serde_json::from_slice(&bytes).map_err(|e| RedactError::MalformedResponse {
        context: context.to_string(),
        detail: e.to_string(),
    })
}
