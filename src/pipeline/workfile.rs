//! Work files: the server-side byte blobs every stage reads and writes.
//!
//! A work file is addressed by an opaque `fileId`. Only the first upload and
//! the final download move bytes across the wire; everything in between
//! passes identifiers.

use crate::client::{read_json, CallFailure, ServerClient};
use crate::error::RedactError;
use serde::Deserialize;
use tracing::debug;

/// Server path of the work-file store.
pub const WORKFILE_ROOT: &str = "PCCIS/V1/WorkFile";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedWorkFile {
    file_id: String,
}

/// Uploads and downloads work files.
#[derive(Debug, Clone)]
pub struct WorkFileStore {
    server: ServerClient,
}

impl WorkFileStore {
    pub fn new(server: ServerClient) -> Self {
        Self { server }
    }

    /// Upload `bytes` and return the new work file's id.
    ///
    /// `extension` (without the dot) tells the server how to interpret the
    /// content; it can differ from what `content_type` implies.
    pub async fn upload(
        &self,
        bytes: impl Into<reqwest::Body>,
        content_type: &str,
        extension: &str,
    ) -> Result<String, RedactError> {
        let url = self.server.url(WORKFILE_ROOT);
        let request = self
            .server
            .http()
            .post(&url)
            .query(&[("FileExtension", extension)])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        let response = self
            .server
            .call(request, &url, "Work file creation")
            .await
            .map_err(|f| RedactError::Upload {
                status: f.status,
                body: f.body,
                source: f.source,
            })?;

        let created: CreatedWorkFile = read_json(response, WORKFILE_ROOT).await?;
        debug!("Uploaded work file {} (.{})", created.file_id, extension);
        Ok(created.file_id)
    }

    /// Fetch the raw bytes of work file `file_id`.
    pub async fn download(&self, file_id: &str) -> Result<Vec<u8>, RedactError> {
        let url = self.server.url(&format!("{}/{}", WORKFILE_ROOT, file_id));
        let download_err = |f: CallFailure| RedactError::Download {
            file_id: file_id.to_string(),
            status: f.status,
            body: f.body,
            source: f.source,
        };

        let response = self
            .server
            .call(self.server.http().get(&url), &url, "Retrieving work file bytes")
            .await
            .map_err(download_err)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_err(CallFailure::transport(&url, "Reading work file bytes", e)))?;
        debug!("Downloaded work file {} ({} bytes)", file_id, bytes.len());
        Ok(bytes.to_vec())
    }
}
