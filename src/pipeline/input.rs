//! Local input: read the PDF to redact and sanity-check it before anything
//! is sent to the server.
//!
//! Checking the `%PDF` magic bytes up front turns "wrong file" into a clear
//! local error instead of a conversion job failing minutes later.

use crate::error::RedactError;
use std::path::Path;
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Read `path` fully, requiring it to exist, be readable and look like a PDF.
pub async fn read_input_pdf(path: &Path) -> Result<Vec<u8>, RedactError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RedactError::InputNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => RedactError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => RedactError::InputReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    check_pdf_magic(&bytes, path)?;
    debug!("Read input PDF {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Fail with [`RedactError::NotAPdf`] unless `bytes` starts with `%PDF`.
pub fn check_pdf_magic(bytes: &[u8], path: &Path) -> Result<(), RedactError> {
    if bytes.len() < PDF_MAGIC.len() || &bytes[..4] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(RedactError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}
