//! Markup burning: composite a markup layer permanently into a document.
//!
//! Unlike the content converters, the burner reports its result as
//! `output.documentFileId` rather than `output.results[0].fileId`.

use crate::error::RedactError;
use crate::pipeline::job::{JobClient, MARKUP_BURNER};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BurnInput<'a> {
    document_file_id: &'a str,
    markup_file_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BurnOutput {
    document_file_id: String,
}

/// Burn `markup_file_id` into `document_file_id` and return the burned
/// document's work file id.
pub async fn burn_markup(
    jobs: &JobClient,
    document_file_id: &str,
    markup_file_id: &str,
) -> Result<String, RedactError> {
    let input = BurnInput {
        document_file_id,
        markup_file_id,
    };
    let process_id = jobs.start_job(&MARKUP_BURNER, &input).await?;
    let output: BurnOutput = jobs.await_output(&MARKUP_BURNER, &process_id).await?;
    debug!(
        "Burned {} into {} as {}",
        markup_file_id, document_file_id, output.document_file_id
    );
    Ok(output.document_file_id)
}
