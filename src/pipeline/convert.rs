//! Content conversion jobs: OCR to a searchable PDF, and rasterisation to
//! a flattened TIFF.
//!
//! Both run on the same `v2/contentConverters` resource and only differ in
//! the `dest` block of the request.

use crate::error::RedactError;
use crate::pipeline::job::{JobClient, CONTENT_CONVERTERS};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileRef<'a> {
    pub(crate) file_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConversionInput<'a> {
    sources: [FileRef<'a>; 1],
    dest: Destination<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Destination<'a> {
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pdf_options: Option<PdfOptions<'a>>,
}

#[derive(Debug, Serialize)]
struct PdfOptions<'a> {
    ocr: OcrOptions<'a>,
}

#[derive(Debug, Serialize)]
struct OcrOptions<'a> {
    language: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversionOutput {
    results: Vec<ConversionResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversionResult {
    file_id: String,
}

/// OCR `file_id` into a searchable PDF and return the new work file id.
pub async fn create_searchable_pdf(
    jobs: &JobClient,
    file_id: &str,
    language: &str,
) -> Result<String, RedactError> {
    let dest = Destination {
        format: "pdf",
        pdf_options: Some(PdfOptions {
            ocr: OcrOptions { language },
        }),
    };
    run_conversion(jobs, file_id, dest).await
}

/// Rasterise `file_id` into an image-only TIFF, removing any text layer.
pub async fn create_flattened_pdf(jobs: &JobClient, file_id: &str) -> Result<String, RedactError> {
    let dest = Destination {
        format: "tiff",
        pdf_options: None,
    };
    run_conversion(jobs, file_id, dest).await
}

async fn run_conversion(
    jobs: &JobClient,
    file_id: &str,
    dest: Destination<'_>,
) -> Result<String, RedactError> {
    let format = dest.format;
    let input = ConversionInput {
        sources: [FileRef { file_id }],
        dest,
    };
    let process_id = jobs.start_job(&CONTENT_CONVERTERS, &input).await?;
    let output: ConversionOutput = jobs.await_output(&CONTENT_CONVERTERS, &process_id).await?;

    let first = output
        .results
        .into_iter()
        .next()
        .ok_or_else(|| RedactError::MalformedResponse {
            context: format!("{}/{}", CONTENT_CONVERTERS.path, process_id),
            detail: "conversion completed with no results".into(),
        })?;
    debug!("Converted {} to {} as {}", file_id, format, first.file_id);
    Ok(first.file_id)
}
