//! Search contexts and PII detection.
//!
//! A search context indexes a work file's text; its job id doubles as the
//! context id, so nothing is extracted from its completion beyond the state.
//! PII detection then runs against the context in two steps: a detector
//! job that is polled like any other, followed by a plain `GET` of the
//! detector's `entities` sub-resource.

use crate::client::{read_json, ServerClient};
use crate::error::RedactError;
use crate::pipeline::job::{JobClient, PII_DETECTORS, SEARCH_CONTEXTS};
use crate::pipeline::markup::PiiEntity;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchContextInput<'a> {
    document_identifier: String,
    file_id: &'a str,
    source: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PiiDetectorInput<'a> {
    context_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct EntityList {
    entities: Vec<PiiEntity>,
}

/// Index `file_id` for searching and return the search context id.
pub async fn create_search_context(jobs: &JobClient, file_id: &str) -> Result<String, RedactError> {
    let input = SearchContextInput {
        document_identifier: Uuid::new_v4().to_string(),
        file_id,
        source: "workFile",
    };
    let context_id = jobs.start_job(&SEARCH_CONTEXTS, &input).await?;
    jobs.await_completion(&SEARCH_CONTEXTS, &context_id).await?;
    Ok(context_id)
}

/// Run PII detection over `context_id` and return the detected entities.
pub async fn perform_pii_search(
    jobs: &JobClient,
    context_id: &str,
) -> Result<Vec<PiiEntity>, RedactError> {
    let process_id = jobs
        .start_job(&PII_DETECTORS, &PiiDetectorInput { context_id })
        .await?;
    jobs.await_completion(&PII_DETECTORS, &process_id).await?;
    fetch_entities(jobs.server(), &process_id).await
}

/// `GET v2/piiDetectors/{process_id}/entities`. Not part of the job protocol.
async fn fetch_entities(
    server: &ServerClient,
    process_id: &str,
) -> Result<Vec<PiiEntity>, RedactError> {
    let url = server.url(&format!("{}/{}/entities", PII_DETECTORS.path, process_id));
    let response = server
        .call(server.http().get(&url), &url, "PII entity retrieval")
        .await
        .map_err(|f| RedactError::EntityFetch {
            process_id: process_id.to_string(),
            status: f.status,
            body: f.body,
            source: f.source,
        })?;

    let list: EntityList = read_json(response, "PII entity list").await?;
    debug!("Detector {} found {} entities", process_id, list.entities.len());
    Ok(list.entities)
}
