//! Remote job protocol: create a job, then poll it until it reaches a
//! terminal state.
//!
//! Every long-running server operation follows the same lifecycle:
//!
//! ```text
//! POST {base}/{resource}          {"input": …}      → {"<id_field>": "…"}
//! GET  {base}/{resource}/{id}                       → {"state": "processing"}
//!      … wait poll_interval, GET again …
//! GET  {base}/{resource}/{id}                       → {"state": "complete", "output": …}
//! ```
//!
//! `processing` is the only state that keeps the loop going and `complete`
//! is the only success. Anything else (`error`, `cancelled`, `faulted`, …)
//! is fatal and is reported with the full status body.
//!
//! ## Output extraction
//!
//! The shape of `output` differs by resource (content converters return
//! `results[].fileId`, the markup burner returns `documentFileId` directly),
//! so [`JobClient::await_output`] lets each stage name the type it expects
//! instead of normalising the protocol here.
//!
//! ## Waiting
//!
//! The delay between polls goes through the [`PollSleeper`] trait. Production
//! code uses [`TokioSleeper`]; tests inject a sleeper that returns
//! immediately so several `processing` responses can be simulated without
//! real time passing.

use crate::client::{read_json, ServerClient};
use crate::config::RedactionConfig;
use crate::error::RedactError;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A server resource class that hosts asynchronous jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobResource {
    /// Path relative to the server base URL, e.g. `v2/contentConverters`.
    pub path: &'static str,
    /// Field of the creation response that holds the new job's identifier.
    pub id_field: &'static str,
}

pub const CONTENT_CONVERTERS: JobResource = JobResource {
    path: "v2/contentConverters",
    id_field: "processId",
};

pub const SEARCH_CONTEXTS: JobResource = JobResource {
    path: "v2/searchContexts",
    id_field: "contextId",
};

pub const PII_DETECTORS: JobResource = JobResource {
    path: "v2/piiDetectors",
    id_field: "processId",
};

pub const MARKUP_BURNER: JobResource = JobResource {
    path: "PCCIS/V1/MarkupBurner",
    id_field: "processId",
};

/// State reported by a job status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Processing,
    Complete,
    /// Any other value; always terminal and always a failure.
    Other(String),
}

impl JobState {
    /// Read `state` from a status document.
    ///
    /// A missing or non-string `state` becomes [`JobState::Other`] holding
    /// its JSON rendering (`null`, `42`, …), or `<missing>` when absent.
    pub fn of(status_body: &Value) -> Self {
        match status_body.get("state") {
            Some(Value::String(s)) => JobState::from(s.as_str()),
            Some(other) => JobState::Other(other.to_string()),
            None => JobState::Other("<missing>".to_string()),
        }
    }
}

impl From<&str> for JobState {
    fn from(s: &str) -> Self {
        match s {
            "processing" => JobState::Processing,
            "complete" => JobState::Complete,
            other => JobState::Other(other.to_string()),
        }
    }
}

/// Body of every job-creation request.
#[derive(Serialize)]
struct JobRequest<'a, I: ?Sized> {
    input: &'a I,
}

/// Suspends the poll loop between two status checks.
pub trait PollSleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl PollSleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Client for the create/poll/complete job protocol.
#[derive(Clone)]
pub struct JobClient {
    server: ServerClient,
    poll_interval: Duration,
    max_polls: Option<u32>,
    sleeper: Arc<dyn PollSleeper>,
}

impl JobClient {
    pub fn new(server: ServerClient, config: &RedactionConfig) -> Self {
        Self {
            server,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_polls: config.max_polls,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the sleeper used between polls.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn PollSleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn server(&self) -> &ServerClient {
        &self.server
    }

    /// Create a job under `resource` and return its identifier.
    ///
    /// `input` is wrapped as `{"input": input}`.
    pub async fn start_job<I: Serialize + ?Sized>(
        &self,
        resource: &JobResource,
        input: &I,
    ) -> Result<String, RedactError> {
        let url = self.server.url(resource.path);
        let body = serde_json::to_vec(&JobRequest { input }).map_err(|e| {
            RedactError::Internal(format!("Failed to serialise {} input: {}", resource.path, e))
        })?;

        let request = self
            .server
            .http()
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json;charset=utf-8")
            .body(body);
        let response = self
            .server
            .call(request, &url, &format!("Creating {} job", resource.path))
            .await
            .map_err(|f| RedactError::JobCreation {
                resource: resource.path.to_string(),
                status: f.status,
                body: f.body,
                source: f.source,
            })?;

        let created: Value = read_json(response, resource.path).await?;
        let job_id = created
            .get(resource.id_field)
            .and_then(Value::as_str)
            .ok_or_else(|| RedactError::MalformedResponse {
                context: resource.path.to_string(),
                detail: format!("creation response has no string '{}'", resource.id_field),
            })?;

        debug!("Created {} job {}", resource.path, job_id);
        Ok(job_id.to_string())
    }

    /// Poll `resource/job_id` until it completes and return its `output`.
    ///
    /// Jobs whose completion document has no `output` yield `Value::Null`.
    pub async fn await_completion(
        &self,
        resource: &JobResource,
        job_id: &str,
    ) -> Result<Value, RedactError> {
        let url = self.server.url(&format!("{}/{}", resource.path, job_id));
        let mut polls: u32 = 0;

        loop {
            polls += 1;
            let response = self
                .server
                .call(
                    self.server.http().get(&url),
                    &url,
                    &format!("Checking status of {}", resource.path),
                )
                .await
                .map_err(|f| RedactError::JobStatus {
                    resource: resource.path.to_string(),
                    job_id: job_id.to_string(),
                    status: f.status,
                    body: f.body,
                    source: f.source,
                })?;

            let mut status_body: Value = read_json(response, resource.path).await?;
            let state = JobState::of(&status_body);

            match state {
                JobState::Complete => {
                    debug!(
                        "{}/{} complete after {} status checks",
                        resource.path, job_id, polls
                    );
                    return Ok(status_body
                        .get_mut("output")
                        .map(Value::take)
                        .unwrap_or(Value::Null));
                }
                JobState::Processing => {
                    if let Some(max) = self.max_polls {
                        if polls >= max {
                            return Err(RedactError::PollLimitExceeded {
                                resource: resource.path.to_string(),
                                job_id: job_id.to_string(),
                                polls,
                            });
                        }
                    }
                    debug!(
                        "{}/{} processing (check {}), retrying in {:?}",
                        resource.path, job_id, polls, self.poll_interval
                    );
                    self.sleeper.sleep(self.poll_interval).await;
                }
                JobState::Other(state) => {
                    let body = serde_json::to_string_pretty(&status_body)
                        .unwrap_or_else(|_| status_body.to_string());
                    tracing::error!(
                        "{}/{} process state unexpected: {}\n{}",
                        resource.path,
                        job_id,
                        state,
                        body
                    );
                    return Err(RedactError::UnexpectedJobState {
                        resource: resource.path.to_string(),
                        job_id: job_id.to_string(),
                        state,
                        body,
                    });
                }
            }
        }
    }

    /// Await completion and deserialize `output` into the stage's own type.
    pub async fn await_output<T: DeserializeOwned>(
        &self,
        resource: &JobResource,
        job_id: &str,
    ) -> Result<T, RedactError> {
        let output = self.await_completion(resource, job_id).await?;
        serde_json::from_value(output).map_err(|e| RedactError::MalformedResponse {
            context: format!("{}/{} output", resource.path, job_id),
            detail: e.to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Returns immediately and counts how often it was asked to wait.
    #[derive(Default)]
    pub(crate) struct CountingSleeper {
        pub(crate) calls: AtomicUsize,
    }

    impl PollSleeper for CountingSleeper {
        fn sleep(&self, _duration: Duration) -> BoxFuture<'static, ()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {})
        }
    }

    fn job_client(server: &MockServer, sleeper: Arc<CountingSleeper>) -> JobClient {
        let config = RedactionConfig::builder(server.uri()).build().unwrap();
        JobClient::new(ServerClient::new(&config).unwrap(), &config).with_sleeper(sleeper)
    }

    #[test]
    fn job_state_parsing() {
        assert_eq!(JobState::from("processing"), JobState::Processing);
        assert_eq!(JobState::from("complete"), JobState::Complete);
        assert_eq!(
            JobState::from("cancelled"),
            JobState::Other("cancelled".into())
        );
    }

    #[tokio::test]
    async fn start_job_wraps_input_and_reads_id_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/searchContexts"))
            .and(header("content-type", "application/json;charset=utf-8"))
            .and(body_json(json!({ "input": { "fileId": "B" } })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "contextId": "C" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = job_client(&server, Arc::default());
        let id = client
            .start_job(&SEARCH_CONTEXTS, &json!({ "fileId": "B" }))
            .await
            .unwrap();
        assert_eq!(id, "C");
    }

    #[tokio::test]
    async fn start_job_non_success_is_job_creation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/piiDetectors"))
            .respond_with(
                ResponseTemplate::new(480).set_body_json(json!({ "errorCode": "MissingInput" })),
            )
            .mount(&server)
            .await;

        let client = job_client(&server, Arc::default());
        let err = client
            .start_job(&PII_DETECTORS, &json!({}))
            .await
            .unwrap_err();
        match err {
            RedactError::JobCreation { resource, status, body, .. } => {
                assert_eq!(resource, "v2/piiDetectors");
                assert_eq!(status, Some(480));
                assert!(body.contains("MissingInput"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn start_job_without_id_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/contentConverters"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": 1 })))
            .mount(&server)
            .await;

        let client = job_client(&server, Arc::default());
        let err = client
            .start_job(&CONTENT_CONVERTERS, &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, RedactError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn processing_polls_again_until_complete() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/contentConverters/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "processing" })))
            .up_to_n_times(3)
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/contentConverters/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "state": "complete",
                "output": { "results": [{ "fileId": "B" }] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sleeper = Arc::new(CountingSleeper::default());
        let client = job_client(&server, sleeper.clone());
        let output = client
            .await_completion(&CONTENT_CONVERTERS, "p1")
            .await
            .unwrap();

        assert_eq!(output, json!({ "results": [{ "fileId": "B" }] }));
        assert_eq!(sleeper.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn complete_without_output_yields_null() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/searchContexts/C"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "complete" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = job_client(&server, Arc::default());
        let output = client.await_completion(&SEARCH_CONTEXTS, "C").await.unwrap();
        assert_eq!(output, Value::Null);
    }

    #[tokio::test]
    async fn other_states_fail_without_polling_again() {
        for state in ["error", "cancelled", "faulted"] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/PCCIS/V1/MarkupBurner/p9"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "state": state,
                    "errorCode": "Boom"
                })))
                .expect(1)
                .mount(&server)
                .await;

            let sleeper = Arc::new(CountingSleeper::default());
            let client = job_client(&server, sleeper.clone());
            let err = client
                .await_completion(&MARKUP_BURNER, "p9")
                .await
                .unwrap_err();

            match err {
                RedactError::UnexpectedJobState { state: s, body, .. } => {
                    assert_eq!(s, state);
                    assert!(body.contains("Boom"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert_eq!(sleeper.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn status_non_success_is_job_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/piiDetectors/d1"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let client = job_client(&server, Arc::default());
        let err = client.await_completion(&PII_DETECTORS, "d1").await.unwrap_err();
        match err {
            RedactError::JobStatus { job_id, status, body, .. } => {
                assert_eq!(job_id, "d1");
                assert_eq!(status, Some(503));
                assert_eq!(body, "unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_poll_without_response_is_job_status_error() {
        let config = RedactionConfig::builder("http://127.0.0.1:9").build().unwrap();
        let client = JobClient::new(ServerClient::new(&config).unwrap(), &config)
            .with_sleeper(Arc::new(CountingSleeper::default()));

        let err = client
            .await_completion(&CONTENT_CONVERTERS, "p1")
            .await
            .unwrap_err();
        match &err {
            RedactError::JobStatus { job_id, status: None, source, .. } => {
                assert_eq!(job_id, "p1");
                assert!(source.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn null_or_missing_state_is_unexpected_and_keeps_body() {
        for (status_body, expected) in [
            (json!({ "state": null, "errorCode": "Boom" }), "null"),
            (json!({ "errorCode": "Boom" }), "<missing>"),
        ] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/v2/contentConverters/p1"))
                .respond_with(ResponseTemplate::new(200).set_body_json(status_body))
                .expect(1)
                .mount(&server)
                .await;

            let sleeper = Arc::new(CountingSleeper::default());
            let client = job_client(&server, sleeper.clone());
            let err = client
                .await_completion(&CONTENT_CONVERTERS, "p1")
                .await
                .unwrap_err();
            match err {
                RedactError::UnexpectedJobState { state, body, .. } => {
                    assert_eq!(state, expected);
                    assert!(body.contains("Boom"), "got: {body}");
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert_eq!(sleeper.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn max_polls_bounds_the_loop() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/contentConverters/slow"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "processing" })))
            .expect(2)
            .mount(&server)
            .await;

        let config = RedactionConfig::builder(server.uri())
            .max_polls(2)
            .build()
            .unwrap();
        let sleeper = Arc::new(CountingSleeper::default());
        let client = JobClient::new(ServerClient::new(&config).unwrap(), &config)
            .with_sleeper(sleeper.clone());

        let err = client
            .await_completion(&CONTENT_CONVERTERS, "slow")
            .await
            .unwrap_err();
        assert!(matches!(err, RedactError::PollLimitExceeded { polls: 2, .. }));
        assert_eq!(sleeper.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn await_output_reports_missing_fields() {
        #[derive(serde::Deserialize, Debug)]
        #[serde(rename_all = "camelCase")]
        #[allow(dead_code)]
        struct BurnOut {
            document_file_id: String,
        }

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/PCCIS/V1/MarkupBurner/b1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "state": "complete",
                "output": { "results": [] }
            })))
            .mount(&server)
            .await;

        let client = job_client(&server, Arc::default());
        let err = client
            .await_output::<BurnOut>(&MARKUP_BURNER, "b1")
            .await
            .unwrap_err();
        assert!(matches!(err, RedactError::MalformedResponse { .. }));
    }
}
