//! Asynchronous job backend
//!
//! Some extraction services do not answer inline: a document is submitted,
//! the service hands back an opaque job handle, and the caller polls the
//! job's status until it reaches a terminal state before retrieving the
//! result text.
//!
//! ```text
//! submit ──► Submitted ──► Ingesting ──► Processing ──► Processed ──► retrieve
//!                 │             │             │
//!                 └─────────────┴─────────────┴──► Failed / Unknown / TimedOut
//! ```
//!
//! Polling is bounded by `max_poll_attempts`; a job that is still in
//! progress after the last poll ends as [`InvocationStatus::TimedOut`].
//!
//! [`InvocationStatus::TimedOut`]: docket_domain::InvocationStatus::TimedOut

use crate::config::BackendConfig;
use crate::BackendError;
use docket_domain::traits::Backend;
use docket_domain::InvocationResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Status of a submitted job as reported by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Accepted, not yet started
    Submitted,
    /// Document being ingested
    Ingesting,
    /// Extraction running
    Processing,
    /// Result ready for retrieval
    Processed,
    /// Service gave up on the job
    Failed,
    /// Status string this client does not recognise
    Unknown(String),
}

impl JobState {
    /// Parse a status string reported by the service
    ///
    /// # Examples
    ///
    /// ```
    /// use docket_llm::JobState;
    ///
    /// assert_eq!(JobState::parse("processing"), JobState::Processing);
    /// assert_eq!(JobState::parse("ingestion_done"), JobState::Processing);
    /// assert_eq!(JobState::parse("exploded"), JobState::Unknown("exploded".to_string()));
    /// ```
    pub fn parse(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            "accepted" | "submitted" => JobState::Submitted,
            "ingesting" => JobState::Ingesting,
            "ingestion_done" | "processing" => JobState::Processing,
            "processed" => JobState::Processed,
            "failed" | "error" => JobState::Failed,
            _ => JobState::Unknown(status.to_string()),
        }
    }

    /// Whether polling should stop at this state
    pub fn is_terminal(&self) -> bool {
        !self.is_in_progress()
    }

    /// Whether the job is still moving towards a result
    pub fn is_in_progress(&self) -> bool {
        matches!(self, JobState::Submitted | JobState::Ingesting | JobState::Processing)
    }
}

/// Opaque identifier returned by a job submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle(pub String);

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three calls a job service exposes
pub trait JobApi {
    /// Submit prompt and document text, returning the job handle
    fn submit(
        &self,
        prompt_text: &str,
        document_text: &str,
    ) -> impl Future<Output = Result<JobHandle, BackendError>> + Send;

    /// Query the job's current state
    fn poll(&self, handle: &JobHandle) -> impl Future<Output = Result<JobState, BackendError>> + Send;

    /// Fetch the result text of a processed job
    fn retrieve(&self, handle: &JobHandle) -> impl Future<Output = Result<String, BackendError>> + Send;
}

/// Backend driving a [`JobApi`] through the bounded polling state machine
pub struct JobBackend<A> {
    api: A,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl<A> JobBackend<A>
where
    A: JobApi + Sync,
{
    /// Wrap a job API with explicit polling bounds
    pub fn new(api: A, poll_interval: Duration, max_poll_attempts: u32) -> Self {
        Self {
            api,
            poll_interval,
            max_poll_attempts: max_poll_attempts.max(1),
        }
    }

    /// Access the underlying API
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Submit, poll until terminal or out of attempts, then retrieve
    pub async fn run_job(&self, prompt_text: &str, document_text: &str) -> InvocationResult {
        let handle = match self.api.submit(prompt_text, document_text).await {
            Ok(handle) => handle,
            Err(e) => return InvocationResult::backend_error(format!("Job submission failed: {}", e)),
        };
        info!("Submitted job {}", handle);

        for attempt in 1..=self.max_poll_attempts {
            let state = match self.api.poll(&handle).await {
                Ok(state) => state,
                Err(e) => {
                    return InvocationResult::backend_error(format!(
                        "Status query for job {} failed: {}",
                        handle, e
                    ))
                }
            };
            debug!(
                "Job {} poll {}/{}: {:?}",
                handle, attempt, self.max_poll_attempts, state
            );

            match state {
                JobState::Processed => {
                    return match self.api.retrieve(&handle).await {
                        Ok(text) => InvocationResult::from_response_text(text),
                        Err(e) => InvocationResult::backend_error(format!(
                            "Retrieving job {} failed: {}",
                            handle, e
                        )),
                    };
                }
                JobState::Failed => {
                    warn!("Job {} failed", handle);
                    return InvocationResult::job_failed(format!("Job {} failed", handle));
                }
                JobState::Unknown(status) => {
                    warn!("Job {} reached unrecognised status '{}'", handle, status);
                    return InvocationResult::job_failed(format!(
                        "Job {} reached unrecognised status '{}'",
                        handle, status
                    ));
                }
                JobState::Submitted | JobState::Ingesting | JobState::Processing => {
                    if attempt < self.max_poll_attempts {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        }

        InvocationResult::timed_out(format!(
            "Job {} still in progress after {} polls",
            handle, self.max_poll_attempts
        ))
    }
}

impl JobBackend<HttpJobApi> {
    /// Build an HTTP job backend from configuration
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let api = HttpJobApi::new(&config.endpoint, config.api_key.clone(), config.request_timeout())?
            .with_prompt_separator(config.prompt_separator.clone());
        Ok(Self::new(api, config.poll_interval(), config.max_poll_attempts))
    }
}

impl<A> Backend for JobBackend<A>
where
    A: JobApi + Sync,
{
    fn name(&self) -> &str {
        "job"
    }

    async fn invoke(&self, prompt_text: &str, chunk_text: &str) -> InvocationResult {
        self.run_job(prompt_text, chunk_text).await
    }
}

/// Whisper-style HTTP job API
///
/// - `POST {endpoint}/whisper` with `{"text": ..}` → `{"whisper_hash": ..}`
/// - `GET {endpoint}/whisper-status?whisper_hash=..` → `{"status": ..}`
/// - `GET {endpoint}/whisper-retrieve?whisper_hash=..` →
///   `{"extraction": {"result_text": ..}}`
pub struct HttpJobApi {
    endpoint: String,
    api_key: Option<String>,
    prompt_separator: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    text: String,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct SubmitResponse {
    whisper_hash: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
}

#[derive(Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    extraction: Option<Extraction>,
}

#[derive(Deserialize)]
struct Extraction {
    #[serde(default)]
    result_text: Option<String>,
}

/// Header carrying the API key
const API_KEY_HEADER: &str = "unstract-key";

impl HttpJobApi {
    /// Create a client for the given endpoint
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            prompt_separator: "\n\n".to_string(),
            client,
        })
    }

    /// Set the text placed between prompt and document in the submitted text
    pub fn with_prompt_separator(mut self, separator: impl Into<String>) -> Self {
        self.prompt_separator = separator.into();
        self
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

impl JobApi for HttpJobApi {
    async fn submit(&self, prompt_text: &str, document_text: &str) -> Result<JobHandle, BackendError> {
        let body = SubmitRequest {
            text: format!("{}{}{}", prompt_text, self.prompt_separator, document_text),
            prompt: prompt_text,
        };
        let request = self.authorize(self.client.post(format!("{}/whisper", self.endpoint)));
        let response = Self::checked(request.json(&body).send().await?).await?;
        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Bad submit response: {}", e)))?;
        Ok(JobHandle(submitted.whisper_hash))
    }

    async fn poll(&self, handle: &JobHandle) -> Result<JobState, BackendError> {
        let request = self
            .authorize(self.client.get(format!("{}/whisper-status", self.endpoint)))
            .query(&[("whisper_hash", handle.0.as_str())]);
        let response = Self::checked(request.send().await?).await?;
        let status: StatusResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Bad status response: {}", e)))?;
        Ok(JobState::parse(&status.status))
    }

    async fn retrieve(&self, handle: &JobHandle) -> Result<String, BackendError> {
        let request = self
            .authorize(self.client.get(format!("{}/whisper-retrieve", self.endpoint)))
            .query(&[("whisper_hash", handle.0.as_str())]);
        let response = Self::checked(request.send().await?).await?;
        let retrieved: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Bad retrieve response: {}", e)))?;
        retrieved
            .extraction
            .and_then(|extraction| extraction.result_text)
            .ok_or_else(|| BackendError::InvalidResponse("Missing extraction.result_text".to_string()))
    }
}
