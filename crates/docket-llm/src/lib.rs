//! Docket LLM Backend Layer
//!
//! Implementations of the [`Backend`] trait from `docket-domain`.
//!
//! # Backends
//!
//! - [`ChatBackend`]: synchronous chat-completions endpoint (LM Studio, OpenAI)
//! - [`JobBackend`]: asynchronous submit/poll/retrieve job services
//! - [`MockBackend`]: deterministic responses for tests
//!
//! [`BackendClient`] selects between the HTTP backends from a
//! [`BackendConfig`], so callers hold one concrete type whatever the mode.
//!
//! # Examples
//!
//! ```
//! use docket_domain::traits::Backend;
//! use docket_llm::MockBackend;
//!
//! # async fn example() {
//! let backend = MockBackend::new(r#"{"total": 100}"#);
//! let result = backend.invoke("Extract total", "Total: 100").await;
//! assert!(result.is_success());
//! # }
//! ```

#![warn(missing_docs)]

pub mod chat;
pub mod config;
pub mod job;

use docket_domain::traits::Backend;
use docket_domain::InvocationResult;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use chat::ChatBackend;
pub use config::{BackendConfig, BackendMode};
pub use job::{HttpJobApi, JobApi, JobBackend, JobHandle, JobState};

/// Errors raised inside a backend before they are folded into an
/// [`InvocationResult`]
#[derive(Error, Debug)]
pub enum BackendError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Backend answered with a non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Http {
        /// Status code
        status: u16,
        /// Response body (possibly empty)
        body: String,
    },

    /// Response envelope did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Backend configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::Communication(e.to_string())
    }
}

/// Backend selected from configuration
pub enum BackendClient {
    /// Chat-completions endpoint
    Chat(ChatBackend),
    /// Whisper-style job service
    Job(JobBackend<HttpJobApi>),
}

impl BackendClient {
    /// Build the backend described by `config`
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        config.validate().map_err(BackendError::Config)?;
        match config.mode {
            BackendMode::Chat => Ok(BackendClient::Chat(ChatBackend::from_config(config)?)),
            BackendMode::Job => Ok(BackendClient::Job(JobBackend::from_config(config)?)),
        }
    }
}

impl Backend for BackendClient {
    fn name(&self) -> &str {
        match self {
            BackendClient::Chat(backend) => backend.name(),
            BackendClient::Job(backend) => backend.name(),
        }
    }

    async fn invoke(&self, prompt_text: &str, chunk_text: &str) -> InvocationResult {
        match self {
            BackendClient::Chat(backend) => backend.invoke(prompt_text, chunk_text).await,
            BackendClient::Job(backend) => backend.invoke(prompt_text, chunk_text).await,
        }
    }
}

const MOCK_ERROR: &str = "ERROR";

/// Mock backend for deterministic testing
///
/// Responses are looked up by chunk text: an exact match wins, otherwise the
/// first registered key contained in the chunk, otherwise the default.
///
/// # Examples
///
/// ```
/// use docket_domain::traits::Backend;
/// use docket_llm::MockBackend;
///
/// # async fn example() {
/// let mut backend = MockBackend::new("{}");
/// backend.add_response("Total: 100", r#"{"total": 100}"#);
/// backend.add_error("corrupt");
///
/// let ok = backend.invoke("prompt", "Total: 100").await;
/// assert_eq!(ok.payload.unwrap()["total"], 100);
///
/// let failed = backend.invoke("prompt", "a corrupt scan").await;
/// assert!(!failed.is_success());
/// assert_eq!(backend.call_count(), 2);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    default_response: String,
    responses: Arc<Mutex<Vec<(String, String)>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockBackend {
    /// Create a mock answering every chunk with `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer chunks matching `chunk_key` with `response`
    pub fn add_response(&mut self, chunk_key: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push((chunk_key.into(), response.into()));
    }

    /// Fail chunks matching `chunk_key` with a backend error
    pub fn add_error(&mut self, chunk_key: impl Into<String>) {
        self.add_response(chunk_key, MOCK_ERROR);
    }

    /// Number of invocations so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Every `(prompt, chunk)` pair received, in order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Forget recorded invocations
    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn lookup(&self, chunk_text: &str) -> String {
        let responses = self.responses.lock().unwrap();
        responses
            .iter()
            .find(|(key, _)| key == chunk_text)
            .or_else(|| responses.iter().find(|(key, _)| chunk_text.contains(key.as_str())))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.default_response.clone())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("{}")
    }
}

impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn invoke(&self, prompt_text: &str, chunk_text: &str) -> InvocationResult {
        self.calls
            .lock()
            .unwrap()
            .push((prompt_text.to_string(), chunk_text.to_string()));

        let response = self.lookup(chunk_text);
        if response == MOCK_ERROR {
            return InvocationResult::backend_error("Mock error");
        }
        InvocationResult::from_response_text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_domain::InvocationStatus;

    #[tokio::test]
    async fn test_mock_backend_default() {
        let backend = MockBackend::new(r#"{"ok": true}"#);
        let result = backend.invoke("p", "anything").await;
        assert!(result.is_success());
        assert_eq!(result.payload.unwrap()["ok"], true);
    }

    #[tokio::test]
    async fn test_mock_backend_specific_responses() {
        let mut backend = MockBackend::default();
        backend.add_response("alpha", r#"{"n": 1}"#);
        backend.add_response("beta", r#"{"n": 2}"#);

        assert_eq!(backend.invoke("p", "alpha").await.payload.unwrap()["n"], 1);
        assert_eq!(backend.invoke("p", "the beta file").await.payload.unwrap()["n"], 2);
        assert_eq!(backend.invoke("p", "gamma").await.payload.unwrap(), serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_mock_backend_exact_match_beats_substring() {
        let mut backend = MockBackend::default();
        backend.add_response("a", r#"{"which": "substring"}"#);
        backend.add_response("a b", r#"{"which": "exact"}"#);

        let result = backend.invoke("p", "a b").await;
        assert_eq!(result.payload.unwrap()["which"], "exact");
    }

    #[tokio::test]
    async fn test_mock_backend_records_calls() {
        let backend = MockBackend::default();
        assert_eq!(backend.call_count(), 0);

        backend.invoke("prompt one", "chunk one").await;
        backend.invoke("prompt two", "chunk two").await;
        assert_eq!(backend.call_count(), 2);
        assert_eq!(backend.calls()[1], ("prompt two".to_string(), "chunk two".to_string()));

        backend.reset_calls();
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_backend_error() {
        let mut backend = MockBackend::default();
        backend.add_error("bad chunk");

        let result = backend.invoke("p", "bad chunk").await;
        assert_eq!(result.status, InvocationStatus::BackendError);
    }

    #[tokio::test]
    async fn test_mock_backend_non_json_is_parse_error() {
        let backend = MockBackend::new("This is not JSON");
        let result = backend.invoke("p", "c").await;
        assert_eq!(result.status, InvocationStatus::ParseError);
        assert_eq!(result.raw_text, "This is not JSON");
    }

    #[tokio::test]
    async fn test_mock_backend_clone_shares_state() {
        let backend1 = MockBackend::default();
        let backend2 = backend1.clone();

        backend1.invoke("p", "c").await;
        assert_eq!(backend2.call_count(), 1);
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        let mut config = BackendConfig::default();
        config.endpoint = String::new();
        assert!(matches!(
            BackendClient::from_config(&config),
            Err(BackendError::Config(_))
        ));
    }

    #[test]
    fn test_client_selects_mode() {
        let chat = BackendClient::from_config(&BackendConfig::lm_studio()).unwrap();
        assert_eq!(chat.name(), "chat");

        let job = BackendClient::from_config(&BackendConfig::whisper()).unwrap();
        assert_eq!(job.name(), "job");
    }
}
