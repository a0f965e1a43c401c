//! Chat-completions backend
//!
//! Sends one request per chunk to an OpenAI-compatible
//! `/chat/completions` endpoint (LM Studio, OpenAI, vLLM, ...).
//!
//! # Features
//!
//! - Fixed system instruction plus `prompt + separator + chunk` user message
//! - Retry logic with exponential backoff for transport errors, 429 and 5xx
//! - Timeout handling
//!
//! # Examples
//!
//! ```no_run
//! use docket_llm::ChatBackend;
//!
//! let backend = ChatBackend::new("http://localhost:1234/v1", "gemma-2-2b-it")
//!     .unwrap()
//!     .with_max_retries(5);
//! ```

use crate::config::{BackendConfig, RECORDS_ANALYST_INSTRUCTION};
use crate::BackendError;
use docket_domain::traits::Backend;
use docket_domain::InvocationResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for chat requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of attempts per request
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Longest wait between two attempts
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Chat-completions backend
pub struct ChatBackend {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    system_prompt: String,
    prompt_separator: String,
    temperature: f64,
    max_tokens: Option<i64>,
    client: reqwest::Client,
    max_retries: u32,
    retry_base_delay: Duration,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<i64>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl ChatBackend {
    /// Create a chat backend with default settings
    ///
    /// # Parameters
    ///
    /// - `endpoint`: API base URL without the `/chat/completions` suffix
    /// - `model`: Model identifier
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            system_prompt: RECORDS_ANALYST_INSTRUCTION.to_string(),
            prompt_separator: String::new(),
            temperature: 0.7,
            max_tokens: Some(-1),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_secs(1),
        })
    }

    /// Create a chat backend from configuration
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            system_prompt: config.system_prompt.clone(),
            prompt_separator: config.prompt_separator.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
            max_retries: config.max_retries.max(1),
            retry_base_delay: Duration::from_secs(1),
        })
    }

    /// Set the maximum number of attempts per request
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the first backoff delay; later delays double
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Set the bearer token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Replace the system instruction
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Set the text placed between prompt and chunk
    pub fn with_prompt_separator(mut self, separator: impl Into<String>) -> Self {
        self.prompt_separator = separator.into();
        self
    }

    pub(crate) fn build_request(&self, prompt_text: &str, chunk_text: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: self.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("{}{}{}", prompt_text, self.prompt_separator, chunk_text),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        }
    }

    /// Request a completion and return the assistant message content
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The endpoint is unreachable after every retry
    /// - The endpoint answers with a non-success status
    /// - The response has no message content
    pub async fn complete(&self, prompt_text: &str, chunk_text: &str) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let request_body = self.build_request(prompt_text, chunk_text);

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            let mut request = self.client.post(&url).json(&request_body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body: ChatResponse = response.json().await.map_err(|e| {
                            BackendError::InvalidResponse(format!("Failed to parse response: {}", e))
                        })?;
                        return body
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|choice| choice.message.content)
                            .ok_or_else(|| {
                                BackendError::InvalidResponse("Response has no message content".to_string())
                            });
                    }

                    let body = response.text().await.unwrap_or_default();
                    let error = BackendError::Http {
                        status: status.as_u16(),
                        body,
                    };
                    if !(status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS) {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
                Err(e) => {
                    last_error = Some(BackendError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                let delay = backoff_delay(self.retry_base_delay, attempts);
                warn!(
                    "Chat request attempt {}/{} failed, retrying in {:?}",
                    attempts, self.max_retries, delay
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| BackendError::Communication("Max retries exceeded".to_string())))
    }
}

/// Delay before the attempt after `attempt`: 1x, 2x, 4x the base, capped
/// at [`MAX_RETRY_DELAY`]
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}

impl Backend for ChatBackend {
    fn name(&self) -> &str {
        "chat"
    }

    async fn invoke(&self, prompt_text: &str, chunk_text: &str) -> InvocationResult {
        match self.complete(prompt_text, chunk_text).await {
            Ok(content) => {
                debug!("Chat response length: {} chars", content.len());
                InvocationResult::from_response_text(content)
            }
            Err(e) => InvocationResult::backend_error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_domain::InvocationStatus;

    #[test]
    fn test_chat_backend_creation() {
        let backend = ChatBackend::new("http://localhost:1234/v1/", "gemma").unwrap();
        assert_eq!(backend.endpoint, "http://localhost:1234/v1");
        assert_eq!(backend.model, "gemma");
        assert_eq!(backend.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_with_max_retries_never_zero() {
        let backend = ChatBackend::new("http://localhost:1234/v1", "m")
            .unwrap()
            .with_max_retries(0);
        assert_eq!(backend.max_retries, 1);
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(4));
        assert_eq!(backoff_delay(base, 7), MAX_RETRY_DELAY);
        assert_eq!(backoff_delay(base, 40), MAX_RETRY_DELAY);
        assert_eq!(backoff_delay(base, u32::MAX), MAX_RETRY_DELAY);
    }

    #[test]
    fn test_request_shape() {
        let backend = ChatBackend::from_config(&BackendConfig::openai()).unwrap();
        let request = serde_json::to_value(backend.build_request("Extract total.", "Total: 100")).unwrap();

        assert_eq!(request["model"], "gpt-4o-mini");
        assert_eq!(request["stream"], false);
        assert_eq!(request["messages"][0]["role"], "system");
        assert_eq!(request["messages"][1]["role"], "user");
        assert_eq!(request["messages"][1]["content"], "Extract total.\n\nTotal: 100");
        assert!(request.get("max_tokens").is_none());
    }

    #[test]
    fn test_lm_studio_request_sends_unlimited_sentinel() {
        let backend = ChatBackend::from_config(&BackendConfig::lm_studio()).unwrap();
        let request = serde_json::to_value(backend.build_request("P:", "body")).unwrap();

        assert_eq!(request["max_tokens"], -1);
        assert_eq!(request["messages"][1]["content"], "P:body");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_backend_error() {
        let backend = ChatBackend::new("http://127.0.0.1:9", "m")
            .unwrap()
            .with_max_retries(1);

        let result = backend.invoke("p", "c").await;
        assert_eq!(result.status, InvocationStatus::BackendError);
        assert!(result.detail.unwrap().contains("Communication error"));
    }
}
