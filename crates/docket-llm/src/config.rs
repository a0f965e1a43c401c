//! Configuration for LLM backends
//!
//! Credentials and endpoints are explicit values handed to each backend at
//! construction; nothing is read from process-wide state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How documents are sent to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// One chat-completions request per chunk
    Chat,
    /// Submit a job, poll until terminal, retrieve the result
    Job,
}

impl Default for BackendMode {
    fn default() -> Self {
        BackendMode::Chat
    }
}

/// System instruction used by the LM Studio preset
pub const RECORDS_ANALYST_INSTRUCTION: &str = "You are a Public Records Analyst. Kindly analyze the given document and extract the specified information verbatim, exactly as it appears in the document. If any field is not present or cannot be confidently determined, leave it blank.";

/// System instruction used by the OpenAI preset
pub const JSON_ASSISTANT_INSTRUCTION: &str = "You are an assistant. First, replace the literal string '\\n' with an actual newline. Please provide only the necessary fields in the exact format, as JSON.";

/// Upper bound accepted for `max_retries`
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Configuration for a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Invocation mode
    pub mode: BackendMode,

    /// Base URL (e.g. `http://localhost:1234/v1`)
    pub endpoint: String,

    /// Model identifier sent with chat requests
    pub model: String,

    /// Bearer token (chat) or `unstract-key` header (job)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Fixed system message preceding every chat request
    pub system_prompt: String,

    /// Text placed between the folder prompt and the chunk
    pub prompt_separator: String,

    /// Sampling temperature
    pub temperature: f64,

    /// Completion token limit; `-1` asks for unlimited generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,

    /// Backend input limit in words, shared by the prompt and one chunk
    pub context_tokens: usize,

    /// Timeout for a single HTTP request (seconds)
    pub request_timeout_secs: u64,

    /// Attempts per chat request before giving up on transport errors
    pub max_retries: u32,

    /// Delay between job status polls (milliseconds)
    pub poll_interval_ms: u64,

    /// Status polls before a job is declared timed out
    pub max_poll_attempts: u32,
}

impl BackendConfig {
    /// Local LM Studio server with a small instruction-tuned model
    pub fn lm_studio() -> Self {
        Self {
            mode: BackendMode::Chat,
            endpoint: "http://localhost:1234/v1".to_string(),
            model: "gemma-2-2b-it".to_string(),
            api_key: None,
            system_prompt: RECORDS_ANALYST_INSTRUCTION.to_string(),
            prompt_separator: String::new(),
            temperature: 0.7,
            max_tokens: Some(-1),
            context_tokens: 4096,
            request_timeout_secs: 120,
            max_retries: 3,
            poll_interval_ms: 5_000,
            max_poll_attempts: 120,
        }
    }

    /// Hosted OpenAI chat completions
    pub fn openai() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            system_prompt: JSON_ASSISTANT_INSTRUCTION.to_string(),
            prompt_separator: "\n\n".to_string(),
            max_tokens: None,
            ..Self::lm_studio()
        }
    }

    /// Hosted whisper-style job service
    pub fn whisper() -> Self {
        Self {
            mode: BackendMode::Job,
            endpoint: "https://llmwhisperer-api.us-central.unstract.com/api/v2".to_string(),
            model: String::new(),
            system_prompt: String::new(),
            prompt_separator: "\n\n".to_string(),
            max_tokens: None,
            ..Self::lm_studio()
        }
    }

    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("endpoint must not be empty".to_string());
        }
        if self.mode == BackendMode::Chat && self.model.trim().is_empty() {
            return Err("model must not be empty in chat mode".to_string());
        }
        if self.context_tokens == 0 {
            return Err("context_tokens must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("temperature {} out of range [0.0, 2.0]", self.temperature));
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if self.max_retries == 0 || self.max_retries > MAX_RETRIES_LIMIT {
            return Err(format!(
                "max_retries must be between 1 and {}, got {}",
                MAX_RETRIES_LIMIT, self.max_retries
            ));
        }
        if self.mode == BackendMode::Job {
            if self.poll_interval_ms == 0 {
                return Err("poll_interval_ms must be greater than 0".to_string());
            }
            if self.max_poll_attempts == 0 {
                return Err("max_poll_attempts must be greater than 0".to_string());
            }
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::lm_studio()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(BackendConfig::lm_studio().validate().is_ok());
        assert!(BackendConfig::openai().validate().is_ok());
        assert!(BackendConfig::whisper().validate().is_ok());
    }

    #[test]
    fn test_default_is_lm_studio() {
        let config = BackendConfig::default();
        assert_eq!(config.mode, BackendMode::Chat);
        assert_eq!(config.context_tokens, 4096);
        assert_eq!(config.max_tokens, Some(-1));
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_chat_requires_model() {
        let mut config = BackendConfig::default();
        config.model = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_job_mode_ignores_model() {
        let config = BackendConfig::whisper();
        assert!(config.model.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_job_requires_poll_ceiling() {
        let mut config = BackendConfig::whisper();
        config.max_poll_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_retries_bounds() {
        let mut config = BackendConfig::default();
        config.max_retries = 0;
        assert!(config.validate().is_err());
        config.max_retries = MAX_RETRIES_LIMIT;
        assert!(config.validate().is_ok());
        config.max_retries = 64;
        assert!(config.validate().unwrap_err().contains("max_retries"));
    }

    #[test]
    fn test_temperature_range() {
        let mut config = BackendConfig::default();
        config.temperature = 2.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = BackendConfig::from_toml(
            r#"
            mode = "job"
            endpoint = "http://jobs.local/api"
            max_poll_attempts = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, BackendMode::Job);
        assert_eq!(config.endpoint, "http://jobs.local/api");
        assert_eq!(config.max_poll_attempts, 10);
        assert_eq!(config.poll_interval_ms, 5_000);
    }

    #[test]
    fn test_toml_keeps_api_key_out_when_unset() {
        let toml_str = BackendConfig::openai().to_toml().unwrap();
        assert!(!toml_str.contains("api_key"));

        let parsed = BackendConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.model, "gpt-4o-mini");
        assert_eq!(parsed.max_tokens, None);
    }
}
