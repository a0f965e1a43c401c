//! Invocation results - what a backend produced for one chunk

use serde_json::Value;
use std::fmt;

/// Terminal status of a single backend invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationStatus {
    /// Backend answered and the answer decoded as JSON
    Success,

    /// Transport failure, non-success HTTP status, or a failed/unknown job
    BackendError,

    /// Backend answered but the answer is not JSON
    ParseError,

    /// Job polling exceeded its attempt ceiling
    TimedOut,
}

impl InvocationStatus {
    /// Status name for logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationStatus::Success => "success",
            InvocationStatus::BackendError => "backend_error",
            InvocationStatus::ParseError => "parse_error",
            InvocationStatus::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of invoking a backend with one prompt and one chunk
///
/// Backends never return `Err` to the pipeline; every failure is folded into
/// a status so one bad document cannot abort the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    /// Terminal status
    pub status: InvocationStatus,

    /// Decoded JSON, present only on success
    pub payload: Option<Value>,

    /// Raw response text (empty when the backend never answered)
    pub raw_text: String,

    /// Human-readable failure detail
    pub detail: Option<String>,

    /// The job service itself ended the job, as opposed to the request
    /// never completing
    pub terminal: bool,
}

impl InvocationResult {
    /// Successful invocation carrying its decoded payload
    pub fn success(payload: Value, raw_text: impl Into<String>) -> Self {
        Self {
            status: InvocationStatus::Success,
            payload: Some(payload),
            raw_text: raw_text.into(),
            detail: None,
            terminal: false,
        }
    }

    /// Transport failure or non-success response
    pub fn backend_error(detail: impl Into<String>) -> Self {
        Self {
            status: InvocationStatus::BackendError,
            payload: None,
            raw_text: String::new(),
            detail: Some(detail.into()),
            terminal: false,
        }
    }

    /// Job that ended in a failed or unrecognised state
    pub fn job_failed(detail: impl Into<String>) -> Self {
        Self {
            terminal: true,
            ..Self::backend_error(detail)
        }
    }

    /// Response that did not decode as JSON
    pub fn parse_error(raw_text: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status: InvocationStatus::ParseError,
            payload: None,
            raw_text: raw_text.into(),
            detail: Some(detail.into()),
            terminal: false,
        }
    }

    /// Job that never reached a terminal state in time
    pub fn timed_out(detail: impl Into<String>) -> Self {
        Self {
            status: InvocationStatus::TimedOut,
            payload: None,
            raw_text: String::new(),
            detail: Some(detail.into()),
            terminal: true,
        }
    }

    /// Decode raw response text, mapping decode failures to `ParseError`
    ///
    /// # Examples
    ///
    /// ```
    /// use docket_domain::{InvocationResult, InvocationStatus};
    ///
    /// let ok = InvocationResult::from_response_text(r#"{"total": 100}"#);
    /// assert_eq!(ok.status, InvocationStatus::Success);
    ///
    /// let bad = InvocationResult::from_response_text("not json");
    /// assert_eq!(bad.status, InvocationStatus::ParseError);
    /// assert_eq!(bad.raw_text, "not json");
    /// ```
    pub fn from_response_text(raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        match serde_json::from_str::<Value>(raw_text.trim()) {
            Ok(payload) => Self::success(payload, raw_text),
            Err(e) => {
                let detail = format!("response is not valid JSON: {}", e);
                Self::parse_error(raw_text, detail)
            }
        }
    }

    /// Whether the invocation succeeded
    pub fn is_success(&self) -> bool {
        self.status == InvocationStatus::Success
    }
}
