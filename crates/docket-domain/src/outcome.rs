//! Processing outcomes - the terminal state of one document in a run

use crate::invocation::{InvocationResult, InvocationStatus};
use std::fmt;
use std::path::PathBuf;

/// Classification of a per-document failure
///
/// Every kind is attributable to a single document; none aborts a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No prompt is configured for the document's folder
    PromptNotFound,

    /// The source file could not be read, or was empty and skipped
    DocumentRead,

    /// Transport failure or non-success response from the backend
    BackendTransport,

    /// Backend job reached a failed, unknown, or timed-out terminal state
    BackendTerminal,

    /// Backend output is not acceptable JSON
    ResponseParse,

    /// Writing the result or moving the source failed
    Persistence,
}

impl FailureKind {
    /// Kind name for logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::PromptNotFound => "prompt_not_found",
            FailureKind::DocumentRead => "document_read",
            FailureKind::BackendTransport => "backend_transport",
            FailureKind::BackendTerminal => "backend_terminal",
            FailureKind::ResponseParse => "response_parse",
            FailureKind::Persistence => "persistence",
        }
    }

    /// Whether this failure can leave a document half-committed
    pub fn needs_operator(&self) -> bool {
        matches!(self, FailureKind::Persistence)
    }

    /// Map a failed invocation status to a failure kind
    ///
    /// Returns `None` for [`InvocationStatus::Success`].
    pub fn from_invocation(status: InvocationStatus) -> Option<Self> {
        match status {
            InvocationStatus::Success => None,
            InvocationStatus::BackendError => Some(FailureKind::BackendTransport),
            InvocationStatus::ParseError => Some(FailureKind::ResponseParse),
            InvocationStatus::TimedOut => Some(FailureKind::BackendTerminal),
        }
    }

    /// Map a failed invocation result to a failure kind
    ///
    /// Unlike [`FailureKind::from_invocation`], a `BackendError` raised by
    /// the job service itself maps to `BackendTerminal`.
    pub fn from_result(result: &InvocationResult) -> Option<Self> {
        match result.status {
            InvocationStatus::BackendError if result.terminal => Some(FailureKind::BackendTerminal),
            status => Self::from_invocation(status),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// Result written and source moved into the processed area
    Committed {
        /// Path of the written `<stem>_result.json`
        result_path: PathBuf,
        /// New location of the source file
        processed_path: PathBuf,
    },

    /// Document intentionally not sent to the backend
    Skipped {
        /// Why the document was skipped
        kind: FailureKind,
        /// Detail for logs
        reason: String,
    },

    /// Document attempted but not committed; source left in place
    Failed {
        /// What went wrong
        kind: FailureKind,
        /// Detail for logs
        reason: String,
    },
}

impl ProcessingOutcome {
    /// Whether the document was committed
    pub fn is_committed(&self) -> bool {
        matches!(self, ProcessingOutcome::Committed { .. })
    }

    /// Failure kind for skipped or failed outcomes
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ProcessingOutcome::Committed { .. } => None,
            ProcessingOutcome::Skipped { kind, .. } | ProcessingOutcome::Failed { kind, .. } => {
                Some(*kind)
            }
        }
    }

    /// Short label for tables
    pub fn label(&self) -> &'static str {
        match self {
            ProcessingOutcome::Committed { .. } => "committed",
            ProcessingOutcome::Skipped { .. } => "skipped",
            ProcessingOutcome::Failed { .. } => "failed",
        }
    }
}
