//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::InvocationResult;
use std::future::Future;

/// Trait for LLM backends
///
/// Implemented by the infrastructure layer (docket-llm). An invocation never
/// fails with `Err`: transport problems, undecodable answers and exhausted
/// polling are all reported through [`InvocationResult::status`].
pub trait Backend {
    /// Short identifier for logs (e.g. `"chat"`, `"job"`, `"mock"`)
    fn name(&self) -> &str;

    /// Submit one prompt together with one chunk of document text
    fn invoke(
        &self,
        prompt_text: &str,
        chunk_text: &str,
    ) -> impl Future<Output = InvocationResult> + Send;
}
