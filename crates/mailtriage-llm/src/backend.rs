//! The seam between the classifier and whatever answers its prompts.

use crate::error::LlmResult;
use crate::types::CompletionRequest;
use async_trait::async_trait;

/// Something that turns one system + user prompt into completion text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run one completion and return the raw response text.
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}
