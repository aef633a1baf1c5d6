//! Chat-completion client trait shared by the survey drivers

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::Result;
use async_trait::async_trait;

/// Anything that can answer a chat-completion request
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a completion request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the client type for debugging/logging
    fn client_type(&self) -> &str;

    /// Get the endpoint the client talks to
    fn endpoint(&self) -> &str;
}
