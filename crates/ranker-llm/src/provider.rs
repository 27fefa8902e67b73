//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for chat-completion providers
///
/// The ranking pipeline only ever sees this trait, so tests can hand it a fake
/// and deployments can point it at any OpenAI-compatible service.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the model
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "groq", "openai")
    fn name(&self) -> &str;
}
