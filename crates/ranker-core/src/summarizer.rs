//! Narrative summary of a ranking table

use crate::config::LlmSettings;
use crate::error::Result;
use crate::extractor::FENCE;
use crate::prompts;
use ranker_llm::{CompletionRequest, LLMProvider, Message};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Asks the model for free-text commentary on the rankings
pub struct NarrativeSummarizer {
    provider: Arc<dyn LLMProvider>,
    settings: LlmSettings,
}

impl NarrativeSummarizer {
    pub fn new(provider: Arc<dyn LLMProvider>, settings: LlmSettings) -> Self {
        Self { provider, settings }
    }

    /// Summary text for `rankings_table`, returned as the model wrote it
    #[instrument(skip_all, fields(provider = self.provider.name()))]
    pub async fn summarize(&self, rankings_table: &str) -> Result<String> {
        let mut builder = CompletionRequest::builder(&self.settings.model)
            .add_message(Message::user(prompts::summary_prompt(rankings_table)?))
            .stop(FENCE);
        if let Some(max_tokens) = self.settings.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }

        let response = self.provider.complete(builder.build()).await?;
        debug!(
            "Summary used {} tokens ({:?})",
            response.usage.total(),
            response.stop_reason
        );
        Ok(response.text().to_string())
    }
}
