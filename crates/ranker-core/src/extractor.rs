//! Company extraction through the language model

use crate::config::LlmSettings;
use crate::directory::SymbolDirectory;
use crate::error::{Result, StockError};
use crate::prompts;
use ranker_llm::{CompletionRequest, LLMProvider, Message};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Stop sequence that cuts off fenced code blocks
pub(crate) const FENCE: &str = "```";

/// Validated shape of the model's extraction reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub matches: Vec<ExtractedCompany>,
}

/// One company the model picked out of the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedCompany {
    pub description: String,

    /// Anything else the model chose to say about the match
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ExtractionResponse {
    pub fn descriptions(&self) -> Vec<String> {
        self.matches.iter().map(|m| m.description.clone()).collect()
    }
}

/// Parse and validate the raw model reply
///
/// Tolerates surrounding whitespace and an opening ```json fence; anything
/// else that is not `{"matches": [{"description": "..."}]}` is an error.
pub fn parse_extraction(raw: &str) -> Result<ExtractionResponse> {
    let body = raw.trim();
    let body = body
        .strip_prefix("```json")
        .or_else(|| body.strip_prefix(FENCE))
        .unwrap_or(body)
        .trim();

    serde_json::from_str(body).map_err(|e| StockError::Extraction(format!("{e}: {body}")))
}

/// Picks listed companies out of a free-text query
pub struct EntityExtractor {
    provider: Arc<dyn LLMProvider>,
    settings: LlmSettings,
}

impl EntityExtractor {
    pub fn new(provider: Arc<dyn LLMProvider>, settings: LlmSettings) -> Self {
        Self { provider, settings }
    }

    /// Company descriptions mentioned in `query`, in the model's order
    #[instrument(skip(self, directory), fields(provider = self.provider.name()))]
    pub async fn extract(&self, query: &str, directory: &SymbolDirectory) -> Result<Vec<String>> {
        let prompt = prompts::extraction_prompt(query, &directory.names())?;

        let mut builder = CompletionRequest::builder(&self.settings.model)
            .add_message(Message::user(prompt))
            .temperature(self.settings.extraction_temperature)
            .seed(self.settings.extraction_seed)
            .json_object()
            .stop(FENCE);
        if let Some(max_tokens) = self.settings.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }

        let response = self.provider.complete(builder.build()).await?;
        debug!("Extraction reply: {}", response.text());

        let descriptions = parse_extraction(response.text())?.descriptions();
        info!("Company names retrieved: {:?}", descriptions);
        Ok(descriptions)
    }
}
