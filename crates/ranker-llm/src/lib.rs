//! Chat-completion client layer for stock-ranker
//!
//! This crate provides the provider-agnostic pieces the ranking pipeline needs
//! to talk to a hosted language model:
//!
//! - Message types for chat requests
//! - Completion request/response types, including seed and JSON response mode
//! - The [`LLMProvider`] trait the pipeline depends on
//! - An OpenAI-compatible provider (Groq by default), behind the `openai` feature

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, ResponseFormat, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::LLMProvider;

// Provider implementations (feature-gated)
#[cfg(feature = "openai")]
pub mod providers;
