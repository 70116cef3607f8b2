//! Language-model provider abstraction.
//!
//! Handlers only see [`ChatProvider`], so the OpenAI-compatible client can be
//! swapped for the scripted mock in tests.

pub mod mock;
pub mod openai;

use crate::models::ChatMessage;
use async_trait::async_trait;
use thiserror::Error;

pub use mock::MockChatProvider;
pub use openai::{OpenAiConfig, OpenAiProvider};

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider returned no completion")]
    EmptyResponse,
}

/// Chat-completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Sends `history` as the whole conversation and returns the assistant's
    /// reply, untrimmed.
    async fn continue_chat(
        &self,
        history: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, ProviderError>;

    /// Single-shot completion: one system turn followed by `context` as the
    /// only user turn.
    async fn complete(
        &self,
        system_prompt: &str,
        context: &str,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(context)];
        self.continue_chat(&messages, max_tokens).await
    }

    /// Model identifier, for logs and metrics.
    fn model(&self) -> &str;
}
