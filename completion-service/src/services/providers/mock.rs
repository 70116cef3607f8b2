//! Scripted provider for tests.

use super::{ChatProvider, ProviderError};
use crate::models::ChatMessage;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

/// A call observed by [`MockChatProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

enum Script {
    Reply(String),
    Fail(String),
}

/// Mock chat provider returning a fixed reply (or failure) and recording
/// every request it receives.
pub struct MockChatProvider {
    script: Script,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockChatProvider {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            script: Script::Reply(reply.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with an API error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Script::Fail(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn continue_chat(
        &self,
        history: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        self.lock().push(RecordedCall {
            messages: history.to_vec(),
            max_tokens,
        });

        match &self.script {
            Script::Reply(reply) => Ok(reply.clone()),
            Script::Fail(message) => Err(ProviderError::ApiError(message.clone())),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}
