use serde::{Deserialize, Serialize};

/// One successful `/generate-text` exchange, written after the provider
/// replies. The store assigns the id and creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionLog {
    pub user_id: String,
    /// Document text up to the cursor, exactly as sent to the provider.
    pub input_text: String,
    pub response_text: String,
}

impl CompletionLog {
    pub fn new(
        user_id: impl Into<String>,
        input_text: impl Into<String>,
        response_text: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            input_text: input_text.into(),
            response_text: response_text.into(),
        }
    }
}
