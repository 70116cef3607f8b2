use serde::{Deserialize, Serialize};

/// Full document text captured on an explicit `/save-snapshot` call.
/// Append-only; the store assigns the id and creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSnapshot {
    pub user_id: String,
    pub text: String,
}

impl TextSnapshot {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
        }
    }
}
