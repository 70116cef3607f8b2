//! Domain models for the completion service.

pub mod chat;
pub mod completion_log;
pub mod snapshot;

pub use chat::{ChatMessage, ChatRole};
pub use completion_log::CompletionLog;
pub use snapshot::TextSnapshot;

/// Correlation label recorded when the caller does not send a `userId`.
pub const UNKNOWN_USER_ID: &str = "unknown";
