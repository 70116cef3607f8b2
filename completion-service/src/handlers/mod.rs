//! HTTP handlers for the completion service.

pub mod assets;
pub mod generate;
pub mod health;
pub mod metrics;
pub mod snapshot;

pub use assets::spa_service;
pub use generate::{generate_chat_no_text, generate_text};
pub use health::{health_check, readiness_check};
pub use snapshot::save_snapshot;
