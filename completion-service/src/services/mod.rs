pub mod database;
pub mod memory_store;
pub mod metrics;
pub mod prompt;
pub mod providers;

pub use database::{CompletionDb, Dialect, LogStore};
pub use memory_store::MemoryLogStore;
pub use providers::{ChatProvider, ProviderError};
