//! In-process [`LogStore`] for tests and database-less local runs.

use crate::models::{CompletionLog, TextSnapshot};
use crate::services::database::LogStore;
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Records {
    completions: Vec<CompletionLog>,
    snapshots: Vec<TextSnapshot>,
}

/// Vec-backed store. A failing instance rejects every write, standing in for
/// an unreachable database.
#[derive(Default)]
pub struct MemoryLogStore {
    records: Mutex<Records>,
    failing: bool,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            records: Mutex::default(),
            failing: true,
        }
    }

    pub fn completions(&self) -> Vec<CompletionLog> {
        self.lock().completions.clone()
    }

    pub fn snapshots(&self) -> Vec<TextSnapshot> {
        self.lock().snapshots.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing {
            Err(AppError::DatabaseError(anyhow::anyhow!(
                "connection refused"
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn record_completion(&self, entry: &CompletionLog) -> Result<(), AppError> {
        self.check()?;
        self.lock().completions.push(entry.clone());
        Ok(())
    }

    async fn record_snapshot(&self, snapshot: &TextSnapshot) -> Result<(), AppError> {
        self.check()?;
        self.lock().snapshots.push(snapshot.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.check()
    }
}
