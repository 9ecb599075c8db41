//! Read port for the append-only status ledger.
//!
//! Entries are written only through [`super::TaskRepository::commit`]; this
//! port exposes the queries the projection layer needs. Visibility
//! filtering happens at read time in the services.

use super::TaskRepositoryResult;
use crate::task::domain::{StatusUpdate, TaskId};
use async_trait::async_trait;

/// Ledger query contract.
#[async_trait]
pub trait StatusLedger: Send + Sync {
    /// Returns the most recent entry for a task.
    async fn latest_update(&self, task_id: TaskId) -> TaskRepositoryResult<Option<StatusUpdate>>;

    /// Returns every entry for a task, newest first.
    async fn list_updates(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<StatusUpdate>>;
}
