//! Read port for uploaded document records.

use super::TaskRepositoryResult;
use crate::task::domain::{Document, DocumentId, TaskId};
use async_trait::async_trait;

/// Document query contract.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Finds a document by identifier.
    async fn find_document(&self, id: DocumentId) -> TaskRepositoryResult<Option<Document>>;

    /// Returns the documents of a task, oldest first.
    async fn list_documents(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Document>>;

    /// Returns how many documents a task has.
    async fn count_documents(&self, task_id: TaskId) -> TaskRepositoryResult<usize>;
}
