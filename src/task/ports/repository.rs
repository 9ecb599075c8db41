//! Repository port for task persistence and atomic lifecycle commits.

use crate::task::domain::{
    CompanyId, CustomerId, Document, DocumentId, ProfessionalId, StatusUpdate, Task, TaskId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// One atomic unit of work against a single task aggregate.
///
/// A commit writes the task, appends exactly one ledger entry, inserts any
/// new documents and removes at most one document. Either all of it is
/// applied or none of it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCommit {
    /// Task state to persist.
    pub task: Task,
    /// Version the caller read before mutating. `None` inserts a new task.
    pub expected_version: Option<u64>,
    /// Ledger entry to append.
    pub update: StatusUpdate,
    /// Documents to insert.
    pub new_documents: Vec<Document>,
    /// Document to hard-delete.
    pub deleted_document: Option<DocumentId>,
}

impl TaskCommit {
    /// Builds a commit inserting a freshly created task.
    #[must_use]
    pub const fn creation(task: Task, update: StatusUpdate) -> Self {
        Self {
            task,
            expected_version: None,
            update,
            new_documents: Vec::new(),
            deleted_document: None,
        }
    }

    /// Builds a commit updating a task read at `expected_version`.
    #[must_use]
    pub const fn modification(task: Task, expected_version: u64, update: StatusUpdate) -> Self {
        Self {
            task,
            expected_version: Some(expected_version),
            update,
            new_documents: Vec::new(),
            deleted_document: None,
        }
    }

    /// Adds documents to insert with the commit.
    #[must_use]
    pub fn with_documents(mut self, documents: impl IntoIterator<Item = Document>) -> Self {
        self.new_documents.extend(documents);
        self
    }

    /// Marks a document for deletion with the commit.
    #[must_use]
    pub const fn deleting(mut self, document_id: DocumentId) -> Self {
        self.deleted_document = Some(document_id);
        self
    }
}

/// Role-scoped selection of tasks for the projection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    /// Tasks requested by a customer.
    Customer(CustomerId),
    /// Tasks routed to a company.
    Company(CompanyId),
    /// Tasks assigned to a professional.
    Professional(ProfessionalId),
}

impl TaskFilter {
    /// Returns whether `task` falls inside this filter.
    #[must_use]
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::Customer(id) => task.customer() == id,
            Self::Company(id) => task.company() == id,
            Self::Professional(id) => task.professional() == Some(id),
        }
    }
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Applies a [`TaskCommit`] atomically.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when inserting an
    /// existing task, [`TaskRepositoryError::NotFound`] when updating a
    /// missing task, [`TaskRepositoryError::VersionConflict`] when the stored
    /// version differs from `expected_version`, or
    /// [`TaskRepositoryError::DocumentNotFound`] when the document to delete
    /// does not belong to the task.
    async fn commit(&self, commit: &TaskCommit) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns every task matching `filter`, in no particular order.
    async fn list(&self, filter: TaskFilter) -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The document to delete was not found on the task.
    #[error("document {document_id} not found on task {task_id}")]
    DocumentNotFound {
        /// Task the document was expected on.
        task_id: TaskId,
        /// Missing document.
        document_id: DocumentId,
    },

    /// The task changed since it was read.
    #[error("task {task_id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        /// Task identifier.
        task_id: TaskId,
        /// Version the caller read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
