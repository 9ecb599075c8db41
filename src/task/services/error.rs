//! Service-level error type and its client-facing classification.

use super::uploads::UploadFailure;
use crate::blob::BlobStoreError;
use crate::task::{
    domain::{Actor, ActorRole, DocumentId, ServiceId, TaskDomainError, TaskId, TaskStatus},
    ports::{CatalogError, TaskRepositoryError},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coarse classification of a failure, stable enough to map onto a
/// transport status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A referenced record does not exist or is not visible to the caller.
    NotFound,
    /// The caller's role or ownership does not permit the operation.
    Forbidden,
    /// The request conflicts with the current state of the record.
    Conflict,
    /// The task is not in a status that permits the operation.
    InvalidState,
    /// The request itself is malformed.
    InvalidInput,
    /// A downstream dependency failed.
    UpstreamFailure,
}

impl ErrorKind {
    /// Returns the canonical `snake_case` name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::InvalidState => "invalid_state",
            Self::InvalidInput => "invalid_input",
            Self::UpstreamFailure => "upstream_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service-level errors for task lifecycle and query operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// The task does not exist or is not visible to the caller.
    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    /// The requested catalog service does not exist.
    #[error("service {0} not found")]
    ServiceNotFound(ServiceId),

    /// No company can fulfil the requested service.
    #[error("no company is available for service {0}")]
    NoCompanyAvailable(ServiceId),

    /// The document does not exist.
    #[error("document {0} not found")]
    DocumentNotFound(DocumentId),

    /// The operation is reserved to another role.
    #[error("{operation} requires the {required} role, not {actual}")]
    RoleNotPermitted {
        /// Operation name.
        operation: &'static str,
        /// Role the operation requires.
        required: ActorRole,
        /// Role of the caller.
        actual: ActorRole,
    },

    /// The caller holds the right role but no reference on the task.
    #[error("{actor} is not a party to task {task_id}")]
    NotOwner {
        /// Task identifier.
        task_id: TaskId,
        /// Caller.
        actor: Actor,
    },

    /// The caller did not upload the document it tries to delete.
    #[error("{actor} did not upload document {document_id}")]
    NotUploader {
        /// Document identifier.
        document_id: DocumentId,
        /// Caller.
        actor: Actor,
    },

    /// The company intake packet can only be supplied once.
    #[error("task {task_id} already has {count} document(s)")]
    DocumentsAlreadyPresent {
        /// Task identifier.
        task_id: TaskId,
        /// Documents already attached.
        count: usize,
    },

    /// Final documents require a completed task.
    #[error("task {task_id} is {status}; final documents require COMPLETED")]
    NotCompleted {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        status: TaskStatus,
    },

    /// The upload request breaks the upload policy.
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    /// The page request is out of range.
    #[error("invalid page request: {0}")]
    InvalidPage(String),

    /// Every file in the request failed to store.
    #[error("all {} upload(s) for task {task_id} failed", failures.len())]
    UploadsFailed {
        /// Task identifier.
        task_id: TaskId,
        /// Per-file failures.
        failures: Vec<UploadFailure>,
    },

    /// The task kept changing underneath the commit.
    #[error("task {task_id} changed concurrently; gave up after {attempts} attempt(s)")]
    ConcurrentModification {
        /// Task identifier.
        task_id: TaskId,
        /// Commits attempted.
        attempts: u32,
    },

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),

    /// Catalog or company directory failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Blob storage failed.
    #[error(transparent)]
    Blob(#[from] BlobStoreError),
}

impl TaskLifecycleError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TaskNotFound(_)
            | Self::ServiceNotFound(_)
            | Self::NoCompanyAvailable(_)
            | Self::DocumentNotFound(_) => ErrorKind::NotFound,
            Self::RoleNotPermitted { .. } | Self::NotOwner { .. } | Self::NotUploader { .. } => {
                ErrorKind::Forbidden
            }
            Self::DocumentsAlreadyPresent { .. } | Self::ConcurrentModification { .. } => {
                ErrorKind::Conflict
            }
            Self::NotCompleted { .. } => ErrorKind::InvalidState,
            Self::InvalidUpload(_) | Self::InvalidPage(_) => ErrorKind::InvalidInput,
            Self::UploadsFailed { .. } | Self::Catalog(_) | Self::Blob(_) => {
                ErrorKind::UpstreamFailure
            }
            Self::Domain(err) => domain_kind(err),
            Self::Repository(err) => repository_kind(err),
        }
    }
}

const fn domain_kind(err: &TaskDomainError) -> ErrorKind {
    match err {
        TaskDomainError::StatusUnchanged { .. } | TaskDomainError::AlreadyAssigned { .. } => {
            ErrorKind::Conflict
        }
        TaskDomainError::TransitionNotAllowed { .. } => ErrorKind::InvalidState,
        TaskDomainError::EmptyMessage | TaskDomainError::EmptyFileName => ErrorKind::InvalidInput,
    }
}

const fn repository_kind(err: &TaskRepositoryError) -> ErrorKind {
    match err {
        TaskRepositoryError::NotFound(_) | TaskRepositoryError::DocumentNotFound { .. } => {
            ErrorKind::NotFound
        }
        TaskRepositoryError::DuplicateTask(_) | TaskRepositoryError::VersionConflict { .. } => {
            ErrorKind::Conflict
        }
        TaskRepositoryError::Persistence(_) => ErrorKind::UpstreamFailure,
    }
}

/// Result type for task lifecycle and query operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;
