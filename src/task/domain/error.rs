//! Error types for task domain validation and parsing.

use super::{ActorRole, ProfessionalId, TaskId, TaskStatus};
use thiserror::Error;

/// Errors raised by task aggregate rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The requested status equals the current status.
    #[error("task {task_id} is already {status}")]
    StatusUnchanged {
        /// Task identifier.
        task_id: TaskId,
        /// Current and requested status.
        status: TaskStatus,
    },

    /// The transition is not permitted for the acting role.
    #[error("task {task_id} cannot move from {from} to {to} as {role}")]
    TransitionNotAllowed {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
        /// Role that requested the transition.
        role: ActorRole,
    },

    /// The task is already assigned to the same professional.
    #[error("task {task_id} is already assigned to professional {professional_id}")]
    AlreadyAssigned {
        /// Task identifier.
        task_id: TaskId,
        /// Current assignee.
        professional_id: ProfessionalId,
    },

    /// A ledger message is empty after trimming.
    #[error("update message must not be empty")]
    EmptyMessage,

    /// An uploaded file has no usable name.
    #[error("file name must not be empty")]
    EmptyFileName,
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing actor roles from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown actor role: {0}")]
pub struct ParseActorRoleError(pub String);
