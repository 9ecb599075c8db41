//! Status ledger entries.
//!
//! Entries are immutable once built. The task's current status is a cache
//! of the latest status-changing entry.

use super::{Actor, ActorRole, StatusUpdateId, TaskDomainError, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// File reference carried by a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Display name of the file.
    pub name: String,
    /// Retrievable storage URL.
    pub url: String,
    /// MIME type of the file.
    pub mime_type: String,
}

/// Append-only record of one status transition or annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    id: StatusUpdateId,
    task_id: TaskId,
    previous_status: Option<TaskStatus>,
    new_status: Option<TaskStatus>,
    actor: Actor,
    is_internal: bool,
    message: String,
    attachments: Vec<Attachment>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedStatusUpdateData {
    /// Persisted entry identifier.
    pub id: StatusUpdateId,
    /// Task the entry belongs to.
    pub task_id: TaskId,
    /// Status before the transition, if any.
    pub previous_status: Option<TaskStatus>,
    /// Status after the transition, if any.
    pub new_status: Option<TaskStatus>,
    /// Acting identity.
    pub actor: Actor,
    /// Whether the entry is hidden from customers.
    pub is_internal: bool,
    /// Free-text message.
    pub message: String,
    /// Attached files.
    pub attachments: Vec<Attachment>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl StatusUpdate {
    /// Builds an entry recording a move to `new_status`.
    ///
    /// `previous_status` is `None` only for the entry written at task
    /// creation.
    #[must_use]
    pub fn transition(
        task_id: TaskId,
        previous_status: Option<TaskStatus>,
        new_status: TaskStatus,
        actor: Actor,
        message: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: StatusUpdateId::new(),
            task_id,
            previous_status,
            new_status: Some(new_status),
            actor,
            is_internal: false,
            message: message.into(),
            attachments: Vec::new(),
            created_at: clock.utc(),
        }
    }

    /// Builds an entry that leaves the status untouched.
    #[must_use]
    pub fn annotation(
        task_id: TaskId,
        actor: Actor,
        message: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: StatusUpdateId::new(),
            task_id,
            previous_status: None,
            new_status: None,
            actor,
            is_internal: false,
            message: message.into(),
            attachments: Vec::new(),
            created_at: clock.utc(),
        }
    }

    /// Builds a free-text note, rejecting blank messages.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyMessage`] when `message` is blank.
    pub fn note(
        task_id: TaskId,
        actor: Actor,
        message: &str,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyMessage);
        }
        Ok(Self::annotation(task_id, actor, trimmed, clock))
    }

    /// Reconstructs an entry from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedStatusUpdateData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            previous_status: data.previous_status,
            new_status: data.new_status,
            actor: data.actor,
            is_internal: data.is_internal,
            message: data.message,
            attachments: data.attachments,
            created_at: data.created_at,
        }
    }

    /// Sets the internal-visibility flag.
    #[must_use]
    pub const fn internal(mut self, is_internal: bool) -> Self {
        self.is_internal = is_internal;
        self
    }

    /// Sets the attached files.
    #[must_use]
    pub fn with_attachments(mut self, attachments: impl IntoIterator<Item = Attachment>) -> Self {
        self.attachments = attachments.into_iter().collect();
        self
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> StatusUpdateId {
        self.id
    }

    /// Returns the task the entry belongs to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the status before the change.
    #[must_use]
    pub const fn previous_status(&self) -> Option<TaskStatus> {
        self.previous_status
    }

    /// Returns the status after the change.
    #[must_use]
    pub const fn new_status(&self) -> Option<TaskStatus> {
        self.new_status
    }

    /// Returns the acting identity.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        self.actor
    }

    /// Returns the acting role.
    #[must_use]
    pub const fn role(&self) -> ActorRole {
        self.actor.role()
    }

    /// Returns whether the entry is hidden from customers.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        self.is_internal
    }

    /// Returns the free-text message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the attached files.
    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns whether a reader in `role` may see this entry.
    #[must_use]
    pub const fn is_visible_to(&self, role: ActorRole) -> bool {
        match role {
            ActorRole::Customer => !self.is_internal,
            ActorRole::Professional | ActorRole::Company => true,
        }
    }
}
