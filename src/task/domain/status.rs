//! Task status values and the transition table.

use super::{ActorRole, ParseTaskStatusError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fulfilment status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task has been requested and nothing has been supplied yet.
    New,
    /// The intake packet has been supplied.
    DocumentsUploaded,
    /// A professional has been assigned.
    Assigned,
    /// The assigned professional is working on the task.
    InProgress,
    /// Work has been declared complete.
    Completed,
    /// The request has been turned down or withdrawn.
    Rejected,
}

impl TaskStatus {
    /// Every status, in workflow order.
    pub const ALL: [Self; 6] = [
        Self::New,
        Self::DocumentsUploaded,
        Self::Assigned,
        Self::InProgress,
        Self::Completed,
        Self::Rejected,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::DocumentsUploaded => "DOCUMENTS_UPLOADED",
            Self::Assigned => "ASSIGNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Returns whether no further transitions are expected from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Returns whether `role` may move a task from `self` to `target` under
    /// the strict transition table.
    ///
    /// `Assigned -> Assigned` is listed because re-assignment to a different
    /// professional is a real transition even though the status is unchanged.
    /// Moves into `Assigned` are additionally limited to [`Task::assign`].
    ///
    /// [`Task::assign`]: super::Task::assign
    #[must_use]
    pub const fn strict_allows(self, target: Self, role: ActorRole) -> bool {
        match (self, target) {
            (Self::New, Self::DocumentsUploaded) => {
                matches!(role, ActorRole::Customer | ActorRole::Company)
            }
            (
                Self::New | Self::DocumentsUploaded | Self::Assigned | Self::InProgress,
                Self::Assigned,
            ) => matches!(role, ActorRole::Company),
            (Self::Assigned, Self::InProgress) | (Self::InProgress, Self::Completed) => {
                matches!(role, ActorRole::Professional)
            }
            (Self::New | Self::DocumentsUploaded, Self::Rejected) => {
                matches!(role, ActorRole::Customer | ActorRole::Company)
            }
            (Self::Assigned | Self::InProgress, Self::Rejected) => {
                matches!(role, ActorRole::Professional | ActorRole::Company)
            }
            _ => false,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "NEW" => Ok(Self::New),
            "DOCUMENTS_UPLOADED" => Ok(Self::DocumentsUploaded),
            "ASSIGNED" => Ok(Self::Assigned),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// How requested status changes are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Only transitions listed in [`TaskStatus::strict_allows`] are accepted.
    #[default]
    Strict,
    /// Any owner may set any different status.
    Permissive,
}

impl TransitionPolicy {
    /// Returns whether `role` may move a task from `from` to `to`.
    ///
    /// Re-setting the same status is handled separately by callers and is
    /// never reported as allowed here unless the strict table lists it.
    #[must_use]
    pub const fn allows(self, from: TaskStatus, to: TaskStatus, role: ActorRole) -> bool {
        match self {
            Self::Strict => from.strict_allows(to, role),
            Self::Permissive => true,
        }
    }

    /// Returns the canonical configuration representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Permissive => "permissive",
        }
    }
}
