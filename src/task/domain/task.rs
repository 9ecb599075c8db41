//! Task aggregate root and related lifecycle types.

use super::{
    Actor, ActorRole, CompanyId, CustomerId, ProfessionalId, ServiceId, TaskDomainError, TaskId,
    TaskStatus, TransitionPolicy,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Company-settable ordering hint. Higher values are worked first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskPriority(i32);

impl TaskPriority {
    /// Wraps a caller-supplied priority value.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the underlying value.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameter object for opening a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Requesting customer.
    pub customer: CustomerId,
    /// Requested catalog service.
    pub service: ServiceId,
    /// Company the request is routed to.
    pub company: CompanyId,
    /// Free-text customer requirements.
    pub requirements: String,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    customer: CustomerId,
    service: ServiceId,
    company: CompanyId,
    professional: Option<ProfessionalId>,
    status: TaskStatus,
    priority: TaskPriority,
    requirements: String,
    assigned_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted customer reference.
    pub customer: CustomerId,
    /// Persisted service reference.
    pub service: ServiceId,
    /// Persisted company reference.
    pub company: CompanyId,
    /// Persisted assignee, if any.
    pub professional: Option<ProfessionalId>,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted priority.
    pub priority: TaskPriority,
    /// Persisted customer requirements.
    pub requirements: String,
    /// First assignment timestamp.
    pub assigned_at: Option<DateTime<Utc>>,
    /// First completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token.
    pub version: u64,
}

impl Task {
    /// Opens a new task in [`TaskStatus::New`].
    #[must_use]
    pub fn new(data: NewTask, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            customer: data.customer,
            service: data.service,
            company: data.company,
            professional: None,
            status: TaskStatus::New,
            priority: TaskPriority::default(),
            requirements: data.requirements.trim().to_owned(),
            assigned_at: None,
            completed_at: None,
            created_at: timestamp,
            updated_at: timestamp,
            version: 0,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            customer: data.customer,
            service: data.service,
            company: data.company,
            professional: data.professional,
            status: data.status,
            priority: data.priority,
            requirements: data.requirements,
            assigned_at: data.assigned_at,
            completed_at: data.completed_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
            version: data.version,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the requesting customer.
    #[must_use]
    pub const fn customer(&self) -> CustomerId {
        self.customer
    }

    /// Returns the requested service.
    #[must_use]
    pub const fn service(&self) -> ServiceId {
        self.service
    }

    /// Returns the company the task is routed to.
    #[must_use]
    pub const fn company(&self) -> CompanyId {
        self.company
    }

    /// Returns the assigned professional, if any.
    #[must_use]
    pub const fn professional(&self) -> Option<ProfessionalId> {
        self.professional
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the current priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the customer requirements text.
    #[must_use]
    pub fn requirements(&self) -> &str {
        &self.requirements
    }

    /// Returns when the task first reached [`TaskStatus::Assigned`].
    #[must_use]
    pub const fn assigned_at(&self) -> Option<DateTime<Utc>> {
        self.assigned_at
    }

    /// Returns when the task first reached [`TaskStatus::Completed`].
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the optimistic concurrency token.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns whether `actor` holds the role-specific reference on this task.
    #[must_use]
    pub fn is_owned_by(&self, actor: &Actor) -> bool {
        match *actor {
            Actor::Customer(id) => self.customer == id,
            Actor::Professional(id) => self.professional == Some(id),
            Actor::Company(id) => self.company == id,
        }
    }

    /// Moves the task to `target` on behalf of `role`.
    ///
    /// Returns the status held before the transition.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::StatusUnchanged`] when `target` equals the
    /// current status, or [`TaskDomainError::TransitionNotAllowed`] when the
    /// policy rejects the transition. [`TaskStatus::Assigned`] is only
    /// reachable through [`Task::assign`] under [`TransitionPolicy::Strict`],
    /// and never reachable here while no professional is attached.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        role: ActorRole,
        policy: TransitionPolicy,
        clock: &impl Clock,
    ) -> Result<TaskStatus, TaskDomainError> {
        let previous = self.status;
        if previous == target {
            return Err(TaskDomainError::StatusUnchanged {
                task_id: self.id,
                status: target,
            });
        }
        let needs_assignment = target == TaskStatus::Assigned
            && (policy == TransitionPolicy::Strict || self.professional.is_none());
        if needs_assignment {
            return Err(self.not_allowed(target, role));
        }
        self.ensure_allowed(target, role, policy)?;
        self.apply_status(target, clock);
        Ok(previous)
    }

    /// Assigns (or re-assigns) the task to a professional.
    ///
    /// Returns the status held before the assignment.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::AlreadyAssigned`] when the task is already
    /// assigned to `professional`, or
    /// [`TaskDomainError::TransitionNotAllowed`] when the policy rejects the
    /// move into [`TaskStatus::Assigned`].
    pub fn assign(
        &mut self,
        professional: ProfessionalId,
        policy: TransitionPolicy,
        clock: &impl Clock,
    ) -> Result<TaskStatus, TaskDomainError> {
        let previous = self.status;
        if previous == TaskStatus::Assigned && self.professional == Some(professional) {
            return Err(TaskDomainError::AlreadyAssigned {
                task_id: self.id,
                professional_id: professional,
            });
        }
        self.ensure_allowed(TaskStatus::Assigned, ActorRole::Company, policy)?;
        self.professional = Some(professional);
        self.apply_status(TaskStatus::Assigned, clock);
        Ok(previous)
    }

    /// Records that the intake packet has been supplied.
    ///
    /// A task already in [`TaskStatus::DocumentsUploaded`] keeps its status.
    /// Returns the status held before the call.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TransitionNotAllowed`] when the policy
    /// rejects the move into [`TaskStatus::DocumentsUploaded`].
    pub fn record_intake_documents(
        &mut self,
        role: ActorRole,
        policy: TransitionPolicy,
        clock: &impl Clock,
    ) -> Result<TaskStatus, TaskDomainError> {
        let previous = self.status;
        if previous == TaskStatus::DocumentsUploaded {
            self.touch(clock);
            return Ok(previous);
        }
        self.ensure_allowed(TaskStatus::DocumentsUploaded, role, policy)?;
        self.apply_status(TaskStatus::DocumentsUploaded, clock);
        Ok(previous)
    }

    /// Replaces the task priority and returns the previous value.
    pub fn set_priority(&mut self, priority: TaskPriority, clock: &impl Clock) -> TaskPriority {
        let previous = self.priority;
        self.priority = priority;
        self.touch(clock);
        previous
    }

    /// Marks a modification that does not change any task field, such as a
    /// note or a document change.
    pub fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }

    /// Advances the concurrency token ahead of a commit.
    pub const fn advance_version(&mut self) {
        self.version += 1;
    }

    fn ensure_allowed(
        &self,
        target: TaskStatus,
        role: ActorRole,
        policy: TransitionPolicy,
    ) -> Result<(), TaskDomainError> {
        if policy.allows(self.status, target, role) {
            return Ok(());
        }
        Err(self.not_allowed(target, role))
    }

    const fn not_allowed(&self, target: TaskStatus, role: ActorRole) -> TaskDomainError {
        TaskDomainError::TransitionNotAllowed {
            task_id: self.id,
            from: self.status,
            to: target,
            role,
        }
    }

    fn apply_status(&mut self, target: TaskStatus, clock: &impl Clock) {
        let timestamp = clock.utc();
        self.status = target;
        match target {
            TaskStatus::Assigned => {
                self.assigned_at.get_or_insert(timestamp);
            }
            TaskStatus::Completed => {
                self.completed_at.get_or_insert(timestamp);
            }
            TaskStatus::New
            | TaskStatus::DocumentsUploaded
            | TaskStatus::InProgress
            | TaskStatus::Rejected => {}
        }
        self.updated_at = timestamp;
    }
}
