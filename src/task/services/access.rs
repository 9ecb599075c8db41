//! Role and ownership guards shared by the services.

use super::{TaskLifecycleError, TaskLifecycleResult};
use crate::task::domain::{Actor, ActorRole, Task};

/// Rejects callers whose role differs from `required`.
pub(crate) fn require_role(
    actor: &Actor,
    required: ActorRole,
    operation: &'static str,
) -> TaskLifecycleResult<()> {
    let actual = actor.role();
    if actual == required {
        return Ok(());
    }
    Err(TaskLifecycleError::RoleNotPermitted {
        operation,
        required,
        actual,
    })
}

/// Rejects callers that hold no reference on `task`.
pub(crate) fn require_owner(task: &Task, actor: &Actor) -> TaskLifecycleResult<()> {
    if task.is_owned_by(actor) {
        return Ok(());
    }
    Err(TaskLifecycleError::NotOwner {
        task_id: task.id(),
        actor: *actor,
    })
}

/// Read-side variant of [`require_owner`]: a task the caller cannot see is
/// reported as missing.
pub(crate) fn require_visible(task: Task, actor: &Actor) -> TaskLifecycleResult<Task> {
    if task.is_owned_by(actor) {
        return Ok(task);
    }
    Err(TaskLifecycleError::TaskNotFound(task.id()))
}
