//! Domain model for the service fulfilment workflow.
//!
//! The domain holds the task aggregate, its append-only status ledger and
//! the uploaded-document records. Infrastructure concerns stay outside of
//! the domain boundary.

mod actor;
mod document;
mod error;
mod ids;
mod status;
mod task;
mod update;

pub use actor::{Actor, ActorRole};
pub use document::{Document, FileMetadata, PersistedDocumentData};
pub use error::{ParseActorRoleError, ParseTaskStatusError, TaskDomainError};
pub use ids::{
    CompanyId, CustomerId, DocumentId, ProfessionalId, ServiceId, StatusUpdateId, TaskId,
};
pub use status::{TaskStatus, TransitionPolicy};
pub use task::{NewTask, PersistedTaskData, Task, TaskPriority};
pub use update::{Attachment, PersistedStatusUpdateData, StatusUpdate};
