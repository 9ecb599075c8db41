//! Application services for the task workflow.
//!
//! [`TaskLifecycleService`] owns every mutation; [`TaskQueryService`]
//! serves the role-scoped read models.

mod access;
mod config;
mod error;
mod lifecycle;
mod query;
mod uploads;

pub use config::{ConfigError, DeletionPolicy, UploadPolicy, WorkflowConfig};
pub use error::{ErrorKind, TaskLifecycleError, TaskLifecycleResult};
pub use lifecycle::{
    CreateTaskRequest, StatusUpdateRequest, TaskChange, TaskLifecycleService, TaskUploadResult,
};
pub use query::{
    CompanyInboxQuery, LatestUpdate, MAX_PAGE_LIMIT, Page, PageRequest, ProfessionalQueueQuery,
    TaskDetails, TaskQueryService, TaskSummary,
};
pub use uploads::{FileUpload, UploadFailure, UploadOutcome};
