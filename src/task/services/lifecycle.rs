//! Command side of the task workflow.
//!
//! Every mutation follows the same shape: load the task, check the caller,
//! apply the domain change, then commit the task together with exactly one
//! ledger entry. Commits carry the version that was read; when another
//! writer got there first the whole step is replayed against fresh state.

use super::{
    TaskLifecycleError, TaskLifecycleResult,
    access::{require_owner, require_role},
    config::{DeletionPolicy, WorkflowConfig},
    uploads::{
        FileUpload, UploadOutcome, discard_blobs, require_files, upload_all, validate_batch,
    },
};
use crate::blob::{BlobStore, document_key};
use crate::task::{
    domain::{
        Actor, ActorRole, DocumentId, NewTask, ProfessionalId, ServiceId, StatusUpdate, Task,
        TaskId, TaskPriority, TaskStatus,
    },
    ports::{
        CompanyDirectory, DocumentRepository, ServiceCatalog, TaskCommit, TaskRepository,
        TaskRepositoryError,
    },
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Request payload for opening a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    service: ServiceId,
    requirements: String,
    files: Vec<FileUpload>,
}

impl CreateTaskRequest {
    /// Creates a request without attachments.
    #[must_use]
    pub fn new(service: ServiceId, requirements: impl Into<String>) -> Self {
        Self {
            service,
            requirements: requirements.into(),
            files: Vec::new(),
        }
    }

    /// Attaches files to upload with the request.
    #[must_use]
    pub fn with_files(mut self, files: impl IntoIterator<Item = FileUpload>) -> Self {
        self.files.extend(files);
        self
    }
}

/// Request payload for a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdateRequest {
    task_id: TaskId,
    new_status: TaskStatus,
    message: Option<String>,
    is_internal: bool,
}

impl StatusUpdateRequest {
    /// Creates a customer-visible request with a generated message.
    #[must_use]
    pub const fn new(task_id: TaskId, new_status: TaskStatus) -> Self {
        Self {
            task_id,
            new_status,
            message: None,
            is_internal: false,
        }
    }

    /// Sets the ledger message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Hides the ledger entry from the customer.
    #[must_use]
    pub const fn internal(mut self, is_internal: bool) -> Self {
        self.is_internal = is_internal;
        self
    }
}

/// A task after a mutation, with the ledger entry that recorded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChange {
    /// Task state after the commit.
    pub task: Task,
    /// Ledger entry appended by the commit.
    pub update: StatusUpdate,
}

impl From<TaskCommit> for TaskChange {
    fn from(commit: TaskCommit) -> Self {
        Self {
            task: commit.task,
            update: commit.update,
        }
    }
}

/// A task after an upload, with the per-file outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUploadResult {
    /// Task state after the commit.
    pub task: Task,
    /// Stored documents and failed files.
    pub uploads: UploadOutcome,
}

/// State read at the start of each commit attempt.
struct Snapshot {
    task: Task,
    document_count: usize,
}

/// Task lifecycle orchestration service.
pub struct TaskLifecycleService<S, B, C>
where
    S: TaskRepository + DocumentRepository,
    B: BlobStore + ?Sized,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    blobs: Arc<B>,
    catalog: Arc<dyn ServiceCatalog>,
    companies: Arc<dyn CompanyDirectory>,
    clock: Arc<C>,
    config: WorkflowConfig,
}

impl<S, B, C> Clone for TaskLifecycleService<S, B, C>
where
    S: TaskRepository + DocumentRepository,
    B: BlobStore + ?Sized,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            blobs: Arc::clone(&self.blobs),
            catalog: Arc::clone(&self.catalog),
            companies: Arc::clone(&self.companies),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<S, B, C> TaskLifecycleService<S, B, C>
where
    S: TaskRepository + DocumentRepository,
    B: BlobStore + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a service with the default [`WorkflowConfig`].
    #[must_use]
    pub fn new(
        store: Arc<S>,
        blobs: Arc<B>,
        catalog: Arc<dyn ServiceCatalog>,
        companies: Arc<dyn CompanyDirectory>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            store,
            blobs,
            catalog,
            companies,
            clock,
            config: WorkflowConfig::default(),
        }
    }

    /// Replaces the workflow configuration.
    #[must_use]
    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the active workflow configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Opens a task for a customer, routing it to a company and storing any
    /// attached files.
    ///
    /// Files that fail to store are reported in the result; the task is
    /// still created with the files that succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::RoleNotPermitted`] for non-customers,
    /// [`TaskLifecycleError::InvalidUpload`] when the files break the upload
    /// policy, [`TaskLifecycleError::ServiceNotFound`] or
    /// [`TaskLifecycleError::NoCompanyAvailable`] when routing fails, or a
    /// wrapped dependency error.
    pub async fn create_task(
        &self,
        actor: Actor,
        request: CreateTaskRequest,
    ) -> TaskLifecycleResult<TaskUploadResult> {
        let Actor::Customer(customer) = actor else {
            return Err(TaskLifecycleError::RoleNotPermitted {
                operation: "create task",
                required: ActorRole::Customer,
                actual: actor.role(),
            });
        };
        validate_batch(&self.config.upload_policy, &request.files)?;

        let service = self
            .catalog
            .get(request.service)
            .await?
            .ok_or(TaskLifecycleError::ServiceNotFound(request.service))?;
        let company = self
            .companies
            .pick_company(&service)
            .await?
            .ok_or(TaskLifecycleError::NoCompanyAvailable(service.id))?;

        let mut task = Task::new(
            NewTask {
                customer,
                service: service.id,
                company,
                requirements: request.requirements,
            },
            &*self.clock,
        );
        let uploads = upload_all(&*self.blobs, task.id(), actor, request.files, &*self.clock).await;

        let result = self.commit_creation(&mut task, actor, &uploads).await;
        if let Err(err) = result {
            discard_blobs(&*self.blobs, uploads.blob_keys()).await;
            return Err(err);
        }

        info!(
            task_id = %task.id(),
            customer = %customer,
            company = %company,
            documents = uploads.documents.len(),
            "task created"
        );
        if !uploads.failures.is_empty() {
            warn!(
                task_id = %task.id(),
                failed = uploads.failures.len(),
                "task created with failed uploads"
            );
        }
        Ok(TaskUploadResult { task, uploads })
    }

    async fn commit_creation(
        &self,
        task: &mut Task,
        actor: Actor,
        uploads: &UploadOutcome,
    ) -> TaskLifecycleResult<()> {
        let stored = uploads.documents.len();
        if stored > 0 {
            task.record_intake_documents(
                ActorRole::Customer,
                self.config.transition_policy,
                &*self.clock,
            )?;
        }
        let message = if stored == 0 {
            "Task created".to_owned()
        } else {
            format!("Task created with {stored} document(s)")
        };
        let update =
            StatusUpdate::transition(task.id(), None, task.status(), actor, message, &*self.clock)
                .with_attachments(uploads.attachments());
        let commit = TaskCommit::creation(task.clone(), update)
            .with_documents(uploads.documents.iter().cloned());
        self.store.commit(&commit).await?;
        Ok(())
    }

    /// Assigns a task to a professional on behalf of its company.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::RoleNotPermitted`] for non-company
    /// callers, [`TaskLifecycleError::NotOwner`] when the task is routed to
    /// another company, or [`TaskLifecycleError::Domain`] when the task is
    /// already assigned to the same professional or cannot be assigned from
    /// its current status.
    pub async fn assign_task(
        &self,
        actor: Actor,
        task_id: TaskId,
        professional: ProfessionalId,
        message: Option<String>,
    ) -> TaskLifecycleResult<TaskChange> {
        require_role(&actor, ActorRole::Company, "assign task")?;
        let custom_message = non_blank(message);

        let commit = self
            .commit_with_retry(task_id, |Snapshot { mut task, .. }| {
                require_owner(&task, &actor)?;
                let previous =
                    task.assign(professional, self.config.transition_policy, &*self.clock)?;
                let text = custom_message
                    .clone()
                    .unwrap_or_else(|| format!("Task assigned to professional {professional}"));
                let update = StatusUpdate::transition(
                    task.id(),
                    Some(previous),
                    TaskStatus::Assigned,
                    actor,
                    text,
                    &*self.clock,
                );
                Ok(modification(task, update))
            })
            .await?;

        info!(task_id = %task_id, professional = %professional, "task assigned");
        Ok(commit.into())
    }

    /// Moves a task to a new status and records the change.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotOwner`] when the caller holds no
    /// reference on the task, or [`TaskLifecycleError::Domain`] when the
    /// status is unchanged or the transition is not allowed.
    pub async fn add_status_update(
        &self,
        actor: Actor,
        request: StatusUpdateRequest,
    ) -> TaskLifecycleResult<TaskChange> {
        let StatusUpdateRequest {
            task_id,
            new_status,
            message,
            is_internal,
        } = request;
        let custom_message = non_blank(message);

        let commit = self
            .commit_with_retry(task_id, |Snapshot { mut task, .. }| {
                require_owner(&task, &actor)?;
                let previous = task.transition_to(
                    new_status,
                    actor.role(),
                    self.config.transition_policy,
                    &*self.clock,
                )?;
                let text = custom_message
                    .clone()
                    .unwrap_or_else(|| format!("Status changed from {previous} to {new_status}"));
                let update = StatusUpdate::transition(
                    task.id(),
                    Some(previous),
                    new_status,
                    actor,
                    text,
                    &*self.clock,
                )
                .internal(is_internal);
                Ok(modification(task, update))
            })
            .await?;

        info!(
            task_id = %task_id,
            actor = %actor,
            status = %new_status,
            internal = is_internal,
            "task status changed"
        );
        Ok(commit.into())
    }

    /// Appends a free-text note without changing the status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotOwner`] when the caller holds no
    /// reference on the task, or [`TaskLifecycleError::Domain`] when the
    /// message is blank.
    pub async fn add_note(
        &self,
        actor: Actor,
        task_id: TaskId,
        message: &str,
        is_internal: bool,
    ) -> TaskLifecycleResult<StatusUpdate> {
        let commit = self
            .commit_with_retry(task_id, |Snapshot { mut task, .. }| {
                require_owner(&task, &actor)?;
                let update = StatusUpdate::note(task.id(), actor, message, &*self.clock)?
                    .internal(is_internal);
                task.touch(&*self.clock);
                Ok(modification(task, update))
            })
            .await?;

        debug!(task_id = %task_id, actor = %actor, internal = is_internal, "note added");
        Ok(commit.update)
    }

    /// Changes the task priority. The ledger entry is internal.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::RoleNotPermitted`] for non-company
    /// callers or [`TaskLifecycleError::NotOwner`] when the task is routed to
    /// another company.
    pub async fn update_priority(
        &self,
        actor: Actor,
        task_id: TaskId,
        priority: TaskPriority,
    ) -> TaskLifecycleResult<TaskChange> {
        require_role(&actor, ActorRole::Company, "update priority")?;

        let commit = self
            .commit_with_retry(task_id, |Snapshot { mut task, .. }| {
                require_owner(&task, &actor)?;
                let previous = task.set_priority(priority, &*self.clock);
                let update = StatusUpdate::annotation(
                    task.id(),
                    actor,
                    format!("Priority changed from {previous} to {priority}"),
                    &*self.clock,
                )
                .internal(true);
                Ok(modification(task, update))
            })
            .await?;

        info!(task_id = %task_id, priority = %priority, "task priority changed");
        Ok(commit.into())
    }

    /// Supplies the intake packet on behalf of the task's company.
    ///
    /// The packet can only be supplied while the task has no documents.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::RoleNotPermitted`] for non-company
    /// callers, [`TaskLifecycleError::NotOwner`] for another company,
    /// [`TaskLifecycleError::DocumentsAlreadyPresent`] when documents exist,
    /// [`TaskLifecycleError::InvalidUpload`] for an empty or oversized
    /// batch, [`TaskLifecycleError::UploadsFailed`] when no file could be
    /// stored, or [`TaskLifecycleError::Domain`] when the status does not
    /// permit the intake.
    pub async fn upload_company_documents(
        &self,
        actor: Actor,
        task_id: TaskId,
        files: Vec<FileUpload>,
    ) -> TaskLifecycleResult<TaskUploadResult> {
        require_role(&actor, ActorRole::Company, "upload company documents")?;
        require_files(&files)?;
        validate_batch(&self.config.upload_policy, &files)?;
        self.accept_intake(self.snapshot(task_id).await?, &actor)?;

        let uploads = upload_all(&*self.blobs, task_id, actor, files, &*self.clock).await;
        if uploads.documents.is_empty() {
            return Err(TaskLifecycleError::UploadsFailed {
                task_id,
                failures: uploads.failures,
            });
        }

        let stored = uploads.documents.len();
        let result = self
            .commit_with_retry(task_id, |snapshot| {
                let (task, previous) = self.accept_intake(snapshot, &actor)?;
                let update = StatusUpdate::transition(
                    task.id(),
                    Some(previous),
                    task.status(),
                    actor,
                    format!("{stored} document(s) uploaded by company"),
                    &*self.clock,
                )
                .with_attachments(uploads.attachments());
                Ok(modification(task, update).with_documents(uploads.documents.iter().cloned()))
            })
            .await;
        let commit = match result {
            Ok(commit) => commit,
            Err(err) => {
                discard_blobs(&*self.blobs, uploads.blob_keys()).await;
                return Err(err);
            }
        };

        info!(task_id = %task_id, documents = stored, "company documents uploaded");
        if !uploads.failures.is_empty() {
            warn!(
                task_id = %task_id,
                failed = uploads.failures.len(),
                "some company documents failed to upload"
            );
        }
        Ok(TaskUploadResult {
            task: commit.task,
            uploads,
        })
    }

    fn accept_intake(
        &self,
        snapshot: Snapshot,
        actor: &Actor,
    ) -> TaskLifecycleResult<(Task, TaskStatus)> {
        let Snapshot {
            mut task,
            document_count,
        } = snapshot;
        require_owner(&task, actor)?;
        if document_count > 0 {
            return Err(TaskLifecycleError::DocumentsAlreadyPresent {
                task_id: task.id(),
                count: document_count,
            });
        }
        let previous = task.record_intake_documents(
            ActorRole::Company,
            self.config.transition_policy,
            &*self.clock,
        )?;
        Ok((task, previous))
    }

    /// Attaches deliverables to a completed task on behalf of its assigned
    /// professional. The ledger entry is visible to the customer.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::RoleNotPermitted`] for
    /// non-professionals, [`TaskLifecycleError::NotOwner`] when the caller
    /// is not the assignee, [`TaskLifecycleError::NotCompleted`] before
    /// completion, [`TaskLifecycleError::InvalidUpload`] for an empty or
    /// oversized batch, or [`TaskLifecycleError::UploadsFailed`] when no file
    /// could be stored.
    pub async fn upload_final_documents(
        &self,
        actor: Actor,
        task_id: TaskId,
        files: Vec<FileUpload>,
    ) -> TaskLifecycleResult<TaskUploadResult> {
        require_role(&actor, ActorRole::Professional, "upload final documents")?;
        require_files(&files)?;
        validate_batch(&self.config.upload_policy, &files)?;
        accept_final(&self.snapshot(task_id).await?.task, &actor)?;

        let uploads = upload_all(&*self.blobs, task_id, actor, files, &*self.clock).await;
        if uploads.documents.is_empty() {
            return Err(TaskLifecycleError::UploadsFailed {
                task_id,
                failures: uploads.failures,
            });
        }

        let stored = uploads.documents.len();
        let result = self
            .commit_with_retry(task_id, |Snapshot { mut task, .. }| {
                accept_final(&task, &actor)?;
                task.touch(&*self.clock);
                let update = StatusUpdate::annotation(
                    task.id(),
                    actor,
                    format!("{stored} final document(s) uploaded"),
                    &*self.clock,
                )
                .with_attachments(uploads.attachments());
                Ok(modification(task, update).with_documents(uploads.documents.iter().cloned()))
            })
            .await;
        let commit = match result {
            Ok(commit) => commit,
            Err(err) => {
                discard_blobs(&*self.blobs, uploads.blob_keys()).await;
                return Err(err);
            }
        };

        info!(task_id = %task_id, documents = stored, "final documents uploaded");
        if !uploads.failures.is_empty() {
            warn!(
                task_id = %task_id,
                failed = uploads.failures.len(),
                "some final documents failed to upload"
            );
        }
        Ok(TaskUploadResult {
            task: commit.task,
            uploads,
        })
    }

    /// Removes a document record and its stored content.
    ///
    /// The deletion is recorded as an internal ledger entry. Stored content
    /// is removed after the commit; a failure there is logged and not
    /// reported.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::DocumentNotFound`] for unknown
    /// documents, or [`TaskLifecycleError::RoleNotPermitted`],
    /// [`TaskLifecycleError::NotOwner`] or [`TaskLifecycleError::NotUploader`]
    /// when the deletion policy rejects the caller.
    pub async fn delete_document(
        &self,
        actor: Actor,
        document_id: DocumentId,
    ) -> TaskLifecycleResult<TaskChange> {
        let document = self
            .store
            .find_document(document_id)
            .await?
            .ok_or(TaskLifecycleError::DocumentNotFound(document_id))?;
        let policy = self.config.deletion_policy;
        match policy {
            DeletionPolicy::AssignedProfessional => {
                require_role(&actor, ActorRole::Professional, "delete document")?;
            }
            DeletionPolicy::OwnUploads => {
                if document.uploaded_by() != actor {
                    return Err(TaskLifecycleError::NotUploader { document_id, actor });
                }
            }
        }

        let name = document.metadata().name();
        let commit = self
            .commit_with_retry(document.task_id(), |Snapshot { mut task, .. }| {
                if policy == DeletionPolicy::AssignedProfessional {
                    require_owner(&task, &actor)?;
                }
                task.touch(&*self.clock);
                let update = StatusUpdate::annotation(
                    task.id(),
                    actor,
                    format!("Document '{name}' deleted"),
                    &*self.clock,
                )
                .internal(true);
                Ok(modification(task, update).deleting(document_id))
            })
            .await?;

        let key = document_key(document.task_id(), document_id, name);
        if let Err(err) = self.blobs.delete(&key).await {
            warn!(key = %key, error = %err, "document removed but blob deletion failed");
        }
        info!(task_id = %document.task_id(), document_id = %document_id, "document deleted");
        Ok(commit.into())
    }

    async fn snapshot(&self, task_id: TaskId) -> TaskLifecycleResult<Snapshot> {
        let task = self
            .store
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::TaskNotFound(task_id))?;
        let document_count = self.store.count_documents(task_id).await?;
        Ok(Snapshot {
            task,
            document_count,
        })
    }

    async fn commit_with_retry<F>(
        &self,
        task_id: TaskId,
        mut plan: F,
    ) -> TaskLifecycleResult<TaskCommit>
    where
        F: FnMut(Snapshot) -> TaskLifecycleResult<TaskCommit> + Send,
    {
        let attempts = self.config.max_commit_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let commit = plan(self.snapshot(task_id).await?)?;
            match self.store.commit(&commit).await {
                Ok(()) => return Ok(commit),
                Err(TaskRepositoryError::VersionConflict {
                    expected, actual, ..
                }) if attempt < attempts => {
                    debug!(
                        task_id = %task_id,
                        attempt,
                        expected,
                        actual,
                        "task changed concurrently; retrying"
                    );
                }
                Err(TaskRepositoryError::VersionConflict { .. }) => {
                    warn!(task_id = %task_id, attempts, "giving up after concurrent changes");
                    return Err(TaskLifecycleError::ConcurrentModification { task_id, attempts });
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

fn accept_final(task: &Task, actor: &Actor) -> TaskLifecycleResult<()> {
    require_owner(task, actor)?;
    if task.status() != TaskStatus::Completed {
        return Err(TaskLifecycleError::NotCompleted {
            task_id: task.id(),
            status: task.status(),
        });
    }
    Ok(())
}

fn modification(mut task: Task, update: StatusUpdate) -> TaskCommit {
    let expected_version = task.version();
    task.advance_version();
    TaskCommit::modification(task, expected_version, update)
}

fn non_blank(message: Option<String>) -> Option<String> {
    message
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
