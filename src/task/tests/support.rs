//! Shared wiring for service-level unit tests.

use std::sync::Arc;

use crate::blob::{BlobStore, InMemoryBlobStore};
use crate::task::{
    adapters::memory::{InMemoryCompanyDirectory, InMemoryServiceCatalog, InMemoryTaskStore},
    domain::{Actor, CompanyId, CustomerId, ProfessionalId, ServiceId, Task, TaskStatus},
    services::{
        CreateTaskRequest, FileUpload, StatusUpdateRequest, TaskLifecycleService,
        TaskQueryService, WorkflowConfig,
    },
};
use mockable::DefaultClock;

pub(super) type Lifecycle<B> = TaskLifecycleService<InMemoryTaskStore, B, DefaultClock>;

/// In-memory collaborators plus one registered service and company.
pub(super) struct Harness<B: BlobStore + ?Sized = InMemoryBlobStore> {
    pub store: Arc<InMemoryTaskStore>,
    pub blobs: Arc<B>,
    pub service_id: ServiceId,
    pub company: CompanyId,
    pub lifecycle: Lifecycle<B>,
    pub queries: TaskQueryService<InMemoryTaskStore>,
}

impl Harness<InMemoryBlobStore> {
    pub fn new() -> eyre::Result<Self> {
        Self::with_config(WorkflowConfig::default())
    }

    pub fn with_config(config: WorkflowConfig) -> eyre::Result<Self> {
        Harness::with_blobs(Arc::new(InMemoryBlobStore::new()), config)
    }
}

impl<B: BlobStore + ?Sized> Harness<B> {
    pub fn with_blobs(blobs: Arc<B>, config: WorkflowConfig) -> eyre::Result<Self> {
        Self::with_store(Arc::new(InMemoryTaskStore::new()), blobs, config)
    }

    pub fn with_store(
        store: Arc<InMemoryTaskStore>,
        blobs: Arc<B>,
        config: WorkflowConfig,
    ) -> eyre::Result<Self> {
        let catalog = Arc::new(InMemoryServiceCatalog::new());
        let companies = Arc::new(InMemoryCompanyDirectory::new());
        let service = catalog.add("Certified translation", "Legal")?;
        let company = CompanyId::new();
        companies.register(company)?;

        let lifecycle = TaskLifecycleService::new(
            Arc::clone(&store),
            Arc::clone(&blobs),
            catalog.clone(),
            companies,
            Arc::new(DefaultClock),
        )
        .with_config(config);
        let queries = TaskQueryService::new(Arc::clone(&store), catalog);
        Ok(Self {
            store,
            blobs,
            service_id: service.id,
            company,
            lifecycle,
            queries,
        })
    }

    pub const fn company_actor(&self) -> Actor {
        Actor::Company(self.company)
    }

    pub async fn open_task(&self, customer: CustomerId) -> eyre::Result<Task> {
        let created = self
            .lifecycle
            .create_task(
                Actor::Customer(customer),
                CreateTaskRequest::new(self.service_id, "Translate my birth certificate"),
            )
            .await?;
        Ok(created.task)
    }

    /// Opens a task and walks it to `ASSIGNED` for `professional`.
    pub async fn assigned_task(
        &self,
        customer: CustomerId,
        professional: ProfessionalId,
    ) -> eyre::Result<Task> {
        let task = self.open_task(customer).await?;
        let change = self
            .lifecycle
            .assign_task(self.company_actor(), task.id(), professional, None)
            .await?;
        Ok(change.task)
    }

    /// Opens a task and walks it to `COMPLETED` for `professional`.
    pub async fn completed_task(
        &self,
        customer: CustomerId,
        professional: ProfessionalId,
    ) -> eyre::Result<Task> {
        let task = self.assigned_task(customer, professional).await?;
        let actor = Actor::Professional(professional);
        self.lifecycle
            .add_status_update(
                actor,
                StatusUpdateRequest::new(task.id(), TaskStatus::InProgress),
            )
            .await?;
        let change = self
            .lifecycle
            .add_status_update(actor, StatusUpdateRequest::new(task.id(), TaskStatus::Completed))
            .await?;
        Ok(change.task)
    }
}

pub(super) fn pdf(name: &str) -> FileUpload {
    FileUpload::new(name, "application/pdf", format!("%PDF {name}").into_bytes())
}
