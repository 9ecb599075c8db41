//! Read side of the task workflow: role-scoped lists and task details.

use super::{TaskLifecycleError, TaskLifecycleResult, access::require_visible};
use crate::task::{
    domain::{
        Actor, ActorRole, CompanyId, CustomerId, Document, ProfessionalId, ServiceId,
        StatusUpdate, Task, TaskId, TaskPriority, TaskStatus,
    },
    ports::{
        DocumentRepository, ServiceCatalog, ServiceSummary, StatusLedger, TaskFilter,
        TaskRepository,
    },
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

/// Largest accepted page size.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A validated page request. Pages are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl PageRequest {
    /// Validates a page request.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::InvalidPage`] when `page` is zero or
    /// `limit` is outside `1..=100`.
    pub fn new(page: u32, limit: u32) -> TaskLifecycleResult<Self> {
        if page == 0 {
            return Err(TaskLifecycleError::InvalidPage(
                "page numbers start at 1".to_owned(),
            ));
        }
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(TaskLifecycleError::InvalidPage(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}, got {limit}"
            )));
        }
        Ok(Self { page, limit })
    }

    /// Returns the 1-based page number.
    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    fn slice<T>(self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let limit = self.limit as usize;
        let offset = (self.page as usize - 1).saturating_mul(limit);
        Page {
            items: items.into_iter().skip(offset).take(limit).collect(),
            page: self.page,
            limit: self.limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub limit: u32,
    /// Items across all pages.
    pub total: usize,
    /// Number of pages.
    pub total_pages: usize,
}

/// Filters for a company's inbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyInboxQuery {
    /// Only tasks in this status.
    pub status: Option<TaskStatus>,
    /// Only tasks with this priority.
    pub priority: Option<TaskPriority>,
    /// Case-insensitive match against the service name or requirements.
    pub search: Option<String>,
    /// Page to return.
    pub page: PageRequest,
}

/// Filters for a professional's queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfessionalQueueQuery {
    /// Only tasks in this status.
    pub status: Option<TaskStatus>,
    /// Page to return.
    pub page: PageRequest,
}

/// Most recent ledger entry shown in list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatestUpdate {
    /// Entry message.
    pub message: String,
    /// Entry timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row shown in task lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    /// Task identifier.
    pub task_id: TaskId,
    /// Current status.
    pub status: TaskStatus,
    /// Current priority.
    pub priority: TaskPriority,
    /// Requested service reference.
    pub service_id: ServiceId,
    /// Catalog entry, when the catalog still knows the service.
    pub service: Option<ServiceSummary>,
    /// Requesting customer.
    pub customer: CustomerId,
    /// Fulfilling company.
    pub company: CompanyId,
    /// Assigned professional.
    pub professional: Option<ProfessionalId>,
    /// Customer requirements text.
    pub requirements: String,
    /// Attached documents.
    pub document_count: usize,
    /// Most recent ledger entry visible to the reader.
    pub latest_update: Option<LatestUpdate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Full view of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDetails {
    /// The task.
    pub task: Task,
    /// Catalog entry, when the catalog still knows the service.
    pub service: Option<ServiceSummary>,
    /// Attached documents, oldest first.
    pub documents: Vec<Document>,
    /// Ledger entries visible to the reader, newest first.
    pub updates: Vec<StatusUpdate>,
}

/// Read-only projections over tasks, ledgers and documents.
pub struct TaskQueryService<S>
where
    S: TaskRepository + StatusLedger + DocumentRepository,
{
    store: Arc<S>,
    catalog: Arc<dyn ServiceCatalog>,
}

impl<S> Clone for TaskQueryService<S>
where
    S: TaskRepository + StatusLedger + DocumentRepository,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<S> TaskQueryService<S>
where
    S: TaskRepository + StatusLedger + DocumentRepository,
{
    /// Creates a query service.
    #[must_use]
    pub fn new(store: Arc<S>, catalog: Arc<dyn ServiceCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Lists a customer's tasks, newest first. A customer without tasks
    /// gets an empty list.
    ///
    /// # Errors
    ///
    /// Returns a wrapped dependency error when a read fails.
    pub async fn customer_tasks(
        &self,
        customer: CustomerId,
    ) -> TaskLifecycleResult<Vec<TaskSummary>> {
        let mut tasks = self.store.list(TaskFilter::Customer(customer)).await?;
        sort_newest_first(&mut tasks);
        self.summarise(tasks, ActorRole::Customer).await
    }

    /// Lists a company's tasks, newest first, filtered and paginated.
    ///
    /// # Errors
    ///
    /// Returns a wrapped dependency error when a read fails.
    pub async fn company_inbox(
        &self,
        company: CompanyId,
        query: &CompanyInboxQuery,
    ) -> TaskLifecycleResult<Page<TaskSummary>> {
        let mut tasks = self.store.list(TaskFilter::Company(company)).await?;
        tasks.retain(|task| {
            query.status.is_none_or(|status| task.status() == status)
                && query.priority.is_none_or(|priority| task.priority() == priority)
        });
        sort_newest_first(&mut tasks);

        let mut summaries = self.summarise(tasks, ActorRole::Company).await?;
        if let Some(needle) = query
            .search
            .as_deref()
            .map(|search| search.trim().to_lowercase())
            .filter(|search| !search.is_empty())
        {
            summaries.retain(|summary| matches_search(summary, &needle));
        }
        Ok(query.page.slice(summaries))
    }

    /// Lists a professional's assigned tasks by priority (highest first),
    /// then newest first, paginated.
    ///
    /// # Errors
    ///
    /// Returns a wrapped dependency error when a read fails.
    pub async fn professional_queue(
        &self,
        professional: ProfessionalId,
        query: &ProfessionalQueueQuery,
    ) -> TaskLifecycleResult<Page<TaskSummary>> {
        let mut tasks = self
            .store
            .list(TaskFilter::Professional(professional))
            .await?;
        tasks.retain(|task| query.status.is_none_or(|status| task.status() == status));
        tasks.sort_by_key(|task| {
            (
                Reverse(task.priority()),
                Reverse(task.created_at()),
                task.id(),
            )
        });
        let summaries = self.summarise(tasks, ActorRole::Professional).await?;
        Ok(query.page.slice(summaries))
    }

    /// Returns a task with its documents and the ledger entries the caller
    /// may see.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task does not
    /// exist or the caller holds no reference on it.
    pub async fn task_details(
        &self,
        actor: Actor,
        task_id: TaskId,
    ) -> TaskLifecycleResult<TaskDetails> {
        let task = self.visible_task(&actor, task_id).await?;
        let service = self.catalog.get(task.service()).await?;
        let documents = self.store.list_documents(task_id).await?;
        let updates = self.visible_updates(task_id, actor.role()).await?;
        Ok(TaskDetails {
            task,
            service,
            documents,
            updates,
        })
    }

    /// Returns the ledger entries the caller may see, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] when the task does not
    /// exist or the caller holds no reference on it.
    pub async fn task_updates(
        &self,
        actor: Actor,
        task_id: TaskId,
    ) -> TaskLifecycleResult<Vec<StatusUpdate>> {
        self.visible_task(&actor, task_id).await?;
        self.visible_updates(task_id, actor.role()).await
    }

    async fn visible_task(&self, actor: &Actor, task_id: TaskId) -> TaskLifecycleResult<Task> {
        let task = self
            .store
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::TaskNotFound(task_id))?;
        require_visible(task, actor)
    }

    async fn visible_updates(
        &self,
        task_id: TaskId,
        role: ActorRole,
    ) -> TaskLifecycleResult<Vec<StatusUpdate>> {
        let mut updates = self.store.list_updates(task_id).await?;
        updates.retain(|update| update.is_visible_to(role));
        Ok(updates)
    }

    async fn latest_visible(
        &self,
        task_id: TaskId,
        role: ActorRole,
    ) -> TaskLifecycleResult<Option<StatusUpdate>> {
        if role == ActorRole::Customer {
            return Ok(self.visible_updates(task_id, role).await?.into_iter().next());
        }
        Ok(self.store.latest_update(task_id).await?)
    }

    async fn summarise(
        &self,
        tasks: Vec<Task>,
        role: ActorRole,
    ) -> TaskLifecycleResult<Vec<TaskSummary>> {
        let mut services: HashMap<ServiceId, Option<ServiceSummary>> = HashMap::new();
        let mut summaries = Vec::with_capacity(tasks.len());
        for task in tasks {
            let service = match services.get(&task.service()) {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = self.catalog.get(task.service()).await?;
                    services.insert(task.service(), fetched.clone());
                    fetched
                }
            };
            let document_count = self.store.count_documents(task.id()).await?;
            let latest_update = self
                .latest_visible(task.id(), role)
                .await?
                .map(|update| LatestUpdate {
                    message: update.message().to_owned(),
                    created_at: update.created_at(),
                });
            summaries.push(TaskSummary {
                task_id: task.id(),
                status: task.status(),
                priority: task.priority(),
                service_id: task.service(),
                service,
                customer: task.customer(),
                company: task.company(),
                professional: task.professional(),
                requirements: task.requirements().to_owned(),
                document_count,
                latest_update,
                created_at: task.created_at(),
                updated_at: task.updated_at(),
            });
        }
        Ok(summaries)
    }
}

fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| (Reverse(task.created_at()), task.id()));
}

fn matches_search(summary: &TaskSummary, needle: &str) -> bool {
    summary.requirements.to_lowercase().contains(needle)
        || summary
            .service
            .as_ref()
            .is_some_and(|service| service.name.to_lowercase().contains(needle))
}
