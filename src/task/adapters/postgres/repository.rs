//! `PostgreSQL` store implementing the task, ledger and document ports.

use super::{
    models::{DocumentRow, NewStatusUpdateRow, StatusUpdateRow, TaskRow},
    schema::{documents, task_updates, tasks},
};
use crate::task::{
    domain::{
        Actor, ActorRole, Attachment, CompanyId, CustomerId, Document, DocumentId, FileMetadata,
        PersistedDocumentData, PersistedStatusUpdateData, PersistedTaskData, ProfessionalId,
        ServiceId, StatusUpdate, StatusUpdateId, Task, TaskId, TaskPriority, TaskStatus,
    },
    ports::{
        DocumentRepository, StatusLedger, TaskCommit, TaskFilter, TaskRepository,
        TaskRepositoryError, TaskRepositoryResult,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed store for tasks, their ledger and their documents.
#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    pool: TaskPgPool,
}

impl PostgresTaskStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskStore {
    async fn commit(&self, commit: &TaskCommit) -> TaskRepositoryResult<()> {
        let task_id = commit.task.id();
        let expected_version = commit.expected_version;
        let deleted_document = commit.deleted_document;
        let task_row = task_to_row(&commit.task)?;
        let update_row = update_to_row(&commit.update)?;
        let document_rows = commit
            .new_documents
            .iter()
            .map(document_to_row)
            .collect::<TaskRepositoryResult<Vec<_>>>()?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                match expected_version {
                    None => insert_task(tx, &task_row, task_id)?,
                    Some(expected) => update_task(tx, &task_row, task_id, expected)?,
                }
                if let Some(document_id) = deleted_document {
                    delete_document(tx, task_id, document_id)?;
                }
                if !document_rows.is_empty() {
                    diesel::insert_into(documents::table)
                        .values(&document_rows)
                        .execute(tx)?;
                }
                diesel::insert_into(task_updates::table)
                    .values(&update_row)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list(&self, filter: TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = match filter {
                TaskFilter::Customer(id) => tasks::table
                    .filter(tasks::customer_id.eq(id.into_inner()))
                    .select(TaskRow::as_select())
                    .load::<TaskRow>(connection)?,
                TaskFilter::Company(id) => tasks::table
                    .filter(tasks::company_id.eq(id.into_inner()))
                    .select(TaskRow::as_select())
                    .load::<TaskRow>(connection)?,
                TaskFilter::Professional(id) => tasks::table
                    .filter(tasks::professional_id.eq(id.into_inner()))
                    .select(TaskRow::as_select())
                    .load::<TaskRow>(connection)?,
            };
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }
}

#[async_trait]
impl StatusLedger for PostgresTaskStore {
    async fn latest_update(&self, task_id: TaskId) -> TaskRepositoryResult<Option<StatusUpdate>> {
        self.run_blocking(move |connection| {
            let row = task_updates::table
                .filter(task_updates::task_id.eq(task_id.into_inner()))
                .order((task_updates::created_at.desc(), task_updates::seq.desc()))
                .select(StatusUpdateRow::as_select())
                .first::<StatusUpdateRow>(connection)
                .optional()?;
            row.map(row_to_update).transpose()
        })
        .await
    }

    async fn list_updates(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<StatusUpdate>> {
        self.run_blocking(move |connection| {
            task_updates::table
                .filter(task_updates::task_id.eq(task_id.into_inner()))
                .order((task_updates::created_at.desc(), task_updates::seq.desc()))
                .select(StatusUpdateRow::as_select())
                .load::<StatusUpdateRow>(connection)?
                .into_iter()
                .map(row_to_update)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl DocumentRepository for PostgresTaskStore {
    async fn find_document(&self, id: DocumentId) -> TaskRepositoryResult<Option<Document>> {
        self.run_blocking(move |connection| {
            let row = documents::table
                .filter(documents::id.eq(id.into_inner()))
                .select(DocumentRow::as_select())
                .first::<DocumentRow>(connection)
                .optional()?;
            row.map(row_to_document).transpose()
        })
        .await
    }

    async fn list_documents(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Document>> {
        self.run_blocking(move |connection| {
            documents::table
                .filter(documents::task_id.eq(task_id.into_inner()))
                .order((documents::created_at.asc(), documents::id.asc()))
                .select(DocumentRow::as_select())
                .load::<DocumentRow>(connection)?
                .into_iter()
                .map(row_to_document)
                .collect()
        })
        .await
    }

    async fn count_documents(&self, task_id: TaskId) -> TaskRepositoryResult<usize> {
        self.run_blocking(move |connection| {
            let count = documents::table
                .filter(documents::task_id.eq(task_id.into_inner()))
                .count()
                .get_result::<i64>(connection)?;
            usize::try_from(count).map_err(TaskRepositoryError::persistence)
        })
        .await
    }
}

fn insert_task(
    connection: &mut PgConnection,
    row: &TaskRow,
    task_id: TaskId,
) -> TaskRepositoryResult<()> {
    diesel::insert_into(tasks::table)
        .values(row)
        .execute(connection)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                TaskRepositoryError::DuplicateTask(task_id)
            }
            _ => TaskRepositoryError::persistence(err),
        })?;
    Ok(())
}

fn update_task(
    connection: &mut PgConnection,
    row: &TaskRow,
    task_id: TaskId,
    expected: u64,
) -> TaskRepositoryResult<()> {
    let expected_db = version_to_db(expected)?;
    let updated = diesel::update(
        tasks::table
            .filter(tasks::id.eq(task_id.into_inner()))
            .filter(tasks::version.eq(expected_db)),
    )
    .set(row)
    .execute(connection)?;
    if updated > 0 {
        return Ok(());
    }

    let stored = tasks::table
        .filter(tasks::id.eq(task_id.into_inner()))
        .select(tasks::version)
        .first::<i64>(connection)
        .optional()?;
    match stored {
        None => Err(TaskRepositoryError::NotFound(task_id)),
        Some(actual) => Err(TaskRepositoryError::VersionConflict {
            task_id,
            expected,
            actual: version_from_db(actual)?,
        }),
    }
}

fn delete_document(
    connection: &mut PgConnection,
    task_id: TaskId,
    document_id: DocumentId,
) -> TaskRepositoryResult<()> {
    let deleted = diesel::delete(
        documents::table
            .filter(documents::id.eq(document_id.into_inner()))
            .filter(documents::task_id.eq(task_id.into_inner())),
    )
    .execute(connection)?;
    if deleted == 0 {
        return Err(TaskRepositoryError::DocumentNotFound {
            task_id,
            document_id,
        });
    }
    Ok(())
}

fn version_to_db(version: u64) -> TaskRepositoryResult<i64> {
    i64::try_from(version).map_err(TaskRepositoryError::persistence)
}

fn version_from_db(version: i64) -> TaskRepositoryResult<u64> {
    u64::try_from(version).map_err(TaskRepositoryError::persistence)
}

fn parse_status(value: &str) -> TaskRepositoryResult<TaskStatus> {
    TaskStatus::try_from(value).map_err(TaskRepositoryError::persistence)
}

fn parse_actor(role: &str, id: uuid::Uuid) -> TaskRepositoryResult<Actor> {
    let parsed = ActorRole::try_from(role).map_err(TaskRepositoryError::persistence)?;
    Ok(Actor::from_parts(parsed, id))
}

fn task_to_row(task: &Task) -> TaskRepositoryResult<TaskRow> {
    Ok(TaskRow {
        id: task.id().into_inner(),
        customer_id: task.customer().into_inner(),
        service_id: task.service().into_inner(),
        company_id: task.company().into_inner(),
        professional_id: task.professional().map(ProfessionalId::into_inner),
        status: task.status().as_str().to_owned(),
        priority: task.priority().value(),
        requirements: task.requirements().to_owned(),
        assigned_at: task.assigned_at(),
        completed_at: task.completed_at(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
        version: version_to_db(task.version())?,
    })
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        customer: CustomerId::from_uuid(row.customer_id),
        service: ServiceId::from_uuid(row.service_id),
        company: CompanyId::from_uuid(row.company_id),
        professional: row.professional_id.map(ProfessionalId::from_uuid),
        status: parse_status(&row.status)?,
        priority: TaskPriority::new(row.priority),
        requirements: row.requirements,
        assigned_at: row.assigned_at,
        completed_at: row.completed_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
        version: version_from_db(row.version)?,
    }))
}

fn update_to_row(update: &StatusUpdate) -> TaskRepositoryResult<NewStatusUpdateRow> {
    let attachments =
        serde_json::to_value(update.attachments()).map_err(TaskRepositoryError::persistence)?;
    Ok(NewStatusUpdateRow {
        id: update.id().into_inner(),
        task_id: update.task_id().into_inner(),
        previous_status: update.previous_status().map(|status| status.as_str().to_owned()),
        new_status: update.new_status().map(|status| status.as_str().to_owned()),
        actor_role: update.role().as_str().to_owned(),
        actor_id: update.actor().id(),
        is_internal: update.is_internal(),
        message: update.message().to_owned(),
        attachments,
        created_at: update.created_at(),
    })
}

fn row_to_update(row: StatusUpdateRow) -> TaskRepositoryResult<StatusUpdate> {
    let attachments = serde_json::from_value::<Vec<Attachment>>(row.attachments)
        .map_err(TaskRepositoryError::persistence)?;
    Ok(StatusUpdate::from_persisted(PersistedStatusUpdateData {
        id: StatusUpdateId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        previous_status: row.previous_status.as_deref().map(parse_status).transpose()?,
        new_status: row.new_status.as_deref().map(parse_status).transpose()?,
        actor: parse_actor(&row.actor_role, row.actor_id)?,
        is_internal: row.is_internal,
        message: row.message,
        attachments,
        created_at: row.created_at,
    }))
}

fn document_to_row(document: &Document) -> TaskRepositoryResult<DocumentRow> {
    let metadata = document.metadata();
    Ok(DocumentRow {
        id: document.id().into_inner(),
        task_id: document.task_id().into_inner(),
        uploaded_by_role: document.uploaded_by_role().as_str().to_owned(),
        uploaded_by_id: document.uploaded_by().id(),
        name: metadata.name().to_owned(),
        mime_type: metadata.mime_type().to_owned(),
        size_bytes: i64::try_from(metadata.size_bytes())
            .map_err(TaskRepositoryError::persistence)?,
        url: metadata.url().to_owned(),
        sha256: metadata.sha256().to_owned(),
        created_at: document.created_at(),
    })
}

fn row_to_document(row: DocumentRow) -> TaskRepositoryResult<Document> {
    let size_bytes = u64::try_from(row.size_bytes).map_err(TaskRepositoryError::persistence)?;
    let metadata = FileMetadata::new(&row.name, row.mime_type, size_bytes, row.url, row.sha256)
        .map_err(TaskRepositoryError::persistence)?;
    Ok(Document::from_persisted(PersistedDocumentData {
        id: DocumentId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        uploaded_by: parse_actor(&row.uploaded_by_role, row.uploaded_by_id)?,
        metadata,
        created_at: row.created_at,
    }))
}
