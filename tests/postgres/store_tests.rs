//! Commit, version check and ledger read tests for `PostgresTaskStore`.

use super::helpers::{TestSchema, clock, new_task, pg};
use mockable::DefaultClock;
use rstest::rstest;
use servicedesk::task::{
    domain::{
        Actor, ActorRole, Document, DocumentId, FileMetadata, ProfessionalId, StatusUpdate,
        TaskId, TaskStatus, TransitionPolicy,
    },
    ports::{
        DocumentRepository, StatusLedger, TaskCommit, TaskFilter, TaskRepository,
        TaskRepositoryError,
    },
};

fn sample_document(task_id: TaskId, actor: Actor, clock: &DefaultClock) -> eyre::Result<Document> {
    let metadata = FileMetadata::new(
        "passport.pdf",
        "application/pdf",
        2048,
        "https://files.example/passport.pdf",
        "0".repeat(64),
    )?;
    Ok(Document::new(DocumentId::new(), task_id, actor, metadata, clock))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creation_commit_round_trips(
    pg: eyre::Result<Option<TestSchema>>,
    clock: DefaultClock,
) -> eyre::Result<()> {
    let Some(schema) = pg? else {
        return Ok(());
    };
    let (task, update) = new_task(&clock);
    schema
        .store
        .commit(&TaskCommit::creation(task.clone(), update.clone()))
        .await?;

    let stored = schema
        .store
        .find_by_id(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("task {} not stored", task.id()))?;
    eyre::ensure!(stored.customer() == task.customer());
    eyre::ensure!(stored.status() == TaskStatus::New);
    eyre::ensure!(stored.version() == 0);
    eyre::ensure!(stored.requirements() == task.requirements());

    let ledger = schema.store.list_updates(task.id()).await?;
    eyre::ensure!(ledger.len() == 1);
    eyre::ensure!(ledger.first().map(StatusUpdate::id) == Some(update.id()));
    eyre::ensure!(ledger.first().and_then(StatusUpdate::previous_status).is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_creation_is_rejected(
    pg: eyre::Result<Option<TestSchema>>,
    clock: DefaultClock,
) -> eyre::Result<()> {
    let Some(schema) = pg? else {
        return Ok(());
    };
    let (task, update) = new_task(&clock);
    let commit = TaskCommit::creation(task.clone(), update);
    schema.store.commit(&commit).await?;

    let again = schema.store.commit(&commit).await;
    eyre::ensure!(
        matches!(again, Err(TaskRepositoryError::DuplicateTask(id)) if id == task.id()),
        "expected duplicate error, got {again:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_version_is_rejected_without_side_effects(
    pg: eyre::Result<Option<TestSchema>>,
    clock: DefaultClock,
) -> eyre::Result<()> {
    let Some(schema) = pg? else {
        return Ok(());
    };
    let (task, update) = new_task(&clock);
    schema
        .store
        .commit(&TaskCommit::creation(task.clone(), update))
        .await?;

    let mut assigned = task.clone();
    let previous = assigned.assign(ProfessionalId::new(), TransitionPolicy::Strict, &clock)?;
    assigned.advance_version();
    let entry = StatusUpdate::transition(
        task.id(),
        Some(previous),
        TaskStatus::Assigned,
        Actor::Company(task.company()),
        "Assigned",
        &clock,
    );
    schema
        .store
        .commit(&TaskCommit::modification(assigned.clone(), 0, entry))
        .await?;

    let note = StatusUpdate::note(task.id(), Actor::Company(task.company()), "late", &clock)?;
    let stale = schema
        .store
        .commit(&TaskCommit::modification(task.clone(), 0, note))
        .await;
    eyre::ensure!(
        matches!(
            stale,
            Err(TaskRepositoryError::VersionConflict { expected: 0, actual: 1, .. })
        ),
        "expected version conflict, got {stale:?}"
    );

    let stored = schema.store.find_by_id(task.id()).await?;
    eyre::ensure!(stored.as_ref().map(|row| row.status()) == Some(TaskStatus::Assigned));
    eyre::ensure!(stored.as_ref().map(|row| row.version()) == Some(1));
    eyre::ensure!(schema.store.list_updates(task.id()).await?.len() == 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn modifying_a_missing_task_reports_not_found(
    pg: eyre::Result<Option<TestSchema>>,
    clock: DefaultClock,
) -> eyre::Result<()> {
    let Some(schema) = pg? else {
        return Ok(());
    };
    let (task, update) = new_task(&clock);

    let result = schema
        .store
        .commit(&TaskCommit::modification(task.clone(), 0, update))
        .await;
    eyre::ensure!(
        matches!(result, Err(TaskRepositoryError::NotFound(id)) if id == task.id()),
        "expected not found, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn documents_are_inserted_and_deleted_with_the_commit(
    pg: eyre::Result<Option<TestSchema>>,
    clock: DefaultClock,
) -> eyre::Result<()> {
    let Some(schema) = pg? else {
        return Ok(());
    };
    let (task, update) = new_task(&clock);
    let uploader = Actor::Customer(task.customer());
    let document = sample_document(task.id(), uploader, &clock)?;
    schema
        .store
        .commit(&TaskCommit::creation(task.clone(), update).with_documents([document.clone()]))
        .await?;

    eyre::ensure!(schema.store.count_documents(task.id()).await? == 1);
    let found = schema
        .store
        .find_document(document.id())
        .await?
        .ok_or_else(|| eyre::eyre!("document not stored"))?;
    eyre::ensure!(found.uploaded_by_role() == ActorRole::Customer);
    eyre::ensure!(found.metadata() == document.metadata());

    let mut touched = task.clone();
    touched.touch(&clock);
    touched.advance_version();
    let audit = StatusUpdate::annotation(task.id(), uploader, "Document deleted", &clock)
        .internal(true);
    schema
        .store
        .commit(&TaskCommit::modification(touched, 0, audit).deleting(document.id()))
        .await?;

    eyre::ensure!(schema.store.count_documents(task.id()).await? == 0);
    eyre::ensure!(schema.store.find_document(document.id()).await?.is_none());
    let latest = schema.store.latest_update(task.id()).await?;
    eyre::ensure!(latest.as_ref().is_some_and(StatusUpdate::is_internal));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_an_unknown_document_rolls_back(
    pg: eyre::Result<Option<TestSchema>>,
    clock: DefaultClock,
) -> eyre::Result<()> {
    let Some(schema) = pg? else {
        return Ok(());
    };
    let (task, update) = new_task(&clock);
    schema
        .store
        .commit(&TaskCommit::creation(task.clone(), update))
        .await?;

    let mut touched = task.clone();
    touched.advance_version();
    let audit = StatusUpdate::annotation(
        task.id(),
        Actor::Company(task.company()),
        "Document deleted",
        &clock,
    );
    let result = schema
        .store
        .commit(&TaskCommit::modification(touched, 0, audit).deleting(DocumentId::new()))
        .await;

    eyre::ensure!(
        matches!(result, Err(TaskRepositoryError::DocumentNotFound { .. })),
        "expected missing document, got {result:?}"
    );
    let stored = schema.store.find_by_id(task.id()).await?;
    eyre::ensure!(stored.map(|row| row.version()) == Some(0));
    eyre::ensure!(schema.store.list_updates(task.id()).await?.len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_scopes_tasks_by_role(
    pg: eyre::Result<Option<TestSchema>>,
    clock: DefaultClock,
) -> eyre::Result<()> {
    let Some(schema) = pg? else {
        return Ok(());
    };
    let (first, first_update) = new_task(&clock);
    let (second, second_update) = new_task(&clock);
    for commit in [
        TaskCommit::creation(first.clone(), first_update),
        TaskCommit::creation(second.clone(), second_update),
    ] {
        schema.store.commit(&commit).await?;
    }

    let by_customer = schema
        .store
        .list(TaskFilter::Customer(first.customer()))
        .await?;
    let by_company = schema
        .store
        .list(TaskFilter::Company(second.company()))
        .await?;
    let by_professional = schema
        .store
        .list(TaskFilter::Professional(ProfessionalId::new()))
        .await?;

    eyre::ensure!(by_customer.iter().map(|task| task.id()).eq([first.id()]));
    eyre::ensure!(by_company.iter().map(|task| task.id()).eq([second.id()]));
    eyre::ensure!(by_professional.is_empty());
    Ok(())
}
