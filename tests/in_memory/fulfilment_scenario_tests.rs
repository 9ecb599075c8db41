//! End-to-end fulfilment of a single request.

use std::sync::Arc;

use super::helpers::{Marketplace, marketplace, pdf};
use camino::Utf8PathBuf;
use rstest::rstest;
use servicedesk::blob::{BlobStoreConfig, create_store};
use servicedesk::task::{
    domain::{Actor, ActorRole, CustomerId, ProfessionalId, TaskId, TaskStatus},
    ports::{DocumentRepository, StatusLedger, TaskRepository},
    services::{CreateTaskRequest, ErrorKind, StatusUpdateRequest, WorkflowConfig},
};

async fn ledger_len(marketplace: &Marketplace, task_id: TaskId) -> eyre::Result<usize> {
    Ok(marketplace.store.list_updates(task_id).await?.len())
}

async fn run_fulfilment(marketplace: &Marketplace) -> eyre::Result<TaskId> {
    let customer = Actor::Customer(CustomerId::new());
    let professional_id = ProfessionalId::new();
    let professional = Actor::Professional(professional_id);

    let created = marketplace
        .lifecycle
        .create_task(
            customer,
            CreateTaskRequest::new(marketplace.service_id, "Translate and notarise a lease"),
        )
        .await?;
    let task_id = created.task.id();
    eyre::ensure!(created.task.status() == TaskStatus::New);
    eyre::ensure!(ledger_len(marketplace, task_id).await? == 1);
    let first = marketplace.store.latest_update(task_id).await?;
    eyre::ensure!(first.and_then(|entry| entry.new_status()) == Some(TaskStatus::New));

    let intake = marketplace
        .lifecycle
        .upload_company_documents(
            marketplace.company_actor(),
            task_id,
            vec![pdf("lease.pdf"), pdf("annex.pdf")],
        )
        .await?;
    eyre::ensure!(intake.task.status() == TaskStatus::DocumentsUploaded);
    eyre::ensure!(marketplace.store.count_documents(task_id).await? == 2);
    eyre::ensure!(ledger_len(marketplace, task_id).await? == 2);
    eyre::ensure!(
        intake
            .uploads
            .documents
            .iter()
            .all(|document| document.uploaded_by_role() == ActorRole::Company)
    );

    let assigned = marketplace
        .lifecycle
        .assign_task(marketplace.company_actor(), task_id, professional_id, None)
        .await?;
    eyre::ensure!(assigned.task.status() == TaskStatus::Assigned);
    eyre::ensure!(assigned.task.assigned_at().is_some());
    eyre::ensure!(ledger_len(marketplace, task_id).await? == 3);

    for status in [TaskStatus::InProgress, TaskStatus::Completed] {
        marketplace
            .lifecycle
            .add_status_update(professional, StatusUpdateRequest::new(task_id, status))
            .await?;
    }
    eyre::ensure!(ledger_len(marketplace, task_id).await? == 5);
    let completed = marketplace.store.find_by_id(task_id).await?;
    eyre::ensure!(completed.as_ref().is_some_and(|task| task.completed_at().is_some()));

    let deliverables = marketplace
        .lifecycle
        .upload_final_documents(professional, task_id, vec![pdf("lease-en.pdf")])
        .await?;
    eyre::ensure!(deliverables.uploads.documents.len() == 1);
    eyre::ensure!(marketplace.store.count_documents(task_id).await? == 3);
    eyre::ensure!(ledger_len(marketplace, task_id).await? == 6);

    let again = marketplace
        .lifecycle
        .add_status_update(
            professional,
            StatusUpdateRequest::new(task_id, TaskStatus::Completed),
        )
        .await;
    match again {
        Err(err) => eyre::ensure!(err.kind() == ErrorKind::Conflict, "unexpected error {err}"),
        Ok(change) => eyre::bail!("second completion unexpectedly succeeded: {change:?}"),
    }
    eyre::ensure!(ledger_len(marketplace, task_id).await? == 6);
    Ok(task_id)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn request_is_fulfilled_end_to_end(marketplace: Marketplace) -> eyre::Result<()> {
    let task_id = run_fulfilment(&marketplace).await?;

    let ledger = marketplace.store.list_updates(task_id).await?;
    let transitions: Vec<_> = ledger
        .iter()
        .rev()
        .map(|entry| (entry.previous_status(), entry.new_status()))
        .collect();
    eyre::ensure!(
        transitions
            == vec![
                (None, Some(TaskStatus::New)),
                (Some(TaskStatus::New), Some(TaskStatus::DocumentsUploaded)),
                (Some(TaskStatus::DocumentsUploaded), Some(TaskStatus::Assigned)),
                (Some(TaskStatus::Assigned), Some(TaskStatus::InProgress)),
                (Some(TaskStatus::InProgress), Some(TaskStatus::Completed)),
                (None, None),
            ]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fulfilment_writes_files_to_local_directory() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .map_err(|path| eyre::eyre!("non UTF-8 temp path: {}", path.display()))?;
    let blobs = create_store(&BlobStoreConfig {
        local_dir: Some(root.clone()),
        base_url: Some("https://files.example".to_owned()),
    })?;
    let marketplace = Marketplace::build(Arc::clone(&blobs), WorkflowConfig::default())?;

    let task_id = run_fulfilment(&marketplace).await?;

    let documents = marketplace.store.list_documents(task_id).await?;
    eyre::ensure!(documents.len() == 3);
    for document in &documents {
        let path = root.join(format!(
            "tasks/{task_id}/documents/{}/{}",
            document.id(),
            document.metadata().name()
        ));
        eyre::ensure!(path.exists(), "missing stored file {path}");
        eyre::ensure!(document.metadata().url().starts_with("https://files.example/tasks/"));
        eyre::ensure!(document.metadata().sha256().len() == 64);
    }
    Ok(())
}
