//! Role, ownership and status gating across the workflow operations.

use std::sync::Arc;

use super::helpers::{Marketplace, marketplace, pdf};
use rstest::rstest;
use servicedesk::blob::InMemoryBlobStore;
use servicedesk::task::{
    domain::{Actor, CompanyId, CustomerId, ProfessionalId, TaskId, TaskPriority, TaskStatus},
    ports::StatusLedger,
    services::{
        CreateTaskRequest, ErrorKind, StatusUpdateRequest, TaskLifecycleError, WorkflowConfig,
    },
};

async fn open(marketplace: &Marketplace, customer: CustomerId) -> eyre::Result<TaskId> {
    let change = marketplace
        .lifecycle
        .create_task(
            Actor::Customer(customer),
            CreateTaskRequest::new(marketplace.service_id, "Apostille for a diploma"),
        )
        .await?;
    Ok(change.task.id())
}

async fn open_assigned(
    marketplace: &Marketplace,
    professional: ProfessionalId,
) -> eyre::Result<TaskId> {
    let task_id = open(marketplace, CustomerId::new()).await?;
    marketplace
        .lifecycle
        .assign_task(marketplace.company_actor(), task_id, professional, None)
        .await?;
    Ok(task_id)
}

fn expect_kind<T: std::fmt::Debug>(
    result: Result<T, TaskLifecycleError>,
    expected: ErrorKind,
) -> eyre::Result<()> {
    match result {
        Err(err) => {
            eyre::ensure!(err.kind() == expected, "expected {expected}, got {err}");
            Ok(())
        }
        Ok(value) => eyre::bail!("expected {expected} error, got {value:?}"),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn customer_can_withdraw_unassigned_request(marketplace: Marketplace) -> eyre::Result<()> {
    let customer = CustomerId::new();
    let task_id = open(&marketplace, customer).await?;

    let change = marketplace
        .lifecycle
        .add_status_update(
            Actor::Customer(customer),
            StatusUpdateRequest::new(task_id, TaskStatus::Rejected)
                .with_message("No longer needed"),
        )
        .await?;

    eyre::ensure!(change.task.status() == TaskStatus::Rejected);
    eyre::ensure!(change.update.message() == "No longer needed");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn customer_cannot_withdraw_after_assignment(marketplace: Marketplace) -> eyre::Result<()> {
    let customer = CustomerId::new();
    let task_id = open(&marketplace, customer).await?;
    marketplace
        .lifecycle
        .assign_task(marketplace.company_actor(), task_id, ProfessionalId::new(), None)
        .await?;

    let result = marketplace
        .lifecycle
        .add_status_update(
            Actor::Customer(customer),
            StatusUpdateRequest::new(task_id, TaskStatus::Rejected),
        )
        .await;

    expect_kind(result, ErrorKind::InvalidState)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_tasks_accept_no_further_transitions(
    marketplace: Marketplace,
) -> eyre::Result<()> {
    let professional_id = ProfessionalId::new();
    let task_id = open_assigned(&marketplace, professional_id).await?;
    let professional = Actor::Professional(professional_id);
    marketplace
        .lifecycle
        .add_status_update(
            professional,
            StatusUpdateRequest::new(task_id, TaskStatus::Rejected),
        )
        .await?;

    let resumed = marketplace
        .lifecycle
        .add_status_update(
            professional,
            StatusUpdateRequest::new(task_id, TaskStatus::InProgress),
        )
        .await;
    expect_kind(resumed, ErrorKind::InvalidState)?;

    let reassigned = marketplace
        .lifecycle
        .assign_task(marketplace.company_actor(), task_id, ProfessionalId::new(), None)
        .await;
    expect_kind(reassigned, ErrorKind::InvalidState)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn company_cannot_complete_on_behalf_of_professional(
    marketplace: Marketplace,
) -> eyre::Result<()> {
    let task_id = open_assigned(&marketplace, ProfessionalId::new()).await?;

    let result = marketplace
        .lifecycle
        .add_status_update(
            marketplace.company_actor(),
            StatusUpdateRequest::new(task_id, TaskStatus::InProgress),
        )
        .await;

    expect_kind(result, ErrorKind::InvalidState)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn legacy_mode_lets_any_owner_move_between_statuses() -> eyre::Result<()> {
    let marketplace =
        Marketplace::build(Arc::new(InMemoryBlobStore::new()), WorkflowConfig::legacy())?;
    let task_id = open_assigned(&marketplace, ProfessionalId::new()).await?;

    let change = marketplace
        .lifecycle
        .add_status_update(
            marketplace.company_actor(),
            StatusUpdateRequest::new(task_id, TaskStatus::Completed),
        )
        .await?;

    eyre::ensure!(change.task.status() == TaskStatus::Completed);
    eyre::ensure!(change.task.completed_at().is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strangers_cannot_touch_a_task(marketplace: Marketplace) -> eyre::Result<()> {
    let task_id = open_assigned(&marketplace, ProfessionalId::new()).await?;
    let stranger_professional = Actor::Professional(ProfessionalId::new());
    let stranger_company = Actor::Company(CompanyId::new());
    let stranger_customer = Actor::Customer(CustomerId::new());

    expect_kind(
        marketplace
            .lifecycle
            .add_status_update(
                stranger_professional,
                StatusUpdateRequest::new(task_id, TaskStatus::InProgress),
            )
            .await,
        ErrorKind::Forbidden,
    )?;
    expect_kind(
        marketplace
            .lifecycle
            .add_note(stranger_customer, task_id, "Any news?", false)
            .await,
        ErrorKind::Forbidden,
    )?;
    expect_kind(
        marketplace
            .lifecycle
            .update_priority(stranger_company, task_id, TaskPriority::new(9))
            .await,
        ErrorKind::Forbidden,
    )?;
    expect_kind(
        marketplace
            .lifecycle
            .upload_company_documents(stranger_company, task_id, vec![pdf("scan.pdf")])
            .await,
        ErrorKind::Forbidden,
    )?;

    let ledger = marketplace.store.list_updates(task_id).await?;
    eyre::ensure!(ledger.len() == 2, "gated calls must not write to the ledger");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn role_restricted_operations_reject_other_roles(
    marketplace: Marketplace,
) -> eyre::Result<()> {
    let professional_id = ProfessionalId::new();
    let task_id = open_assigned(&marketplace, professional_id).await?;
    let professional = Actor::Professional(professional_id);

    expect_kind(
        marketplace
            .lifecycle
            .assign_task(professional, task_id, ProfessionalId::new(), None)
            .await,
        ErrorKind::Forbidden,
    )?;
    expect_kind(
        marketplace
            .lifecycle
            .update_priority(professional, task_id, TaskPriority::new(1))
            .await,
        ErrorKind::Forbidden,
    )?;
    expect_kind(
        marketplace
            .lifecycle
            .upload_final_documents(marketplace.company_actor(), task_id, vec![pdf("out.pdf")])
            .await,
        ErrorKind::Forbidden,
    )?;
    expect_kind(
        marketplace
            .lifecycle
            .create_task(
                marketplace.company_actor(),
                CreateTaskRequest::new(marketplace.service_id, "On behalf of a client"),
            )
            .await,
        ErrorKind::Forbidden,
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn final_documents_wait_for_completion(marketplace: Marketplace) -> eyre::Result<()> {
    let professional_id = ProfessionalId::new();
    let task_id = open_assigned(&marketplace, professional_id).await?;
    let professional = Actor::Professional(professional_id);
    marketplace
        .lifecycle
        .add_status_update(
            professional,
            StatusUpdateRequest::new(task_id, TaskStatus::InProgress),
        )
        .await?;

    let early = marketplace
        .lifecycle
        .upload_final_documents(professional, task_id, vec![pdf("draft.pdf")])
        .await;
    expect_kind(early, ErrorKind::InvalidState)?;

    marketplace
        .lifecycle
        .add_status_update(
            professional,
            StatusUpdateRequest::new(task_id, TaskStatus::Completed),
        )
        .await?;
    let delivered = marketplace
        .lifecycle
        .upload_final_documents(professional, task_id, vec![pdf("final.pdf")])
        .await?;
    eyre::ensure!(delivered.task.status() == TaskStatus::Completed);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_task_reports_not_found(marketplace: Marketplace) -> eyre::Result<()> {
    let missing = TaskId::new();

    expect_kind(
        marketplace
            .lifecycle
            .add_status_update(
                marketplace.company_actor(),
                StatusUpdateRequest::new(missing, TaskStatus::Rejected),
            )
            .await,
        ErrorKind::NotFound,
    )?;
    expect_kind(
        marketplace
            .queries
            .task_details(marketplace.company_actor(), missing)
            .await,
        ErrorKind::NotFound,
    )
}
