//! Internal ledger entries and role-scoped reads.

use super::helpers::{Marketplace, marketplace, pdf};
use rstest::rstest;
use servicedesk::task::{
    domain::{Actor, CustomerId, ProfessionalId, TaskId, TaskPriority, TaskStatus},
    services::{
        CompanyInboxQuery, CreateTaskRequest, ErrorKind, PageRequest, ProfessionalQueueQuery,
        StatusUpdateRequest,
    },
};

struct Fixture {
    customer: CustomerId,
    professional: ProfessionalId,
    task_id: TaskId,
}

/// Opens a task, assigns it and adds one public and one internal note.
async fn annotated_task(marketplace: &Marketplace) -> eyre::Result<Fixture> {
    let customer = CustomerId::new();
    let professional = ProfessionalId::new();
    let created = marketplace
        .lifecycle
        .create_task(
            Actor::Customer(customer),
            CreateTaskRequest::new(marketplace.service_id, "Certified copy of a deed"),
        )
        .await?;
    let task_id = created.task.id();
    marketplace
        .lifecycle
        .assign_task(marketplace.company_actor(), task_id, professional, None)
        .await?;
    marketplace
        .lifecycle
        .add_note(
            Actor::Professional(professional),
            task_id,
            "Registry office contacted",
            false,
        )
        .await?;
    marketplace
        .lifecycle
        .add_note(
            marketplace.company_actor(),
            task_id,
            "Customer paid late last time",
            true,
        )
        .await?;
    Ok(Fixture {
        customer,
        professional,
        task_id,
    })
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn customer_history_omits_internal_entries(marketplace: Marketplace) -> eyre::Result<()> {
    let fixture = annotated_task(&marketplace).await?;

    let customer_view = marketplace
        .queries
        .task_updates(Actor::Customer(fixture.customer), fixture.task_id)
        .await?;
    let professional_view = marketplace
        .queries
        .task_updates(Actor::Professional(fixture.professional), fixture.task_id)
        .await?;

    eyre::ensure!(customer_view.len() == 3);
    eyre::ensure!(customer_view.iter().all(|entry| !entry.is_internal()));
    eyre::ensure!(professional_view.len() == 4);
    eyre::ensure!(
        professional_view
            .first()
            .is_some_and(|entry| entry.message() == "Customer paid late last time")
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn internal_status_change_still_moves_the_task(marketplace: Marketplace) -> eyre::Result<()> {
    let fixture = annotated_task(&marketplace).await?;
    marketplace
        .lifecycle
        .add_status_update(
            Actor::Professional(fixture.professional),
            StatusUpdateRequest::new(fixture.task_id, TaskStatus::InProgress)
                .with_message("Started, waiting on registry")
                .internal(true),
        )
        .await?;

    let details = marketplace
        .queries
        .task_details(Actor::Customer(fixture.customer), fixture.task_id)
        .await?;

    eyre::ensure!(details.task.status() == TaskStatus::InProgress);
    eyre::ensure!(
        details
            .updates
            .iter()
            .all(|entry| entry.message() != "Started, waiting on registry")
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_views_show_the_latest_entry_the_reader_may_see(
    marketplace: Marketplace,
) -> eyre::Result<()> {
    let fixture = annotated_task(&marketplace).await?;

    let customer_list = marketplace.queries.customer_tasks(fixture.customer).await?;
    let inbox = marketplace
        .queries
        .company_inbox(marketplace.company, &CompanyInboxQuery::default())
        .await?;

    let customer_latest = customer_list
        .first()
        .and_then(|summary| summary.latest_update.as_ref())
        .map(|latest| latest.message.as_str());
    let company_latest = inbox
        .items
        .first()
        .and_then(|summary| summary.latest_update.as_ref())
        .map(|latest| latest.message.as_str());
    eyre::ensure!(customer_latest == Some("Registry office contacted"));
    eyre::ensure!(company_latest == Some("Customer paid late last time"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_details_carry_documents_and_service(marketplace: Marketplace) -> eyre::Result<()> {
    let customer = CustomerId::new();
    let created = marketplace
        .lifecycle
        .create_task(
            Actor::Customer(customer),
            CreateTaskRequest::new(marketplace.service_id, "Two scans attached")
                .with_files([pdf("front.pdf"), pdf("back.pdf")]),
        )
        .await?;

    let details = marketplace
        .queries
        .task_details(Actor::Customer(customer), created.task.id())
        .await?;

    eyre::ensure!(details.task.status() == TaskStatus::DocumentsUploaded);
    eyre::ensure!(details.documents.len() == 2);
    eyre::ensure!(
        details
            .service
            .as_ref()
            .is_some_and(|service| service.name == "Notarised translation")
    );
    eyre::ensure!(
        details
            .updates
            .first()
            .is_some_and(|entry| entry.attachments().len() == 2)
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn each_role_only_lists_its_own_tasks(marketplace: Marketplace) -> eyre::Result<()> {
    let mine = annotated_task(&marketplace).await?;
    let theirs = annotated_task(&marketplace).await?;

    let customer_list = marketplace.queries.customer_tasks(mine.customer).await?;
    eyre::ensure!(customer_list.len() == 1);
    eyre::ensure!(
        customer_list
            .first()
            .is_some_and(|summary| summary.task_id == mine.task_id)
    );

    let queue = marketplace
        .queries
        .professional_queue(theirs.professional, &ProfessionalQueueQuery::default())
        .await?;
    eyre::ensure!(queue.total == 1);
    eyre::ensure!(
        queue
            .items
            .first()
            .is_some_and(|summary| summary.task_id == theirs.task_id)
    );

    let inbox = marketplace
        .queries
        .company_inbox(marketplace.company, &CompanyInboxQuery::default())
        .await?;
    eyre::ensure!(inbox.total == 2);

    let foreign = marketplace
        .queries
        .task_details(Actor::Professional(mine.professional), theirs.task_id)
        .await;
    match foreign {
        Err(err) => eyre::ensure!(err.kind() == ErrorKind::NotFound),
        Ok(details) => eyre::bail!("foreign task leaked: {:?}", details.task.id()),
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inbox_orders_and_filters_by_priority(marketplace: Marketplace) -> eyre::Result<()> {
    annotated_task(&marketplace).await?;
    let high = annotated_task(&marketplace).await?;
    marketplace
        .lifecycle
        .update_priority(marketplace.company_actor(), high.task_id, TaskPriority::new(5))
        .await?;

    let urgent = marketplace
        .queries
        .company_inbox(
            marketplace.company,
            &CompanyInboxQuery {
                priority: Some(TaskPriority::new(5)),
                page: PageRequest::new(1, 1)?,
                ..CompanyInboxQuery::default()
            },
        )
        .await?;
    eyre::ensure!(urgent.total == 1);
    eyre::ensure!(urgent.total_pages == 1);
    eyre::ensure!(
        urgent
            .items
            .first()
            .is_some_and(|summary| summary.task_id == high.task_id)
    );

    let customer_view = marketplace.queries.customer_tasks(high.customer).await?;
    eyre::ensure!(
        customer_view
            .first()
            .and_then(|summary| summary.latest_update.as_ref())
            .is_some_and(|latest| latest.message == "Registry office contacted"),
        "priority annotations stay internal"
    );
    Ok(())
}
