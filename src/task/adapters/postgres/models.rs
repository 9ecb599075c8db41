//! Diesel row models for task workflow persistence.

use super::schema::{documents, task_updates, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

/// Row in `tasks`, used for reads, inserts and full-row updates.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: Uuid,
    /// Requesting customer.
    pub customer_id: Uuid,
    /// Requested catalog service.
    pub service_id: Uuid,
    /// Fulfilling company.
    pub company_id: Uuid,
    /// Assigned professional.
    pub professional_id: Option<Uuid>,
    /// Lifecycle status.
    pub status: String,
    /// Company-set priority.
    pub priority: i32,
    /// Customer requirements text.
    pub requirements: String,
    /// First assignment timestamp.
    pub assigned_at: Option<DateTime<Utc>>,
    /// First completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token.
    pub version: i64,
}

/// Query result row for ledger entries.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_updates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StatusUpdateRow {
    /// Entry identifier.
    pub id: Uuid,
    /// Owning task.
    pub task_id: Uuid,
    /// Status before the transition.
    pub previous_status: Option<String>,
    /// Status after the transition.
    pub new_status: Option<String>,
    /// Role of the acting identity.
    pub actor_role: String,
    /// Acting identity.
    pub actor_id: Uuid,
    /// Hidden from customers.
    pub is_internal: bool,
    /// Entry message.
    pub message: String,
    /// Attached file references.
    pub attachments: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for ledger entries. `seq` is assigned by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_updates)]
pub struct NewStatusUpdateRow {
    /// Entry identifier.
    pub id: Uuid,
    /// Owning task.
    pub task_id: Uuid,
    /// Status before the transition.
    pub previous_status: Option<String>,
    /// Status after the transition.
    pub new_status: Option<String>,
    /// Role of the acting identity.
    pub actor_role: String,
    /// Acting identity.
    pub actor_id: Uuid,
    /// Hidden from customers.
    pub is_internal: bool,
    /// Entry message.
    pub message: String,
    /// Attached file references.
    pub attachments: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row in `documents`.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentRow {
    /// Document identifier.
    pub id: Uuid,
    /// Owning task.
    pub task_id: Uuid,
    /// Role of the uploading identity.
    pub uploaded_by_role: String,
    /// Uploading identity.
    pub uploaded_by_id: Uuid,
    /// File name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// Retrievable storage URL.
    pub url: String,
    /// Hex-encoded SHA-256 digest.
    pub sha256: String,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}
