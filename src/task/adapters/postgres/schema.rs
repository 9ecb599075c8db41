//! Diesel schema for task workflow persistence.

diesel::table! {
    /// Task aggregates.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Requesting customer.
        customer_id -> Uuid,
        /// Requested catalog service.
        service_id -> Uuid,
        /// Fulfilling company.
        company_id -> Uuid,
        /// Assigned professional.
        professional_id -> Nullable<Uuid>,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Company-set priority.
        priority -> Int4,
        /// Customer requirements text.
        requirements -> Text,
        /// First assignment timestamp.
        assigned_at -> Nullable<Timestamptz>,
        /// First completion timestamp.
        completed_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Optimistic concurrency token.
        version -> Int8,
    }
}

diesel::table! {
    /// Append-only status ledger.
    task_updates (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Insertion order, used to break timestamp ties.
        seq -> Int8,
        /// Owning task.
        task_id -> Uuid,
        /// Status before the transition.
        #[max_length = 50]
        previous_status -> Nullable<Varchar>,
        /// Status after the transition.
        #[max_length = 50]
        new_status -> Nullable<Varchar>,
        /// Role of the acting identity.
        #[max_length = 50]
        actor_role -> Varchar,
        /// Acting identity.
        actor_id -> Uuid,
        /// Hidden from customers.
        is_internal -> Bool,
        /// Entry message.
        message -> Text,
        /// Attached file references.
        attachments -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Uploaded documents.
    documents (id) {
        /// Document identifier.
        id -> Uuid,
        /// Owning task.
        task_id -> Uuid,
        /// Role of the uploading identity.
        #[max_length = 50]
        uploaded_by_role -> Varchar,
        /// Uploading identity.
        uploaded_by_id -> Uuid,
        /// File name.
        name -> Text,
        /// MIME type.
        #[max_length = 255]
        mime_type -> Varchar,
        /// Size in bytes.
        size_bytes -> Int8,
        /// Retrievable storage URL.
        url -> Text,
        /// Hex-encoded SHA-256 digest.
        #[max_length = 64]
        sha256 -> Varchar,
        /// Upload timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(task_updates -> tasks (task_id));
diesel::joinable!(documents -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, task_updates, documents);
