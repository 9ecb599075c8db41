//! Uploaded document records.

use super::{Actor, ActorRole, Attachment, DocumentId, TaskDomainError, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Metadata describing a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    name: String,
    mime_type: String,
    size_bytes: u64,
    url: String,
    sha256: String,
}

impl FileMetadata {
    /// Creates validated file metadata.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyFileName`] when `name` is blank.
    pub fn new(
        name: &str,
        mime_type: impl Into<String>,
        size_bytes: u64,
        url: impl Into<String>,
        sha256: impl Into<String>,
    ) -> Result<Self, TaskDomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyFileName);
        }
        Ok(Self {
            name: trimmed.to_owned(),
            mime_type: mime_type.into(),
            size_bytes,
            url: url.into(),
            sha256: sha256.into(),
        })
    }

    /// Returns the file name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the MIME type.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the size in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Returns the retrievable storage URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the hex-encoded SHA-256 digest of the content.
    #[must_use]
    pub fn sha256(&self) -> &str {
        &self.sha256
    }
}

/// A file uploaded against a task. Documents are never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    id: DocumentId,
    task_id: TaskId,
    uploaded_by: Actor,
    metadata: FileMetadata,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedDocumentData {
    /// Persisted document identifier.
    pub id: DocumentId,
    /// Owning task.
    pub task_id: TaskId,
    /// Uploading identity.
    pub uploaded_by: Actor,
    /// Stored file metadata.
    pub metadata: FileMetadata,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Records a stored file. The identifier is chosen by the caller because
    /// it is part of the storage key.
    #[must_use]
    pub fn new(
        id: DocumentId,
        task_id: TaskId,
        uploaded_by: Actor,
        metadata: FileMetadata,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id,
            task_id,
            uploaded_by,
            metadata,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a document from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedDocumentData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            uploaded_by: data.uploaded_by,
            metadata: data.metadata,
            created_at: data.created_at,
        }
    }

    /// Returns the document identifier.
    #[must_use]
    pub const fn id(&self) -> DocumentId {
        self.id
    }

    /// Returns the owning task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the uploading identity.
    #[must_use]
    pub const fn uploaded_by(&self) -> Actor {
        self.uploaded_by
    }

    /// Returns the uploading role.
    #[must_use]
    pub const fn uploaded_by_role(&self) -> ActorRole {
        self.uploaded_by.role()
    }

    /// Returns the file metadata.
    #[must_use]
    pub const fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    /// Returns the upload timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns a ledger attachment referencing this document.
    #[must_use]
    pub fn to_attachment(&self) -> Attachment {
        Attachment {
            name: self.metadata.name.clone(),
            url: self.metadata.url.clone(),
            mime_type: self.metadata.mime_type.clone(),
        }
    }
}
