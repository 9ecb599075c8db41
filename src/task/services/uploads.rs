//! Upload validation and best-effort fan-out to the blob store.

use super::{TaskLifecycleError, TaskLifecycleResult, config::UploadPolicy};
use crate::blob::{BlobMetadata, BlobStore, document_key};
use crate::task::domain::{Actor, Attachment, Document, DocumentId, FileMetadata, TaskId};
use bytes::Bytes;
use futures::future::join_all;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A file supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Original file name.
    pub name: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// File contents.
    pub data: Bytes,
}

impl FileUpload {
    /// Creates an upload from its parts.
    #[must_use]
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    fn size_bytes(&self) -> u64 {
        u64::try_from(self.data.len()).unwrap_or(u64::MAX)
    }
}

/// A file that could not be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFailure {
    /// Name of the file as supplied.
    pub file_name: String,
    /// Why it failed.
    pub reason: String,
}

/// Result of a fan-out upload: what was stored and what was not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Documents whose content was stored.
    pub documents: Vec<Document>,
    /// Files that failed to store.
    pub failures: Vec<UploadFailure>,
}

impl UploadOutcome {
    /// Returns ledger attachments for the stored documents.
    #[must_use]
    pub fn attachments(&self) -> Vec<Attachment> {
        self.documents.iter().map(Document::to_attachment).collect()
    }

    /// Returns the object keys of the stored documents.
    pub(crate) fn blob_keys(&self) -> impl Iterator<Item = String> + '_ {
        self.documents.iter().map(|document| {
            document_key(document.task_id(), document.id(), document.metadata().name())
        })
    }
}

/// Checks a batch against `policy` before anything is written.
pub(crate) fn validate_batch(policy: &UploadPolicy, files: &[FileUpload]) -> TaskLifecycleResult<()> {
    if files.len() > policy.max_files {
        return Err(TaskLifecycleError::InvalidUpload(format!(
            "{} files supplied, at most {} allowed",
            files.len(),
            policy.max_files
        )));
    }
    for file in files {
        if file.name.trim().is_empty() {
            return Err(TaskLifecycleError::InvalidUpload(
                "file name must not be empty".to_owned(),
            ));
        }
        if file.size_bytes() > policy.max_file_bytes {
            return Err(TaskLifecycleError::InvalidUpload(format!(
                "'{}' is {} bytes, at most {} allowed",
                file.name,
                file.size_bytes(),
                policy.max_file_bytes
            )));
        }
        if !policy.accepts_mime_type(&file.mime_type) {
            return Err(TaskLifecycleError::InvalidUpload(format!(
                "'{}' has unsupported type {}",
                file.name, file.mime_type
            )));
        }
    }
    Ok(())
}

/// Rejects an empty batch on operations whose only purpose is uploading.
pub(crate) fn require_files(files: &[FileUpload]) -> TaskLifecycleResult<()> {
    if files.is_empty() {
        return Err(TaskLifecycleError::InvalidUpload(
            "at least one file is required".to_owned(),
        ));
    }
    Ok(())
}

/// Stores every file concurrently. A failing file does not abort the others.
pub(crate) async fn upload_all<B, C>(
    blobs: &B,
    task_id: TaskId,
    uploaded_by: Actor,
    files: Vec<FileUpload>,
    clock: &C,
) -> UploadOutcome
where
    B: BlobStore + ?Sized,
    C: Clock + Send + Sync,
{
    let results = join_all(
        files
            .into_iter()
            .map(|file| upload_one(blobs, task_id, uploaded_by, file, clock)),
    )
    .await;

    let mut outcome = UploadOutcome::default();
    for result in results {
        match result {
            Ok(document) => outcome.documents.push(document),
            Err(failure) => outcome.failures.push(failure),
        }
    }
    outcome
}

async fn upload_one<B, C>(
    blobs: &B,
    task_id: TaskId,
    uploaded_by: Actor,
    file: FileUpload,
    clock: &C,
) -> Result<Document, UploadFailure>
where
    B: BlobStore + ?Sized,
    C: Clock + Send + Sync,
{
    let document_id = DocumentId::new();
    let key = document_key(task_id, document_id, &file.name);
    let blob_metadata = BlobMetadata {
        file_name: file.name.clone(),
        content_type: file.mime_type.clone(),
    };

    let stored = match blobs.store(&key, file.data, &blob_metadata).await {
        Ok(stored) => stored,
        Err(err) => {
            warn!(task_id = %task_id, file = %file.name, error = %err, "upload failed");
            return Err(UploadFailure {
                file_name: file.name,
                reason: err.to_string(),
            });
        }
    };
    debug!(task_id = %task_id, key = %stored.key, bytes = stored.size_bytes, "stored upload");

    let metadata = FileMetadata::new(
        &file.name,
        file.mime_type,
        stored.size_bytes,
        stored.url,
        stored.sha256,
    )
    .map_err(|err| UploadFailure {
        file_name: file.name.clone(),
        reason: err.to_string(),
    })?;
    Ok(Document::new(document_id, task_id, uploaded_by, metadata, clock))
}

/// Removes blobs whose metadata never reached the store.
pub(crate) async fn discard_blobs<B>(blobs: &B, keys: impl IntoIterator<Item = String>)
where
    B: BlobStore + ?Sized,
{
    for key in keys {
        if let Err(err) = blobs.delete(&key).await {
            warn!(key = %key, error = %err, "failed to discard orphaned blob");
        }
    }
}
