//! Blob storage for uploaded files.
//!
//! The workflow only needs to store bytes and get back a retrievable URL.
//! Backends implement [`BlobStore`]; [`create_store`] picks one from
//! [`BlobStoreConfig`].

mod local;
mod memory;

pub use local::LocalBlobStore;
pub use memory::InMemoryBlobStore;

use async_trait::async_trait;
use bytes::Bytes;
use camino::Utf8PathBuf;
use sha2::{Digest, Sha256};
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by blob store backends.
#[derive(Debug, Error)]
pub enum BlobStoreError {
    /// The backend refused or failed to write the object.
    #[error("failed to store blob '{key}': {reason}")]
    Write {
        /// Object key.
        key: String,
        /// Backend-specific failure description.
        reason: String,
    },

    /// The backend failed to remove the object.
    #[error("failed to delete blob '{key}': {reason}")]
    Delete {
        /// Object key.
        key: String,
        /// Backend-specific failure description.
        reason: String,
    },

    /// The backend could not be initialised.
    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

/// Caller-supplied description of the bytes being stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMetadata {
    /// Original file name.
    pub file_name: String,
    /// MIME type of the content.
    pub content_type: String,
}

/// Location and fingerprint of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Object key inside the store.
    pub key: String,
    /// Retrievable URL.
    pub url: String,
    /// Stored size in bytes.
    pub size_bytes: u64,
    /// Hex-encoded SHA-256 digest of the content.
    pub sha256: String,
}

impl StoredBlob {
    /// Describes `data` stored under `key` and reachable at `url`.
    #[must_use]
    pub fn describe(key: &str, url: String, data: &[u8]) -> Self {
        Self {
            key: key.to_owned(),
            url,
            size_bytes: u64::try_from(data.len()).unwrap_or(u64::MAX),
            sha256: content_digest(data),
        }
    }
}

/// Store for opaque file contents keyed by string paths.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes (creates or overwrites) an object and returns where it lives.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError::Write`] when the backend cannot persist the
    /// content. No retry is attempted by the store.
    async fn store(
        &self,
        key: &str,
        data: Bytes,
        metadata: &BlobMetadata,
    ) -> Result<StoredBlob, BlobStoreError>;

    /// Removes an object. Removing an absent object is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError::Delete`] when the backend fails.
    async fn delete(&self, key: &str) -> Result<(), BlobStoreError>;
}

// -- Key helpers --

/// Returns the object key for a task document.
///
/// Path separators in the file name are replaced so the key always has
/// exactly four segments.
pub fn document_key(task_id: impl Display, document_id: impl Display, file_name: &str) -> String {
    let safe_name: String = file_name
        .trim()
        .chars()
        .map(|ch| if matches!(ch, '/' | '\\') { '_' } else { ch })
        .collect();
    format!("tasks/{task_id}/documents/{document_id}/{safe_name}")
}

/// Returns the hex-encoded SHA-256 digest of `data`.
#[must_use]
pub fn content_digest(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

// -- Configuration --

/// Configuration for the blob store backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobStoreConfig {
    /// Local directory that holds stored files. When `None` an in-memory
    /// store is used.
    pub local_dir: Option<Utf8PathBuf>,
    /// Public URL prefix for stored objects. Defaults to a `file://` URL of
    /// the local directory.
    pub base_url: Option<String>,
}

impl BlobStoreConfig {
    /// Builds the configuration from `SERVICEDESK_BLOB_DIR` and
    /// `SERVICEDESK_BLOB_BASE_URL`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            local_dir: std::env::var("SERVICEDESK_BLOB_DIR")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(Utf8PathBuf::from),
            base_url: std::env::var("SERVICEDESK_BLOB_BASE_URL")
                .ok()
                .filter(|value| !value.trim().is_empty()),
        }
    }
}

// -- Factory --

/// Creates a [`BlobStore`] from configuration.
///
/// # Errors
///
/// Returns [`BlobStoreError::Unavailable`] when the local directory cannot
/// be created or opened.
pub fn create_store(config: &BlobStoreConfig) -> Result<Arc<dyn BlobStore>, BlobStoreError> {
    match &config.local_dir {
        Some(dir) => Ok(Arc::new(LocalBlobStore::open(dir, config.base_url.clone())?)),
        None => Ok(Arc::new(InMemoryBlobStore::new())),
    }
}
