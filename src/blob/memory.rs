//! In-memory blob store for tests and single-process deployments.

use super::{BlobMetadata, BlobStore, BlobStoreError, StoredBlob};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory blob store.
///
/// File names registered with [`InMemoryBlobStore::fail_on`] are rejected,
/// which lets callers exercise partial upload failures.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobStore {
    state: Arc<RwLock<InMemoryBlobState>>,
}

#[derive(Debug, Default)]
struct InMemoryBlobState {
    objects: HashMap<String, Bytes>,
    failing_names: HashSet<String>,
}

impl InMemoryBlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every future write of `file_name` fail.
    #[must_use]
    pub fn fail_on(self, file_name: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.failing_names.insert(file_name.into());
        }
        self
    }

    /// Returns the stored bytes for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.objects.get(key).cloned())
    }

    /// Returns the number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().map_or(0, |state| state.objects.len())
    }

    /// Returns whether the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned(key: &str, err: &impl std::fmt::Display) -> BlobStoreError {
    BlobStoreError::Write {
        key: key.to_owned(),
        reason: err.to_string(),
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn store(
        &self,
        key: &str,
        data: Bytes,
        metadata: &BlobMetadata,
    ) -> Result<StoredBlob, BlobStoreError> {
        let mut state = self.state.write().map_err(|err| poisoned(key, &err))?;
        if state.failing_names.contains(&metadata.file_name) {
            return Err(BlobStoreError::Write {
                key: key.to_owned(),
                reason: format!("rejected file '{}'", metadata.file_name),
            });
        }
        let stored = StoredBlob::describe(key, format!("memory://{key}"), &data);
        state.objects.insert(key.to_owned(), data);
        Ok(stored)
    }

    async fn delete(&self, key: &str) -> Result<(), BlobStoreError> {
        let mut state = self.state.write().map_err(|err| BlobStoreError::Delete {
            key: key.to_owned(),
            reason: err.to_string(),
        })?;
        state.objects.remove(key);
        Ok(())
    }
}
