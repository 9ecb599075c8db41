//! Filesystem blob store scoped to a single directory capability.

use super::{BlobMetadata, BlobStore, BlobStoreError, StoredBlob};
use async_trait::async_trait;
use bytes::Bytes;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io;
use std::sync::Arc;

/// Blob store writing beneath one base directory.
///
/// All access goes through a `cap-std` directory handle, so keys cannot
/// escape the base directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    dir: Arc<Dir>,
    base_url: String,
}

impl LocalBlobStore {
    /// Opens (creating if needed) the base directory.
    ///
    /// # Errors
    ///
    /// Returns [`BlobStoreError::Unavailable`] when the directory cannot be
    /// created or opened.
    pub fn open(base_dir: &Utf8Path, base_url: Option<String>) -> Result<Self, BlobStoreError> {
        Dir::create_ambient_dir_all(base_dir, ambient_authority())
            .map_err(|err| BlobStoreError::Unavailable(format!("create {base_dir}: {err}")))?;
        let dir = Dir::open_ambient_dir(base_dir, ambient_authority())
            .map_err(|err| BlobStoreError::Unavailable(format!("open {base_dir}: {err}")))?;
        let base_url = base_url
            .unwrap_or_else(|| format!("file://{base_dir}"))
            .trim_end_matches('/')
            .to_owned();
        Ok(Self {
            dir: Arc::new(dir),
            base_url,
        })
    }

    /// Returns the URL prefix used for stored objects.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn run_blocking<F, T>(&self, f: F) -> io::Result<T>
    where
        F: FnOnce(&Dir) -> io::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || f(&dir))
            .await
            .map_err(io::Error::other)?
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(
        &self,
        key: &str,
        data: Bytes,
        _metadata: &BlobMetadata,
    ) -> Result<StoredBlob, BlobStoreError> {
        let path = Utf8PathBuf::from(key);
        let payload = data.clone();
        self.run_blocking(move |dir| {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
                dir.create_dir_all(parent)?;
            }
            dir.write(&path, &payload)
        })
        .await
        .map_err(|err| BlobStoreError::Write {
            key: key.to_owned(),
            reason: err.to_string(),
        })?;

        let url = format!("{}/{key}", self.base_url);
        Ok(StoredBlob::describe(key, url, &data))
    }

    async fn delete(&self, key: &str) -> Result<(), BlobStoreError> {
        let path = Utf8PathBuf::from(key);
        self.run_blocking(move |dir| match dir.remove_file(&path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        })
        .await
        .map_err(|err| BlobStoreError::Delete {
            key: key.to_owned(),
            reason: err.to_string(),
        })
    }
}
