//! In-memory task store backing the repository, ledger and document ports.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{Document, DocumentId, StatusUpdate, Task, TaskId},
    ports::{
        DocumentRepository, StatusLedger, TaskCommit, TaskFilter, TaskRepository,
        TaskRepositoryError, TaskRepositoryResult,
    },
};

/// Thread-safe in-memory store.
///
/// A single lock guards tasks, ledger entries and documents, so every
/// [`TaskCommit`] is applied atomically.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    ledger: HashMap<TaskId, Vec<StatusUpdate>>,
    documents: HashMap<DocumentId, Document>,
    document_index: HashMap<TaskId, Vec<DocumentId>>,
}

impl InMemoryTaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<std::sync::RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<std::sync::RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

/// Checks every precondition of a commit before anything is written.
fn validate_commit(state: &InMemoryTaskState, commit: &TaskCommit) -> TaskRepositoryResult<()> {
    let task_id = commit.task.id();
    match (commit.expected_version, state.tasks.get(&task_id)) {
        (None, Some(_)) => return Err(TaskRepositoryError::DuplicateTask(task_id)),
        (Some(_), None) => return Err(TaskRepositoryError::NotFound(task_id)),
        (Some(expected), Some(stored)) if stored.version() != expected => {
            return Err(TaskRepositoryError::VersionConflict {
                task_id,
                expected,
                actual: stored.version(),
            });
        }
        _ => {}
    }

    if let Some(document_id) = commit.deleted_document {
        let belongs_to_task = state
            .documents
            .get(&document_id)
            .is_some_and(|document| document.task_id() == task_id);
        if !belongs_to_task {
            return Err(TaskRepositoryError::DocumentNotFound {
                task_id,
                document_id,
            });
        }
    }
    Ok(())
}

fn remove_document(state: &mut InMemoryTaskState, task_id: TaskId, document_id: DocumentId) {
    state.documents.remove(&document_id);
    if let Some(ids) = state.document_index.get_mut(&task_id) {
        ids.retain(|id| *id != document_id);
        if ids.is_empty() {
            state.document_index.remove(&task_id);
        }
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskStore {
    async fn commit(&self, commit: &TaskCommit) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        validate_commit(&state, commit)?;

        let task_id = commit.task.id();
        if let Some(document_id) = commit.deleted_document {
            remove_document(&mut state, task_id, document_id);
        }
        for document in &commit.new_documents {
            state
                .document_index
                .entry(task_id)
                .or_default()
                .push(document.id());
            state.documents.insert(document.id(), document.clone());
        }
        state
            .ledger
            .entry(task_id)
            .or_default()
            .push(commit.update.clone());
        state.tasks.insert(task_id, commit.task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn list(&self, filter: TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state
            .tasks
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StatusLedger for InMemoryTaskStore {
    async fn latest_update(&self, task_id: TaskId) -> TaskRepositoryResult<Option<StatusUpdate>> {
        let state = self.read()?;
        Ok(state
            .ledger
            .get(&task_id)
            .and_then(|entries| entries.last())
            .cloned())
    }

    async fn list_updates(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<StatusUpdate>> {
        let state = self.read()?;
        Ok(state
            .ledger
            .get(&task_id)
            .map(|entries| entries.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl DocumentRepository for InMemoryTaskStore {
    async fn find_document(&self, id: DocumentId) -> TaskRepositoryResult<Option<Document>> {
        Ok(self.read()?.documents.get(&id).cloned())
    }

    async fn list_documents(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Document>> {
        let state = self.read()?;
        Ok(state
            .document_index
            .get(&task_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.documents.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count_documents(&self, task_id: TaskId) -> TaskRepositoryResult<usize> {
        Ok(self
            .read()?
            .document_index
            .get(&task_id)
            .map_or(0, Vec::len))
    }
}
