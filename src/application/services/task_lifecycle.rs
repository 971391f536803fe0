use std::sync::Arc;

use crate::domain::{Task, TaskId, TaskStatus};

use super::task_store::{TaskStore, TaskStoreError};

/// Creates, updates and removes task records. Operations on an id that is
/// no longer stored are no-ops.
pub struct TaskLifecycle {
    store: Arc<TaskStore>,
}

impl TaskLifecycle {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    pub async fn find(&self, id: &TaskId) -> Option<Task> {
        self.store.load().await.into_iter().find(|t| &t.id == id)
    }

    /// Prepends a PENDING record. A stale record with the same id is replaced
    /// so ids stay unique.
    pub async fn add_task(&self, filename: &str, id: TaskId) -> Result<Task, TaskStoreError> {
        let task = Task::new(id, filename.to_string());
        let record = task.clone();

        self.store
            .modify(move |tasks| {
                tasks.retain(|t| t.id != record.id);
                tasks.insert(0, record);
                true
            })
            .await?;

        tracing::info!(task_id = %task.id, filename = %task.filename, "Task added");
        Ok(task)
    }

    /// Sets the status of `id`. A result filename also becomes the display name.
    /// Returns whether the record existed.
    pub async fn update_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        result_filename: Option<&str>,
    ) -> Result<bool, TaskStoreError> {
        let result_filename = result_filename
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        let updated = self
            .store
            .modify(|tasks| {
                let Some(task) = tasks.iter_mut().find(|t| &t.id == id) else {
                    return false;
                };
                task.status = status;
                if let Some(result) = result_filename {
                    task.filename = result.clone();
                    task.result_filename = Some(result);
                }
                true
            })
            .await?;

        if updated {
            tracing::debug!(task_id = %id, status = %status, "Task status updated");
        } else {
            tracing::debug!(task_id = %id, status = %status, "Status update for unknown task ignored");
        }
        Ok(updated)
    }

    /// Returns whether a record was removed.
    pub async fn remove_task(&self, id: &TaskId) -> Result<bool, TaskStoreError> {
        let removed = self
            .store
            .modify(|tasks| {
                let before = tasks.len();
                tasks.retain(|t| &t.id != id);
                tasks.len() != before
            })
            .await?;

        if removed {
            tracing::info!(task_id = %id, "Task removed");
        }
        Ok(removed)
    }
}
