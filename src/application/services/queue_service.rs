use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::application::ports::{Confirmation, ConversionApi, ConversionApiError};
use crate::domain::{Task, TaskId, TaskStatus};

use super::queue_renderer::{QueueRenderer, QueueView, delete_target, render_queues};
use super::status_poller::{PollPolicy, PollerSupervisor, StatusPoller};
use super::task_lifecycle::TaskLifecycle;
use super::task_store::{QueueObserver, TaskStore, TaskStoreError};

pub const CANCEL_PROMPT: &str = "Stop this conversion?";
pub const DELETE_PROMPT: &str = "Delete this audiobook?";
pub const CLEAR_PROMPT: &str = "Clear entire history?";

/// Placeholder some legacy records carry instead of a filename.
const MISSING_FILENAME_PLACEHOLDER: &str = "undefined";

/// How cancel and delete treat the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActionMode {
    /// Update local state at once and send the request in the background.
    #[default]
    Optimistic,
    /// Update local state only after the backend accepted the request.
    AwaitServer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    Declined,
    Rejected(String),
}

/// Wires the store, lifecycle, pollers and renderer together and exposes the
/// user-facing actions.
pub struct QueueService {
    store: Arc<TaskStore>,
    lifecycle: Arc<TaskLifecycle>,
    supervisor: Arc<PollerSupervisor>,
    renderer: Arc<QueueRenderer>,
    api: Arc<dyn ConversionApi>,
    confirmation: Arc<dyn Confirmation>,
    mode: ActionMode,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl QueueService {
    pub fn new(
        store: Arc<TaskStore>,
        api: Arc<dyn ConversionApi>,
        confirmation: Arc<dyn Confirmation>,
        policy: PollPolicy,
        mode: ActionMode,
    ) -> Self {
        let lifecycle = Arc::new(TaskLifecycle::new(Arc::clone(&store)));
        let poller = Arc::new(StatusPoller::new(
            Arc::clone(&lifecycle),
            Arc::clone(&api),
            policy,
        ));
        let supervisor = Arc::new(PollerSupervisor::new(poller));
        let renderer = Arc::new(QueueRenderer::new(Arc::clone(&supervisor)));

        let observer: Arc<dyn QueueObserver> = renderer.clone();
        store.subscribe(Arc::downgrade(&observer));

        Self {
            store,
            lifecycle,
            supervisor,
            renderer,
            api,
            confirmation,
            mode,
            background: Mutex::new(Vec::new()),
        }
    }

    pub fn lifecycle(&self) -> &Arc<TaskLifecycle> {
        &self.lifecycle
    }

    pub fn supervisor(&self) -> &Arc<PollerSupervisor> {
        &self.supervisor
    }

    pub fn subscribe(&self) -> watch::Receiver<QueueView> {
        self.renderer.subscribe()
    }

    /// Repairs legacy records. Failures are logged and otherwise ignored.
    pub async fn migrate(&self) {
        if let Err(e) = self.store.migrate().await {
            tracing::warn!(error = %e, "Task migration failed");
        }
    }

    /// Migrates, then renders once so polling resumes for every active task.
    pub async fn start(&self) -> QueueView {
        self.migrate().await;
        let tasks = self.store.load().await;
        self.renderer.render(&tasks)
    }

    /// Projection of the stored tasks without touching pollers.
    pub async fn snapshot(&self) -> QueueView {
        render_queues(&self.store.load().await)
    }

    pub async fn upload(&self, filename: &str, data: Bytes) -> Result<Task, UploadError> {
        tracing::info!(filename = %filename, bytes = data.len(), "Uploading file");
        let id = self.api.upload(filename, data).await?;
        let task = self.lifecycle.add_task(filename, id).await?;
        self.supervisor.ensure_polling(&task.id);
        Ok(task)
    }

    pub async fn cancel_task(&self, id: &TaskId) -> Result<ActionOutcome, TaskStoreError> {
        if !self.confirmation.confirm(CANCEL_PROMPT).await {
            return Ok(ActionOutcome::Declined);
        }

        match self.mode {
            ActionMode::Optimistic => {
                let api = Arc::clone(&self.api);
                let task_id = id.clone();
                self.spawn_background(async move {
                    if let Err(e) = api.cancel(&task_id).await {
                        tracing::warn!(error = %e, task_id = %task_id, "Cancel request failed");
                    }
                });
            }
            ActionMode::AwaitServer => {
                if let Err(e) = self.api.cancel(id).await {
                    tracing::warn!(error = %e, task_id = %id, "Cancel rejected by backend");
                    return Ok(ActionOutcome::Rejected(e.to_string()));
                }
            }
        }

        self.lifecycle
            .update_status(id, TaskStatus::Cancelled, None)
            .await?;
        self.supervisor.stop(id);
        Ok(ActionOutcome::Applied)
    }

    /// Removes the record and asks the backend to delete `filename`, unless
    /// the filename is missing or the legacy placeholder.
    pub async fn delete_task(
        &self,
        id: &TaskId,
        filename: Option<&str>,
    ) -> Result<ActionOutcome, TaskStoreError> {
        if !self.confirmation.confirm(DELETE_PROMPT).await {
            return Ok(ActionOutcome::Declined);
        }

        let remote = filename
            .filter(|f| !f.is_empty() && *f != MISSING_FILENAME_PLACEHOLDER)
            .map(str::to_string);

        match self.mode {
            ActionMode::Optimistic => {
                self.lifecycle.remove_task(id).await?;
                self.supervisor.stop(id);
                if let Some(filename) = remote {
                    let api = Arc::clone(&self.api);
                    self.spawn_background(async move {
                        if let Err(e) = api.delete(&filename).await {
                            tracing::warn!(error = %e, filename = %filename, "Failed to delete file on server");
                        }
                    });
                }
            }
            ActionMode::AwaitServer => {
                if let Some(filename) = remote {
                    if let Err(e) = self.api.delete(&filename).await {
                        tracing::warn!(error = %e, filename = %filename, "Delete rejected by backend");
                        return Ok(ActionOutcome::Rejected(e.to_string()));
                    }
                }
                self.lifecycle.remove_task(id).await?;
                self.supervisor.stop(id);
            }
        }

        Ok(ActionOutcome::Applied)
    }

    /// Deletes by id, deriving the server-side filename the way the queue rows do.
    pub async fn delete_by_id(&self, id: &TaskId) -> Result<ActionOutcome, TaskStoreError> {
        let filename = self
            .lifecycle
            .find(id)
            .await
            .and_then(|task| delete_target(&task));
        self.delete_task(id, filename.as_deref()).await
    }

    pub async fn clear_history(&self) -> Result<ActionOutcome, TaskStoreError> {
        if !self.confirmation.confirm(CLEAR_PROMPT).await {
            return Ok(ActionOutcome::Declined);
        }
        self.store.clear().await?;
        self.supervisor.shutdown();
        Ok(ActionOutcome::Applied)
    }

    /// Fetches the output of a finished task into `dir` and returns the written path.
    pub async fn download(&self, id: &TaskId, dir: &Path) -> Result<PathBuf, DownloadError> {
        let task = self
            .lifecycle
            .find(id)
            .await
            .ok_or_else(|| DownloadError::NotFound(id.clone()))?;

        let result = match (&task.status, &task.result_filename) {
            (TaskStatus::Success, Some(result)) => result.clone(),
            _ => return Err(DownloadError::NotReady(id.clone())),
        };

        let data = self.api.download(&result).await?;

        let local_name = Path::new(&result)
            .file_name()
            .map(PathBuf::from)
            .ok_or_else(|| DownloadError::InvalidFilename(result.clone()))?;
        tokio::fs::create_dir_all(dir).await?;
        let target = dir.join(local_name);
        tokio::fs::write(&target, &data).await?;

        tracing::info!(task_id = %id, path = %target.display(), bytes = data.len(), "Download saved");
        Ok(target)
    }

    /// Waits for background requests, then stops every poller.
    pub async fn shutdown(&self) {
        let pending: Vec<JoinHandle<()>> = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for result in futures::future::join_all(pending).await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Background request did not complete");
            }
        }
        self.supervisor.shutdown();
    }

    fn spawn_background<F>(&self, request: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut background = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        background.retain(|h| !h.is_finished());
        background.push(tokio::spawn(request));
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload failed: {0}")]
    Api(#[from] ConversionApiError),
    #[error("could not record task: {0}")]
    Store(#[from] TaskStoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("task {0} has no finished output")]
    NotReady(TaskId),
    #[error("invalid output filename: {0}")]
    InvalidFilename(String),
    #[error("download failed: {0}")]
    Api(#[from] ConversionApiError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
