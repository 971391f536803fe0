mod queue_renderer;
mod queue_service;
mod status_poller;
mod task_lifecycle;
mod task_store;

pub use queue_renderer::{
    ACTIVE_LABEL, ActiveRow, CompletedRow, QueueRenderer, QueueView, RowAction, delete_target,
    render_queues,
};
pub use queue_service::{
    ActionMode, ActionOutcome, CANCEL_PROMPT, CLEAR_PROMPT, DELETE_PROMPT, DownloadError,
    QueueService, UploadError,
};
pub use status_poller::{
    DEFAULT_FAILURE_DELAY, DEFAULT_SUCCESS_DELAY, PollOutcome, PollPolicy, PollerSupervisor,
    StatusPoller,
};
pub use task_lifecycle::TaskLifecycle;
pub use task_store::{DEFAULT_STORAGE_KEY, QueueObserver, TaskStore, TaskStoreError};
