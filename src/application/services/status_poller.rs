use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::application::ports::ConversionApi;
use crate::domain::{TaskId, TaskStatus};

use super::TaskLifecycle;

pub const DEFAULT_SUCCESS_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_FAILURE_DELAY: Duration = Duration::from_secs(5);

/// Delays between status checks. Failed checks are retried without limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub success_delay: Duration,
    pub failure_delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            success_delay: DEFAULT_SUCCESS_DELAY,
            failure_delay: DEFAULT_FAILURE_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Stop,
    Reschedule(Duration),
}

/// Polls `GET /status/{id}` for one task until it reaches a terminal state.
pub struct StatusPoller {
    lifecycle: Arc<TaskLifecycle>,
    api: Arc<dyn ConversionApi>,
    policy: PollPolicy,
}

impl StatusPoller {
    pub fn new(lifecycle: Arc<TaskLifecycle>, api: Arc<dyn ConversionApi>, policy: PollPolicy) -> Self {
        Self {
            lifecycle,
            api,
            policy,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// One tick: check the local record, query the backend, apply the result.
    pub async fn poll_once(&self, id: &TaskId) -> PollOutcome {
        match self.lifecycle.find(id).await {
            Some(task) if task.status.is_active() => {}
            Some(task) => {
                tracing::debug!(status = %task.status, "Task already finished, polling stopped");
                return PollOutcome::Stop;
            }
            None => {
                tracing::debug!("Task no longer stored, polling stopped");
                return PollOutcome::Stop;
            }
        }

        let report = match self.api.status(id).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    retry_in = ?self.policy.failure_delay,
                    "Status check failed"
                );
                return PollOutcome::Reschedule(self.policy.failure_delay);
            }
        };

        tracing::debug!(state = %report.state, "Status received");

        if let Some(status) = report.state.local_status() {
            let result_filename = match status {
                TaskStatus::Success => report.filename.as_deref(),
                _ => None,
            };
            if let Err(e) = self
                .lifecycle
                .update_status(id, status, result_filename)
                .await
            {
                tracing::warn!(error = %e, "Failed to record task status");
                return PollOutcome::Reschedule(self.policy.failure_delay);
            }
        }

        if report.state.is_terminal() {
            tracing::info!(state = %report.state, "Task finished");
            PollOutcome::Stop
        } else {
            PollOutcome::Reschedule(self.policy.success_delay)
        }
    }

    pub async fn run(&self, id: TaskId) {
        loop {
            match self.poll_once(&id).await {
                PollOutcome::Stop => break,
                PollOutcome::Reschedule(delay) => tokio::time::sleep(delay).await,
            }
        }
    }
}

/// Owns at most one running poller per task id.
pub struct PollerSupervisor {
    poller: Arc<StatusPoller>,
    handles: Mutex<HashMap<TaskId, JoinHandle<()>>>,
}

impl PollerSupervisor {
    pub fn new(poller: Arc<StatusPoller>) -> Self {
        Self {
            poller,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Spawns a poller for `id` unless one is still running. Must be called
    /// from within a tokio runtime. Returns whether a poller was spawned.
    pub fn ensure_polling(&self, id: &TaskId) -> bool {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|_, handle| !handle.is_finished());
        if handles.contains_key(id) {
            return false;
        }

        let poller = Arc::clone(&self.poller);
        let task_id = id.clone();
        let span = tracing::info_span!("status_poller", task_id = %id);
        let handle = tokio::spawn(async move { poller.run(task_id).await }.instrument(span));
        handles.insert(id.clone(), handle);
        true
    }

    /// Aborts the poller for `id`, if any.
    pub fn stop(&self, id: &TaskId) -> bool {
        let handle = self
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        match handle {
            Some(handle) => {
                handle.abort();
                tracing::debug!(task_id = %id, "Poller stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_polling(&self, id: &TaskId) -> bool {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .is_some_and(|h| !h.is_finished())
    }

    pub fn active_count(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|h| !h.is_finished())
            .count()
    }

    pub fn shutdown(&self) {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, handle) in handles.drain() {
            handle.abort();
        }
    }
}

impl Drop for PollerSupervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
