use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use audiobook_queue::application::ports::{ConversionApi, ConversionApiError};
use audiobook_queue::application::services::{
    ActionMode, DEFAULT_STORAGE_KEY, PollPolicy, QueueService, QueueView, TaskStore,
};
use audiobook_queue::domain::{RemoteState, StatusReport, TaskId, TaskStatus};
use audiobook_queue::infrastructure::console::AutoConfirm;
use audiobook_queue::infrastructure::storage::InMemoryKeyValueStore;
use audiobook_queue::presentation::watch_until_idle;

/// Reports every job as finished on the first status check.
struct FinishedBackend;

#[async_trait::async_trait]
impl ConversionApi for FinishedBackend {
    async fn upload(&self, _filename: &str, _data: Bytes) -> Result<TaskId, ConversionApiError> {
        Ok(TaskId::new("unused"))
    }

    async fn status(&self, _id: &TaskId) -> Result<StatusReport, ConversionApiError> {
        Ok(StatusReport {
            state: RemoteState::Success,
            filename: Some("a.mp3".to_string()),
        })
    }

    async fn cancel(&self, _id: &TaskId) -> Result<(), ConversionApiError> {
        Ok(())
    }

    async fn delete(&self, _filename: &str) -> Result<(), ConversionApiError> {
        Ok(())
    }

    async fn download(&self, _filename: &str) -> Result<Bytes, ConversionApiError> {
        Ok(Bytes::new())
    }
}

fn service_with_pending_task() -> QueueService {
    let backend = Arc::new(InMemoryKeyValueStore::with_entry(
        DEFAULT_STORAGE_KEY,
        r#"[{"id":"a","filename":"a.pdf","status":"PENDING","date":"2024-05-01T10:00:00Z"}]"#,
    ));
    let store = Arc::new(TaskStore::new(backend, DEFAULT_STORAGE_KEY));
    QueueService::new(
        store,
        Arc::new(FinishedBackend),
        Arc::new(AutoConfirm),
        PollPolicy::default(),
        ActionMode::Optimistic,
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn given_job_finishing_during_startup_when_watching_then_returns_with_final_view() {
    for _ in 0..20 {
        let service = service_with_pending_task();
        let mut emitted: Vec<QueueView> = Vec::new();

        let watched = tokio::time::timeout(
            Duration::from_secs(5),
            watch_until_idle(&service, std::future::pending(), |view| {
                emitted.push(view.clone())
            }),
        )
        .await;

        assert!(watched.is_ok(), "watch kept waiting after the job finished");
        let last = emitted.last().unwrap();
        assert!(!last.has_active());
        assert_eq!(last.completed[0].status, TaskStatus::Success);
        service.shutdown().await;
    }
}

#[tokio::test]
async fn given_interrupt_when_watching_active_queue_then_returns() {
    let service = service_with_pending_task();
    let mut emitted = 0usize;

    watch_until_idle(&service, async {}, |_| emitted += 1).await;

    assert!(emitted >= 1);
    service.shutdown().await;
}
