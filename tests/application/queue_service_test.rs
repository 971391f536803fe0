use std::sync::Arc;

use bytes::Bytes;

use audiobook_queue::application::services::{
    ActionMode, ActionOutcome, CANCEL_PROMPT, CLEAR_PROMPT, DELETE_PROMPT, DownloadError,
    PollPolicy, QueueService, TaskStore, UploadError,
};
use audiobook_queue::domain::{TaskId, TaskStatus};

use crate::support::{
    FixedConfirmation, ScriptedConversionApi, create_seeded_store, create_test_store, finished,
    task,
};

struct Fixture {
    store: Arc<TaskStore>,
    api: Arc<ScriptedConversionApi>,
    confirmation: Arc<FixedConfirmation>,
    service: QueueService,
}

fn fixture_with(
    store: Arc<TaskStore>,
    api: ScriptedConversionApi,
    confirmation: FixedConfirmation,
    mode: ActionMode,
) -> Fixture {
    let api = Arc::new(api);
    let confirmation = Arc::new(confirmation);
    let service = QueueService::new(
        Arc::clone(&store),
        api.clone(),
        confirmation.clone(),
        PollPolicy::default(),
        mode,
    );
    Fixture {
        store,
        api,
        confirmation,
        service,
    }
}

fn fixture(api: ScriptedConversionApi) -> Fixture {
    let (_backend, store) = create_test_store();
    fixture_with(store, api, FixedConfirmation::approving(), ActionMode::Optimistic)
}

#[tokio::test(start_paused = true)]
async fn given_legacy_active_record_when_starting_then_migrates_and_resumes_polling() {
    let (_backend, store) = create_seeded_store(
        r#"[{"taskId":"legacy","filename":"old.pdf","status":"PENDING","date":"2024-05-01T10:00:00Z"}]"#,
    );
    let f = fixture_with(
        store,
        ScriptedConversionApi::new(),
        FixedConfirmation::approving(),
        ActionMode::Optimistic,
    );

    let view = f.service.start().await;

    assert_eq!(view.active.len(), 1);
    assert_eq!(view.active[0].task_id, TaskId::new("legacy"));
    assert!(f.service.supervisor().is_polling(&TaskId::new("legacy")));
    f.service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn given_repeated_renders_when_task_active_then_single_poller_runs() {
    let (_backend, store) = create_test_store();
    store
        .save(&[task("a", "a.pdf", TaskStatus::Pending)])
        .await
        .unwrap();
    let f = fixture_with(
        store,
        ScriptedConversionApi::new(),
        FixedConfirmation::approving(),
        ActionMode::Optimistic,
    );

    f.service.start().await;
    f.service.start().await;
    f.service.start().await;

    assert_eq!(f.service.supervisor().active_count(), 1);
    f.service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn given_accepted_upload_when_uploading_then_pending_task_is_first_and_polled() {
    let f = fixture(ScriptedConversionApi::with_upload_id("abc123"));
    f.store
        .save(&[finished("old", "old.mp3")])
        .await
        .unwrap();

    let created = f
        .service
        .upload("book.txt", Bytes::from_static(b"text"))
        .await
        .unwrap();

    let tasks = f.store.load().await;
    assert_eq!(tasks[0].id, TaskId::new("abc123"));
    assert_eq!(tasks[0].status, TaskStatus::Pending);
    assert_eq!(tasks[0], created);
    assert!(f.service.supervisor().is_polling(&created.id));
    f.service.shutdown().await;
}

#[tokio::test]
async fn given_rejected_upload_when_uploading_then_error_and_no_task() {
    let f = fixture(ScriptedConversionApi::failing());

    let result = f.service.upload("book.txt", Bytes::from_static(b"text")).await;

    assert!(matches!(result, Err(UploadError::Api(_))));
    assert!(f.store.load().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn given_upload_when_store_changes_then_subscribers_see_active_row() {
    let f = fixture(ScriptedConversionApi::with_upload_id("abc123"));
    let mut views = f.service.subscribe();

    f.service
        .upload("book.txt", Bytes::from_static(b"text"))
        .await
        .unwrap();

    assert!(views.has_changed().unwrap());
    let view = views.borrow_and_update().clone();
    assert_eq!(view.active.len(), 1);
    assert_eq!(view.active[0].filename, "book.txt");
    f.service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn given_cancel_request_failing_when_cancelling_then_task_is_still_cancelled() {
    let (_backend, store) = create_test_store();
    store
        .save(&[task("a", "a.pdf", TaskStatus::Processing)])
        .await
        .unwrap();
    let f = fixture_with(
        store,
        ScriptedConversionApi::failing(),
        FixedConfirmation::approving(),
        ActionMode::Optimistic,
    );
    f.service.start().await;

    let outcome = f.service.cancel_task(&TaskId::new("a")).await.unwrap();
    f.service.shutdown().await;

    assert_eq!(outcome, ActionOutcome::Applied);
    assert_eq!(f.store.load().await[0].status, TaskStatus::Cancelled);
    assert_eq!(*f.api.cancelled.lock().unwrap(), vec![TaskId::new("a")]);
    assert_eq!(*f.confirmation.prompts.lock().unwrap(), vec![CANCEL_PROMPT]);
    assert!(!f.service.supervisor().is_polling(&TaskId::new("a")));
}

#[tokio::test]
async fn given_declined_confirmation_when_cancelling_then_nothing_happens() {
    let (_backend, store) = create_test_store();
    store
        .save(&[task("a", "a.pdf", TaskStatus::Pending)])
        .await
        .unwrap();
    let f = fixture_with(
        store,
        ScriptedConversionApi::new(),
        FixedConfirmation::declining(),
        ActionMode::Optimistic,
    );

    let outcome = f.service.cancel_task(&TaskId::new("a")).await.unwrap();
    f.service.shutdown().await;

    assert_eq!(outcome, ActionOutcome::Declined);
    assert_eq!(f.store.load().await[0].status, TaskStatus::Pending);
    assert!(f.api.cancelled.lock().unwrap().is_empty());
}

#[tokio::test]
async fn given_await_server_mode_when_cancel_fails_then_task_keeps_status() {
    let (_backend, store) = create_test_store();
    store
        .save(&[task("a", "a.pdf", TaskStatus::Pending)])
        .await
        .unwrap();
    let f = fixture_with(
        store,
        ScriptedConversionApi::failing(),
        FixedConfirmation::approving(),
        ActionMode::AwaitServer,
    );

    let outcome = f.service.cancel_task(&TaskId::new("a")).await.unwrap();

    assert!(matches!(outcome, ActionOutcome::Rejected(_)));
    assert_eq!(f.store.load().await[0].status, TaskStatus::Pending);
}

#[tokio::test]
async fn given_await_server_mode_when_cancel_succeeds_then_task_is_cancelled() {
    let (_backend, store) = create_test_store();
    store
        .save(&[task("a", "a.pdf", TaskStatus::Pending)])
        .await
        .unwrap();
    let f = fixture_with(
        store,
        ScriptedConversionApi::new(),
        FixedConfirmation::approving(),
        ActionMode::AwaitServer,
    );

    let outcome = f.service.cancel_task(&TaskId::new("a")).await.unwrap();

    assert_eq!(outcome, ActionOutcome::Applied);
    assert_eq!(f.store.load().await[0].status, TaskStatus::Cancelled);
}

#[tokio::test]
async fn given_finished_task_when_deleting_then_record_goes_and_server_file_is_deleted() {
    let f = fixture(ScriptedConversionApi::failing());
    f.store.save(&[finished("a", "a.mp3")]).await.unwrap();

    let outcome = f
        .service
        .delete_task(&TaskId::new("a"), Some("a.mp3"))
        .await
        .unwrap();
    assert!(f.store.load().await.is_empty());
    f.service.shutdown().await;

    assert_eq!(outcome, ActionOutcome::Applied);
    assert_eq!(*f.api.deleted.lock().unwrap(), vec!["a.mp3".to_string()]);
    assert_eq!(*f.confirmation.prompts.lock().unwrap(), vec![DELETE_PROMPT]);
}

#[tokio::test]
async fn given_placeholder_filename_when_deleting_then_no_server_request() {
    let f = fixture(ScriptedConversionApi::new());
    f.store
        .save(&[task("a", "a.pdf", TaskStatus::Unknown)])
        .await
        .unwrap();

    f.service
        .delete_task(&TaskId::new("a"), Some("undefined"))
        .await
        .unwrap();
    f.service
        .delete_task(&TaskId::new("a"), None)
        .await
        .unwrap();
    f.service.shutdown().await;

    assert!(f.store.load().await.is_empty());
    assert!(f.api.deleted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn given_success_task_when_deleting_by_id_then_result_filename_is_sent() {
    let f = fixture(ScriptedConversionApi::new());
    f.store
        .save(&[finished("a", "a.mp3"), task("b", "b.pdf", TaskStatus::Failure)])
        .await
        .unwrap();

    f.service.delete_by_id(&TaskId::new("a")).await.unwrap();
    f.service.delete_by_id(&TaskId::new("b")).await.unwrap();
    f.service.shutdown().await;

    let mut deleted = f.api.deleted.lock().unwrap().clone();
    deleted.sort();
    assert_eq!(deleted, vec!["a.mp3".to_string(), "b.pdf".to_string()]);
}

#[tokio::test]
async fn given_await_server_mode_when_delete_fails_then_record_is_kept() {
    let (_backend, store) = create_test_store();
    store.save(&[finished("a", "a.mp3")]).await.unwrap();
    let f = fixture_with(
        store,
        ScriptedConversionApi::failing(),
        FixedConfirmation::approving(),
        ActionMode::AwaitServer,
    );

    let outcome = f
        .service
        .delete_task(&TaskId::new("a"), Some("a.mp3"))
        .await
        .unwrap();

    assert!(matches!(outcome, ActionOutcome::Rejected(_)));
    assert_eq!(f.store.load().await.len(), 1);
}

#[tokio::test]
async fn given_history_when_clearing_then_store_is_empty() {
    let f = fixture(ScriptedConversionApi::new());
    f.store
        .save(&[finished("a", "a.mp3"), task("b", "b.pdf", TaskStatus::Failure)])
        .await
        .unwrap();
    let mut views = f.service.subscribe();

    let outcome = f.service.clear_history().await.unwrap();

    assert_eq!(outcome, ActionOutcome::Applied);
    assert!(f.store.load().await.is_empty());
    assert!(views.borrow_and_update().show_empty_library);
    assert_eq!(*f.confirmation.prompts.lock().unwrap(), vec![CLEAR_PROMPT]);
}

#[tokio::test]
async fn given_finished_task_when_downloading_then_file_is_written() {
    let f = fixture(ScriptedConversionApi::new());
    f.store.save(&[finished("a", "a.mp3")]).await.unwrap();
    let dir = tempfile::TempDir::new().unwrap();

    let path = f
        .service
        .download(&TaskId::new("a"), dir.path())
        .await
        .unwrap();

    assert_eq!(path, dir.path().join("a.mp3"));
    assert_eq!(std::fs::read(&path).unwrap(), b"ID3 fake audio");
}

#[tokio::test]
async fn given_pending_task_when_downloading_then_not_ready() {
    let f = fixture(ScriptedConversionApi::new());
    f.store
        .save(&[task("a", "a.pdf", TaskStatus::Pending)])
        .await
        .unwrap();
    let dir = tempfile::TempDir::new().unwrap();

    let result = f.service.download(&TaskId::new("a"), dir.path()).await;

    assert!(matches!(result, Err(DownloadError::NotReady(_))));
    assert!(matches!(
        f.service.download(&TaskId::new("zzz"), dir.path()).await,
        Err(DownloadError::NotFound(_))
    ));
}
