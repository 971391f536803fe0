use audiobook_queue::domain::{RemoteState, StatusReport, TaskStatus};

#[test]
fn given_revoked_state_when_mapped_then_local_status_is_cancelled() {
    let state = RemoteState::parse("REVOKED");
    assert_eq!(state, RemoteState::Revoked);
    assert_eq!(state.local_status(), Some(TaskStatus::Cancelled));
    assert!(state.is_terminal());
}

#[test]
fn given_progress_state_when_mapped_then_status_unchanged_and_not_terminal() {
    let state = RemoteState::parse("PROGRESS");
    assert_eq!(state, RemoteState::Other("PROGRESS".to_string()));
    assert_eq!(state.local_status(), None);
    assert!(!state.is_terminal());
}

#[test]
fn given_pending_state_when_mapped_then_not_terminal() {
    assert!(!RemoteState::parse("PENDING").is_terminal());
}

#[test]
fn given_success_body_when_decoded_then_carries_filename() {
    let report: StatusReport =
        serde_json::from_str(r#"{"state":"SUCCESS","filename":"book.mp3","status":"done"}"#)
            .unwrap();
    assert_eq!(report.state, RemoteState::Success);
    assert_eq!(report.filename.as_deref(), Some("book.mp3"));
}

#[test]
fn given_body_without_filename_when_decoded_then_filename_is_none() {
    let report: StatusReport = serde_json::from_str(r#"{"state":"FAILURE"}"#).unwrap();
    assert_eq!(report.state, RemoteState::Failure);
    assert_eq!(report.filename, None);
}

#[test]
fn given_body_without_state_when_decoded_then_error() {
    let result = serde_json::from_str::<StatusReport>(r#"{"filename":"x.mp3"}"#);
    assert!(result.is_err());
}
