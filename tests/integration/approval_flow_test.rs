//! Approval Flow Integration Tests
//!
//! Verifies the suspend/resume cycle against real files:
//! - Mutating intents suspend and leave the disk untouched
//! - Accept performs exactly one tool call; reject performs none
//! - Tokens are single-use and expire

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use will_of_code::models::state::{ActionPayload, EditSource, Intent, PendingAction};
use will_of_code::services::graph_workflow::InMemoryCheckpointStore;
use will_of_code::{AppConfig, AppError, Decision, ResumeRequest, TurnRequest};

use crate::support::{harness, harness_with, RecordingBridge};

const REWRITE: &str = "def add(a, b):\n    return a + b";

fn refactor_reply() -> String {
    serde_json::json!({
        "refactored_code": REWRITE,
        "changes": ["added spacing", "split onto two lines"]
    })
    .to_string()
}

fn resume(thread_id: &str, decision: Decision) -> ResumeRequest {
    ResumeRequest {
        thread_id: thread_id.to_string(),
        decision,
    }
}

#[tokio::test]
async fn test_refactor_without_file_proposes_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let reply = refactor_reply();
    let h = harness(&[&reply], RecordingBridge::local(dir.path(), "python3"));

    let response = h
        .orchestrator
        .run_turn(TurnRequest::new("refactor: def add(a,b): return a+b").with_thread("r-1"))
        .await
        .unwrap();

    assert_eq!(response.thread_id, "r-1");
    assert_eq!(response.pending_action, Some(PendingAction::ConfirmEdit));
    match response.action_payload.as_ref().unwrap() {
        ActionPayload::ApplyEdit {
            source, path, code, ..
        } => {
            assert_eq!(*source, EditSource::Refactor);
            assert_eq!(code, REWRITE);
            assert!(path.is_none());
        }
        other => panic!("unexpected payload {:?}", other),
    }
    assert!(response.proposal.is_some());
    assert!(h.bridge.tool_names().is_empty());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_quoted_literal_in_code_is_not_a_write_target() {
    let dir = TempDir::new().unwrap();
    let reply = refactor_reply();
    let h = harness(&[&reply], RecordingBridge::local(dir.path(), "python3"));

    let response = h
        .orchestrator
        .run_turn(
            TurnRequest::new("refactor: def greet(): return 'greeting'").with_thread("r-3"),
        )
        .await
        .unwrap();
    assert_eq!(response.intent, Some(Intent::Refactor));
    assert_eq!(response.action_payload.as_ref().and_then(|p| p.path()), None);

    let resumed = h
        .orchestrator
        .resume(resume("r-3", Decision::Accept))
        .await
        .unwrap();

    assert!(resumed.applied);
    assert!(resumed.result_text.contains("nothing was written"));
    assert_eq!(h.bridge.mutating_calls(), 0);
    assert!(!dir.path().join("greeting").exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_accept_writes_rewrite_to_loaded_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("calc.py");
    fs::write(&file, "def add(a,b): return a+b\n").unwrap();
    let path = file.to_string_lossy().to_string();

    let reply = refactor_reply();
    let h = harness(&[&reply], RecordingBridge::local(dir.path(), "python3"));

    let request = TurnRequest::new("refactor this function")
        .with_thread("r-2")
        .with_file(path.clone(), "def add(a,b): return a+b\n");
    let response = h.orchestrator.run_turn(request).await.unwrap();
    assert_eq!(
        response.action_payload.as_ref().and_then(|p| p.path()),
        Some(path.as_str())
    );
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "def add(a,b): return a+b\n"
    );

    let resumed = h
        .orchestrator
        .resume(resume("r-2", Decision::Accept))
        .await
        .unwrap();

    assert!(resumed.applied);
    assert!(resumed.result_text.starts_with("Changes accepted and saved to"));
    assert_eq!(fs::read_to_string(&file).unwrap(), REWRITE);
    assert_eq!(h.bridge.tool_names(), vec!["write_file".to_string()]);

    let recorded = h.bridge.requests.lock().unwrap()[0].clone();
    assert_eq!(recorded.params["path"], path.as_str());
    assert_eq!(recorded.params["content"], REWRITE);
    assert_eq!(recorded.thread_id.as_deref(), Some("r-2"));
}

#[tokio::test]
async fn test_file_read_then_edit_carries_loaded_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("calc.py");
    fs::write(&file, "def add(a, b):\n    return a + b\n").unwrap();
    let edited = "def add(a, b):\n    return a + b\n\nif __name__ == \"__main__\":\n    print(add(1, 2))\n";
    let edit_reply = serde_json::json!({
        "modified_code": edited,
        "changes": ["added a main guard"]
    })
    .to_string();
    let h = harness(
        &["Defines add().", &edit_reply],
        RecordingBridge::local(dir.path(), "python3"),
    );

    let first = h
        .orchestrator
        .run_turn(TurnRequest::new("read file calc.py").with_thread("f-1"))
        .await
        .unwrap();
    assert_eq!(first.intent, Some(Intent::FileRead));
    let loaded = first.file_context.clone().unwrap();
    assert_eq!(loaded.path, "calc.py");
    assert_eq!(loaded.content, "def add(a, b):\n    return a + b\n");

    let second = h
        .orchestrator
        .run_turn(
            TurnRequest::new("add a main guard")
                .with_thread("f-2")
                .with_loaded_file(first.file_context.as_ref()),
        )
        .await
        .unwrap();
    assert_eq!(second.intent, Some(Intent::FileEdit));
    assert_eq!(
        second.action_payload.as_ref().and_then(|p| p.path()),
        Some("calc.py")
    );
    assert_eq!(second.file_context.as_ref().map(|f| f.path.as_str()), Some("calc.py"));

    let resumed = h
        .orchestrator
        .resume(resume("f-2", Decision::Accept))
        .await
        .unwrap();
    assert!(resumed.applied);
    assert_eq!(fs::read_to_string(&file).unwrap(), edited);
    assert_eq!(
        h.bridge.tool_names(),
        vec!["read_file".to_string(), "write_file".to_string()]
    );
}

#[tokio::test]
async fn test_reject_leaves_disk_untouched_and_consumes_token() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("keep.txt");
    fs::write(&file, "keep me").unwrap();
    let h = harness(&[], RecordingBridge::local(dir.path(), "python3"));

    let response = h
        .orchestrator
        .run_turn(TurnRequest::new("delete file keep.txt").with_thread("d-1"))
        .await
        .unwrap();
    assert_eq!(response.pending_action, Some(PendingAction::Delete));

    let resumed = h
        .orchestrator
        .resume(resume("d-1", Decision::Reject))
        .await
        .unwrap();
    assert_eq!(resumed.result_text, "Changes rejected.");
    assert!(!resumed.applied);
    assert!(file.exists());
    assert_eq!(h.bridge.mutating_calls(), 0);

    let err = h
        .orchestrator
        .resume(resume("d-1", Decision::Accept))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCheckpoint(_)));
    assert!(file.exists());
}

#[tokio::test]
async fn test_accept_delete_removes_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("old.log");
    fs::write(&file, "stale").unwrap();
    let h = harness(&[], RecordingBridge::local(dir.path(), "python3"));

    h.orchestrator
        .run_turn(TurnRequest::new("delete file old.log").with_thread("d-2"))
        .await
        .unwrap();
    let resumed = h
        .orchestrator
        .resume(resume("d-2", Decision::Accept))
        .await
        .unwrap();

    assert!(resumed.applied);
    assert!(!file.exists());
    assert_eq!(h.bridge.tool_names(), vec!["delete_file".to_string()]);
}

#[tokio::test]
async fn test_tool_failure_on_accept_is_surfaced_verbatim() {
    let dir = TempDir::new().unwrap();
    let h = harness(&[], RecordingBridge::local(dir.path(), "python3"));

    h.orchestrator
        .run_turn(TurnRequest::new("delete file ghost.txt").with_thread("d-3"))
        .await
        .unwrap();
    let resolution = h
        .orchestrator
        .resume_detailed(resume("d-3", Decision::Accept))
        .await
        .unwrap();

    assert!(!resolution.response.applied);
    assert!(resolution.response.result_text.starts_with("ERROR: "));
    assert!(resolution.state.pending_action().is_none());
    assert_eq!(resolution.state.tool_log().len(), 1);
    assert!(!resolution.state.tool_log()[0].ok);
    assert_eq!(h.bridge.mutating_calls(), 1);

    let err = h
        .orchestrator
        .resume(resume("d-3", Decision::Accept))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCheckpoint(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_accept_run_code_returns_output() {
    let dir = TempDir::new().unwrap();
    let h = harness(&[], RecordingBridge::local(dir.path(), "sh"));

    let response = h
        .orchestrator
        .run_turn(TurnRequest::new("run code: echo hello").with_thread("x-1"))
        .await
        .unwrap();
    assert_eq!(response.pending_action, Some(PendingAction::RunCode));
    assert_eq!(h.bridge.mutating_calls(), 0);

    let resumed = h
        .orchestrator
        .resume(resume("x-1", Decision::Accept))
        .await
        .unwrap();
    assert!(resumed.applied);
    assert_eq!(resumed.result_text, "## Output\n\n```\nhello\n```");
}

#[tokio::test]
async fn test_concurrent_resumes_single_winner() {
    let h = harness(&[], RecordingBridge::canned("File deleted: x"));
    h.orchestrator
        .run_turn(TurnRequest::new("delete file x.txt").with_thread("c-1"))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        h.orchestrator.resume(resume("c-1", Decision::Accept)),
        h.orchestrator.resume(resume("c-1", Decision::Accept)),
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert_eq!(h.bridge.mutating_calls(), 1);
}

#[tokio::test]
async fn test_expired_checkpoint_cannot_be_resumed() {
    let config = AppConfig {
        checkpoint_idle_secs: 1,
        ..AppConfig::default()
    };
    let store = Arc::new(InMemoryCheckpointStore::new());
    let h = harness_with(&config, &[], RecordingBridge::canned("ok"), store);

    h.orchestrator
        .run_turn(TurnRequest::new("delete file stale.txt").with_thread("e-1"))
        .await
        .unwrap();
    h.orchestrator
        .run_turn(TurnRequest::new("delete file stale2.txt").with_thread("e-2"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let err = h
        .orchestrator
        .resume(resume("e-1", Decision::Accept))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCheckpoint(_)));

    let evicted = h.orchestrator.evict_idle_checkpoints().await.unwrap();
    assert_eq!(evicted, vec!["e-2".to_string()]);
    assert_eq!(h.bridge.mutating_calls(), 0);
}
