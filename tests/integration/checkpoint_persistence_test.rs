//! Checkpoint Persistence Integration Tests
//!
//! Verifies that suspended turns stored in SQLite survive a restart of the
//! orchestrator and are still consumed exactly once.

use std::sync::Arc;

use tempfile::TempDir;
use will_of_code::models::settings::CheckpointBackend;
use will_of_code::models::state::PendingAction;
use will_of_code::services::graph_workflow::{CheckpointStore, SqliteCheckpointStore};
use will_of_code::storage::open_pool;
use will_of_code::{AppConfig, AppError, Decision, ResumeRequest, TurnRequest};

use crate::support::{harness_with, RecordingBridge};

fn sqlite_store(dir: &TempDir) -> Arc<SqliteCheckpointStore> {
    let pool = open_pool(&dir.path().join("state").join("checkpoints.db")).unwrap();
    Arc::new(SqliteCheckpointStore::new(pool).unwrap())
}

fn sqlite_config() -> AppConfig {
    AppConfig {
        checkpoint_backend: CheckpointBackend::Sqlite,
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn test_suspended_turn_survives_restart() {
    let dir = TempDir::new().unwrap();
    let config = sqlite_config();

    {
        let store = sqlite_store(&dir);
        let h = harness_with(&config, &[], RecordingBridge::canned("unused"), store.clone());
        let response = h
            .orchestrator
            .run_turn(TurnRequest::new("delete file notes.md").with_thread("p-1"))
            .await
            .unwrap();
        assert_eq!(response.pending_action, Some(PendingAction::Delete));
        assert_eq!(store.len().await.unwrap(), 1);
    }

    let store = sqlite_store(&dir);
    let checkpoint = store.peek("p-1").await.unwrap().unwrap();
    assert_eq!(checkpoint.suspended_at_node, "file_delete");
    assert_eq!(checkpoint.suspended_state.query(), "delete file notes.md");

    let h = harness_with(
        &config,
        &[],
        RecordingBridge::canned("File deleted: notes.md"),
        store.clone(),
    );
    let resumed = h
        .orchestrator
        .resume(ResumeRequest {
            thread_id: "p-1".to_string(),
            decision: Decision::Accept,
        })
        .await
        .unwrap();

    assert!(resumed.applied);
    assert_eq!(h.bridge.tool_names(), vec!["delete_file".to_string()]);
    assert_eq!(store.len().await.unwrap(), 0);

    let err = h
        .orchestrator
        .resume(ResumeRequest {
            thread_id: "p-1".to_string(),
            decision: Decision::Reject,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCheckpoint(_)));
}

#[tokio::test]
async fn test_abandon_removes_persisted_checkpoint() {
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir);
    let h = harness_with(
        &sqlite_config(),
        &[],
        RecordingBridge::canned(""),
        store.clone(),
    );

    h.orchestrator
        .run_turn(TurnRequest::new("run code: print(42)").with_thread("p-2"))
        .await
        .unwrap();
    assert!(h.orchestrator.abandon("p-2").await.unwrap());
    assert!(store.peek("p-2").await.unwrap().is_none());
    assert!(!h.orchestrator.abandon("p-2").await.unwrap());
}
