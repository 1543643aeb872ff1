//! Turn Flow Integration Tests
//!
//! Verifies single turns through the orchestrator:
//! - Routing-table classification and deterministic tie-breaks
//! - Safety filter short-circuit
//! - Producer turns never suspend
//! - Fallback classification, clarification and failure recovery

use std::fs;

use tempfile::TempDir;
use will_of_code::models::state::{Intent, PendingAction, TurnFault};
use will_of_code::services::orchestrator::constants::{
    default_routing_rules, DENIAL_MESSAGE, HANDLER_FAILURE_MESSAGE,
};
use will_of_code::services::orchestrator::RoutingTable;
use will_of_code::TurnRequest;

use crate::support::{harness, RecordingBridge};

// ============================================================================
// Routing
// ============================================================================

#[tokio::test]
async fn test_list_files_renders_listing_without_proposal() {
    let h = harness(&[], RecordingBridge::canned("workspace/\n    main.py"));

    let response = h
        .orchestrator
        .run_turn(TurnRequest::new("list files in /workspace"))
        .await
        .unwrap();

    assert_eq!(response.intent, Some(Intent::FolderList));
    assert!(response.pending_action.is_none());
    assert!(response.action_payload.is_none());
    assert!(!response.is_suspended());
    assert_eq!(
        response.result_text,
        "**Files in /workspace:**\n```\nworkspace/\n    main.py\n```"
    );
    assert_eq!(h.bridge.tool_names(), vec!["list_files".to_string()]);
    assert_eq!(h.generator.calls(), 0);
}

#[test]
fn test_tie_break_independent_of_table_order() {
    let forward = RoutingTable::new(default_routing_rules()).unwrap();
    let mut reversed_rules = default_routing_rules();
    reversed_rules.reverse();
    let reversed = RoutingTable::new(reversed_rules).unwrap();

    let cases = [
        ("run code to delete file a.py", Intent::RunCode),
        ("review and refactor this code", Intent::CodeReview),
        ("explain why this is broken", Intent::Debug),
        ("read file and explain it", Intent::FileRead),
        ("refactor: def review(x): return x", Intent::Refactor),
        ("refactor: data = read_file(path)", Intent::Refactor),
        ("optimize: open file loop", Intent::Optimize),
        (r"C:\proj\a.py", Intent::FileRead),
    ];
    for (query, expected) in cases {
        assert_eq!(forward.match_intent(query), Some(expected), "{}", query);
        assert_eq!(reversed.match_intent(query), Some(expected), "{}", query);
    }
}

#[tokio::test]
async fn test_refactor_command_with_keyword_laden_code_proposes_edit() {
    let h = harness(
        &[r#"{"refactored_code": "def review(x):\n    return x", "changes": ["split"]}"#],
        RecordingBridge::canned("should not be read"),
    );

    let response = h
        .orchestrator
        .run_turn(TurnRequest::new("refactor: def review(x): return read_file(x)"))
        .await
        .unwrap();

    assert_eq!(response.intent, Some(Intent::Refactor));
    assert_eq!(response.pending_action, Some(PendingAction::ConfirmEdit));
    assert!(h.bridge.tool_names().is_empty());
    assert_eq!(h.generator.calls(), 1);
}

#[tokio::test]
async fn test_file_read_uses_local_tools() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("calc.py"), "def add(a, b):\n    return a + b\n").unwrap();
    let h = harness(
        &["Defines add()."],
        RecordingBridge::local(dir.path(), "python3"),
    );

    let response = h
        .orchestrator
        .run_turn(TurnRequest::new("read file calc.py"))
        .await
        .unwrap();

    assert_eq!(response.intent, Some(Intent::FileRead));
    assert_eq!(response.result_text, "**File: calc.py**\n\nDefines add().");
    assert_eq!(h.bridge.tool_names(), vec!["read_file".to_string()]);
    assert!(!response.is_suspended());
}

// ============================================================================
// Safety
// ============================================================================

#[tokio::test]
async fn test_protected_path_is_denied_before_dispatch() {
    let h = harness(&[], RecordingBridge::canned("secret"));

    let response = h
        .orchestrator
        .run_turn(TurnRequest::new("read file ~/.ssh/id_rsa and explain it"))
        .await
        .unwrap();

    assert_eq!(response.result_text, DENIAL_MESSAGE);
    assert_eq!(response.intent, Some(Intent::Common));
    assert!(response.pending_action.is_none());
    assert!(matches!(response.fault, Some(TurnFault::SafetyBlocked { .. })));
    assert!(h.bridge.tool_names().is_empty());
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn test_protected_file_context_is_denied() {
    let h = harness(&[], RecordingBridge::canned(""));
    let request = TurnRequest::new("refactor this").with_file("/repo/.env", "KEY=1");

    let response = h.orchestrator.run_turn(request).await.unwrap();

    assert_eq!(response.result_text, DENIAL_MESSAGE);
    assert!(!response.is_suspended());
    assert!(response.file_context.is_none());
    assert_eq!(h.generator.calls(), 0);
}

// ============================================================================
// Fallback classification
// ============================================================================

#[tokio::test]
async fn test_low_confidence_asks_for_clarification() {
    let h = harness(
        &[r#"{"intent": "generate", "confidence": 0.3, "needs_clarification": true, "clarification_question": "Which language?"}"#],
        RecordingBridge::canned(""),
    );

    let response = h
        .orchestrator
        .run_turn(TurnRequest::new("make me something"))
        .await
        .unwrap();

    assert_eq!(response.intent, Some(Intent::Clarify));
    assert_eq!(response.result_text, "Which language?");
    assert_eq!(
        response.clarification_question.as_deref(),
        Some("Which language?")
    );
    assert_eq!(h.generator.calls(), 1);
}

#[tokio::test]
async fn test_generator_outage_is_recovered() {
    let h = harness(&[], RecordingBridge::canned(""));

    let response = h
        .orchestrator
        .run_turn(TurnRequest::new("hello there"))
        .await
        .unwrap();

    assert_eq!(response.intent, Some(Intent::Generate));
    assert_eq!(response.confidence, Some(0.0));
    assert_eq!(response.result_text, HANDLER_FAILURE_MESSAGE);
    assert!(matches!(
        response.fault,
        Some(TurnFault::HandlerFailure { ref handler, .. }) if handler == "generate"
    ));
    assert!(!response.is_suspended());
}

// ============================================================================
// Working State invariants
// ============================================================================

#[tokio::test]
async fn test_pending_action_always_has_payload() {
    let h = harness(
        &[
            r#"{"refactored_code": "x = 1", "changes": ["tidy"]}"#,
            r#"{"intent": "generate", "confidence": 0.9}"#,
            r#"{"code": "", "explanation": "Sure."}"#,
        ],
        RecordingBridge::canned("listing"),
    );

    let queries = [
        "refactor: x=1",
        "delete file old.txt",
        "run code: print(1)",
        "list files",
        "write a haiku generator",
    ];
    for (i, query) in queries.iter().enumerate() {
        let response = h
            .orchestrator
            .run_turn(TurnRequest::new(*query).with_thread(format!("t-{}", i)))
            .await
            .unwrap();
        assert_eq!(
            response.pending_action.is_some(),
            response.action_payload.is_some(),
            "{}",
            query
        );
        assert_eq!(response.pending_action.is_some(), response.is_suspended());
        if let (Some(kind), Some(payload)) = (response.pending_action, &response.action_payload) {
            assert_eq!(kind, payload.pending_action());
        }
    }
    assert_eq!(h.bridge.mutating_calls(), 0);
}
