//! Working State
//!
//! The single value threaded through safety filter, classifier, handler and
//! approval gate for one turn. It holds no handles and serializes fully, so
//! a suspended turn can be checkpointed and restored verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::orchestrator::constants::detect_language;

/// Classified purpose of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Generate,
    Debug,
    Explain,
    FileRead,
    FileEdit,
    FileWrite,
    FileDelete,
    FolderList,
    RunCode,
    CodeReview,
    Refactor,
    TestGen,
    Documentation,
    Optimize,
    Common,
    /// Pseudo-intent: answer with a clarification question, run no handler.
    Clarify,
}

impl Intent {
    /// Intents the fallback classifier may choose from.
    pub const CLASSIFIABLE: [Intent; 15] = [
        Intent::Generate,
        Intent::Debug,
        Intent::Explain,
        Intent::FileRead,
        Intent::FileEdit,
        Intent::FileWrite,
        Intent::FileDelete,
        Intent::FolderList,
        Intent::RunCode,
        Intent::CodeReview,
        Intent::Refactor,
        Intent::TestGen,
        Intent::Documentation,
        Intent::Optimize,
        Intent::Common,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Generate => "generate",
            Intent::Debug => "debug",
            Intent::Explain => "explain",
            Intent::FileRead => "file_read",
            Intent::FileEdit => "file_edit",
            Intent::FileWrite => "file_write",
            Intent::FileDelete => "file_delete",
            Intent::FolderList => "folder_list",
            Intent::RunCode => "run_code",
            Intent::CodeReview => "code_review",
            Intent::Refactor => "refactor",
            Intent::TestGen => "test_gen",
            Intent::Documentation => "documentation",
            Intent::Optimize => "optimize",
            Intent::Common => "common",
            Intent::Clarify => "clarify",
        }
    }

    /// Parse a wire name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Intent> {
        let name = name.trim().to_ascii_lowercase();
        Self::CLASSIFIABLE
            .iter()
            .chain(std::iter::once(&Intent::Clarify))
            .find(|i| i.as_str() == name)
            .copied()
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of deferred mutation awaiting a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
    ConfirmEdit,
    Delete,
    RunCode,
}

impl PendingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingAction::ConfirmEdit => "confirm_edit",
            PendingAction::Delete => "delete",
            PendingAction::RunCode => "run_code",
        }
    }
}

impl std::fmt::Display for PendingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which handler produced an edit proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditSource {
    Refactor,
    Documentation,
    Optimize,
    FileEdit,
    FileWrite,
}

/// Data needed to carry out a deferred mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mutation", rename_all = "snake_case")]
pub enum ActionPayload {
    ApplyEdit {
        source: EditSource,
        /// Target file; `None` when the code came from the request text and
        /// no file was named.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        changes: Option<String>,
    },
    DeleteFile {
        path: String,
    },
    RunCode {
        code: String,
    },
}

impl ActionPayload {
    pub fn pending_action(&self) -> PendingAction {
        match self {
            ActionPayload::ApplyEdit { .. } => PendingAction::ConfirmEdit,
            ActionPayload::DeleteFile { .. } => PendingAction::Delete,
            ActionPayload::RunCode { .. } => PendingAction::RunCode,
        }
    }

    /// Code carried by the payload, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            ActionPayload::ApplyEdit { code, .. } | ActionPayload::RunCode { code } => Some(code),
            ActionPayload::DeleteFile { .. } => None,
        }
    }

    /// File the payload targets, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            ActionPayload::ApplyEdit { path, .. } => path.as_deref(),
            ActionPayload::DeleteFile { path } => Some(path),
            ActionPayload::RunCode { .. } => None,
        }
    }
}

/// A loaded file the request refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContext {
    pub path: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
}

impl FileContext {
    /// Build a context, detecting the language from the path extension.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let detected_language = detect_language(&path).map(str::to_string);
        Self {
            path,
            content: content.into(),
            detected_language,
        }
    }
}

/// One Tool Bridge call made during the turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolLogEntry {
    pub tool: String,
    pub params: Value,
    pub ok: bool,
    /// First line of the reply, shortened.
    pub summary: String,
    pub at: DateTime<Utc>,
}

impl ToolLogEntry {
    const SUMMARY_CHARS: usize = 120;

    pub fn new(tool: impl Into<String>, params: Value, reply: &str, ok: bool) -> Self {
        let first_line = reply.lines().next().unwrap_or("");
        let summary: String = first_line.chars().take(Self::SUMMARY_CHARS).collect();
        Self {
            tool: tool.into(),
            params,
            ok,
            summary,
            at: Utc::now(),
        }
    }
}

/// Recovered failure recorded on the turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnFault {
    SafetyBlocked { pattern: String },
    ClassificationFailure { reason: String },
    HandlerFailure { handler: String, reason: String },
    ToolError { tool: String, reason: String },
}

/// Per-turn state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingState {
    query: String,
    #[serde(default)]
    pub intent: Option<Intent>,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    pub clarification_question: Option<String>,
    #[serde(default)]
    pub file_context: Option<FileContext>,
    #[serde(default)]
    pub produced_code: Option<String>,
    #[serde(default)]
    pub result_text: String,
    /// Single slot: a pending action cannot exist without its payload.
    #[serde(default)]
    pending: Option<ActionPayload>,
    #[serde(default)]
    tool_log: Vec<ToolLogEntry>,
    #[serde(default)]
    pub fault: Option<TurnFault>,
    #[serde(default)]
    pub handled_by: Option<String>,
}

impl WorkingState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            intent: None,
            confidence: None,
            clarification_question: None,
            file_context: None,
            produced_code: None,
            result_text: String::new(),
            pending: None,
            tool_log: Vec::new(),
            fault: None,
            handled_by: None,
        }
    }

    pub fn with_file_context(mut self, file_context: FileContext) -> Self {
        self.file_context = Some(file_context);
        self
    }

    /// The raw request text.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn confidence(&self) -> Option<f32> {
        self.confidence
    }

    /// Set the confidence, clamped to `[0, 1]`. NaN becomes 0.
    pub fn set_confidence(&mut self, confidence: f32) {
        let c = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self.confidence = Some(c);
    }

    /// Route the turn: intent plus confidence.
    pub fn classify(&mut self, intent: Intent, confidence: f32) {
        self.intent = Some(intent);
        self.set_confidence(confidence);
    }

    pub fn pending_action(&self) -> Option<PendingAction> {
        self.pending.as_ref().map(ActionPayload::pending_action)
    }

    pub fn action_payload(&self) -> Option<&ActionPayload> {
        self.pending.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Propose a mutation, replacing any earlier proposal.
    pub fn propose(&mut self, payload: ActionPayload) {
        self.pending = Some(payload);
    }

    /// Drop the pending proposal, returning it.
    pub fn clear_pending(&mut self) -> Option<ActionPayload> {
        self.pending.take()
    }

    pub fn tool_log(&self) -> &[ToolLogEntry] {
        &self.tool_log
    }

    /// Append a tool call record.
    pub fn record_tool(&mut self, entry: ToolLogEntry) {
        self.tool_log.push(entry);
    }

    /// Code to operate on: the loaded file when present, otherwise the
    /// request text.
    pub fn working_code(&self) -> &str {
        self.file_context
            .as_ref()
            .map(|f| f.content.as_str())
            .filter(|c| !c.is_empty())
            .unwrap_or(self.query.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(code: &str) -> ActionPayload {
        ActionPayload::ApplyEdit {
            source: EditSource::Refactor,
            path: None,
            code: code.to_string(),
            changes: None,
        }
    }

    #[test]
    fn test_intent_round_trip_names() {
        for intent in Intent::CLASSIFIABLE {
            assert_eq!(Intent::parse(intent.as_str()), Some(intent));
            let json = serde_json::to_string(&intent).unwrap();
            assert_eq!(json, format!("\"{}\"", intent.as_str()));
        }
        assert_eq!(Intent::parse(" Folder_List "), Some(Intent::FolderList));
        assert_eq!(Intent::parse("launch_rockets"), None);
    }

    #[test]
    fn test_pending_derived_from_payload() {
        let mut state = WorkingState::new("refactor this");
        assert!(state.pending_action().is_none());
        assert!(state.action_payload().is_none());

        state.propose(edit("x = 1"));
        assert_eq!(state.pending_action(), Some(PendingAction::ConfirmEdit));
        assert!(state.action_payload().is_some());
    }

    #[test]
    fn test_new_proposal_replaces_old() {
        let mut state = WorkingState::new("q");
        state.propose(edit("first"));
        state.propose(ActionPayload::DeleteFile {
            path: "a.py".to_string(),
        });
        assert_eq!(state.pending_action(), Some(PendingAction::Delete));
        assert_eq!(state.action_payload().unwrap().path(), Some("a.py"));

        let taken = state.clear_pending();
        assert!(taken.is_some());
        assert!(state.pending_action().is_none());
    }

    #[test]
    fn test_payload_wire_shape() {
        let payload = ActionPayload::ApplyEdit {
            source: EditSource::FileEdit,
            path: Some("src/app.py".to_string()),
            code: "print(2)".to_string(),
            changes: Some("bumped".to_string()),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["mutation"], "apply_edit");
        assert_eq!(json["source"], "file_edit");
        assert_eq!(json["path"], "src/app.py");

        let run = serde_json::to_value(ActionPayload::RunCode {
            code: "1".to_string(),
        })
        .unwrap();
        assert_eq!(run["mutation"], "run_code");
        assert_eq!(
            serde_json::to_value(PendingAction::ConfirmEdit).unwrap(),
            "confirm_edit"
        );
    }

    #[test]
    fn test_confidence_clamped() {
        let mut state = WorkingState::new("q");
        state.set_confidence(1.7);
        assert_eq!(state.confidence(), Some(1.0));
        state.set_confidence(-0.2);
        assert_eq!(state.confidence(), Some(0.0));
        state.set_confidence(f32::NAN);
        assert_eq!(state.confidence(), Some(0.0));
    }

    #[test]
    fn test_working_code_prefers_file() {
        let state = WorkingState::new("explain this");
        assert_eq!(state.working_code(), "explain this");

        let state = state.with_file_context(FileContext::new("main.rs", "fn main() {}"));
        assert_eq!(state.working_code(), "fn main() {}");
        assert_eq!(
            state.file_context.as_ref().unwrap().detected_language.as_deref(),
            Some("rust")
        );
    }

    #[test]
    fn test_state_serializes_fully() {
        let mut state = WorkingState::new("refactor: def f(): pass")
            .with_file_context(FileContext::new("a.py", "def f(): pass"));
        state.classify(Intent::Refactor, 0.95);
        state.propose(edit("def f():\n    pass"));
        state.record_tool(ToolLogEntry::new(
            "read_file",
            serde_json::json!({"path": "a.py"}),
            "def f(): pass",
            true,
        ));
        state.handled_by = Some("refactor".to_string());

        let json = serde_json::to_string(&state).unwrap();
        let restored: WorkingState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
        assert_eq!(restored.query(), "refactor: def f(): pass");
    }

    #[test]
    fn test_tool_log_summary_is_first_line() {
        let entry = ToolLogEntry::new("list_files", Value::Null, "root/\n    a.py", true);
        assert_eq!(entry.summary, "root/");
    }
}
