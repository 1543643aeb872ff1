//! Handlers
//!
//! One stateless transformation per intent. Producers return content;
//! Mutators propose a mutation through `WorkingState::propose` and never
//! perform it. Handlers see the Tool Bridge only through `ReadOnlyTools`.
//!
//! - `producers.rs` - generate, common, debug, explain, code_review, test_gen
//! - `edits.rs` - refactor, documentation, optimize, file_edit
//! - `file_ops.rs` - file_read, folder_list, file_write, file_delete, run_code

pub mod edits;
pub mod file_ops;
pub mod producers;

use std::sync::{Arc, Mutex};

use serde_json::Value;
use thiserror::Error;
use will_of_code_llm::{LlmError, TextGenerator};
use will_of_code_tools::{is_tool_error, ToolBridge, ToolRequest};

use super::constants::PROMPT_CODE_LIMIT;
use super::path_utils::{extract_command_path, truncate_chars};
use crate::models::state::{ToolLogEntry, WorkingState};

pub use edits::{DocumentationHandler, FileEditHandler, OptimizeHandler, RefactorHandler};
pub use file_ops::{
    FileDeleteHandler, FileReadHandler, FileWriteHandler, FolderListHandler, RunCodeHandler,
};
pub use producers::{
    CodeReviewHandler, CommonHandler, DebugHandler, ExplainHandler, GenerateHandler,
    TestGenHandler,
};

// ============================================================================
// Handler Contract
// ============================================================================

/// Capability class of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Returns content; never leaves a pending action.
    Producer,
    /// Always leaves a fully populated pending action.
    Mutator,
}

/// Handler error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandlerError {
    /// The request lacks something the handler needs; the message is shown
    /// to the user as-is.
    #[error("{0}")]
    MissingInput(String),

    /// The generation collaborator failed
    #[error("Generation failed: {0}")]
    Generation(String),

    /// A read-only tool call failed; `reply` is the bridge's error text
    #[error("{reply}")]
    Tool { tool: String, reply: String },

    /// The generator answered but without the fields the handler needs
    #[error("Invalid reply: {0}")]
    InvalidReply(String),
}

impl HandlerError {
    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput(msg.into())
    }

    pub fn invalid_reply(msg: impl Into<String>) -> Self {
        Self::InvalidReply(msg.into())
    }
}

impl From<LlmError> for HandlerError {
    fn from(err: LlmError) -> Self {
        Self::Generation(err.to_string())
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;

/// A handler for one intent.
pub trait Handler: Send + Sync {
    /// Name recorded as `handled_by`.
    fn name(&self) -> &'static str;

    fn kind(&self) -> HandlerKind;

    fn handle(&self, state: WorkingState, ctx: &HandlerContext) -> HandlerResult<WorkingState>;
}

// ============================================================================
// Handler Context
// ============================================================================

/// Read-only view of the Tool Bridge. Every call is recorded and later
/// appended to the turn's tool log.
pub struct ReadOnlyTools {
    bridge: Arc<dyn ToolBridge>,
    thread_id: String,
    log: Mutex<Vec<ToolLogEntry>>,
}

impl ReadOnlyTools {
    pub fn new(bridge: Arc<dyn ToolBridge>, thread_id: impl Into<String>) -> Self {
        Self {
            bridge,
            thread_id: thread_id.into(),
            log: Mutex::new(Vec::new()),
        }
    }

    /// File contents, or the bridge's `ERROR: ` text.
    pub fn read_file(&self, path: &str) -> Result<String, String> {
        self.call(ToolRequest::read_file(path))
    }

    /// Directory tree, or the bridge's `ERROR: ` text.
    pub fn list_files(&self, directory: &str) -> Result<String, String> {
        self.call(ToolRequest::list_files(directory))
    }

    fn call(&self, request: ToolRequest) -> Result<String, String> {
        let request = request.for_thread(self.thread_id.clone());
        let reply = self.bridge.call(&request);
        let ok = !is_tool_error(&reply);
        let entry = ToolLogEntry::new(request.tool_name.clone(), request.params.clone(), &reply, ok);
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry);
        if ok {
            Ok(reply)
        } else {
            Err(reply)
        }
    }

    /// Take the recorded calls.
    pub fn drain_log(&self) -> Vec<ToolLogEntry> {
        std::mem::take(
            &mut *self
                .log
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

/// Collaborators available to a handler for one turn.
pub struct HandlerContext {
    generator: Arc<dyn TextGenerator>,
    tools: ReadOnlyTools,
    thread_id: String,
}

impl HandlerContext {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        bridge: Arc<dyn ToolBridge>,
        thread_id: impl Into<String>,
    ) -> Self {
        let thread_id = thread_id.into();
        Self {
            generator,
            tools: ReadOnlyTools::new(bridge, thread_id.clone()),
            thread_id,
        }
    }

    pub fn generator(&self) -> &dyn TextGenerator {
        self.generator.as_ref()
    }

    pub fn tools(&self) -> &ReadOnlyTools {
        &self.tools
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// The code a handler operates on, cut to the prompt limit.
pub(crate) fn prompt_code(state: &WorkingState) -> &str {
    truncate_chars(state.working_code(), PROMPT_CODE_LIMIT)
}

/// Where an edit proposal should land: the loaded file, else a path named
/// in the command part of the request. Code after the colon never names
/// the target.
pub(crate) fn edit_target(state: &WorkingState) -> Option<String> {
    state
        .file_context
        .as_ref()
        .map(|f| f.path.clone())
        .filter(|p| !p.is_empty())
        .or_else(|| extract_command_path(state.query()))
}

/// Language tag for code fences.
pub(crate) fn fence_language(state: &WorkingState) -> &str {
    state
        .file_context
        .as_ref()
        .and_then(|f| f.detected_language.as_deref())
        .unwrap_or("")
}

/// String field, empty when absent. Non-string values are rendered as JSON.
pub(crate) fn json_text(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// A list field rendered as `- item` lines; a bare string is one item.
pub(crate) fn json_bullets(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => format!("- {}", s),
                other => format!("- {}", other),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(Value::String(s)) if !s.trim().is_empty() => format!("- {}", s.trim()),
        _ => String::new(),
    }
}

/// A required code field.
pub(crate) fn required_code(value: &Value, key: &str) -> HandlerResult<String> {
    let code = json_text(value, key);
    if code.trim().is_empty() {
        return Err(HandlerError::invalid_reply(format!(
            "reply has no `{}`",
            key
        )));
    }
    Ok(code)
}


#[cfg(test)]
mod tests {
    use super::test_support::FakeBridge;
    use super::*;
    use crate::models::state::FileContext;
    use will_of_code_tools::names;

    #[test]
    fn test_read_only_tools_record_calls() {
        let mut bridge = FakeBridge::default();
        bridge.files.insert("a.py".to_string(), "print(1)".to_string());
        let tools = ReadOnlyTools::new(Arc::new(bridge), "t-1");

        assert_eq!(tools.read_file("a.py"), Ok("print(1)".to_string()));
        let err = tools.read_file("missing.py").unwrap_err();
        assert!(err.starts_with("ERROR: "));

        let log = tools.drain_log();
        assert_eq!(log.len(), 2);
        assert!(log[0].ok);
        assert!(!log[1].ok);
        assert_eq!(log[0].tool, names::READ_FILE);
        assert!(tools.drain_log().is_empty());
    }

    #[test]
    fn test_edit_target_prefers_loaded_file() {
        let state = WorkingState::new("refactor /tmp/other.py");
        assert_eq!(edit_target(&state), Some("/tmp/other.py".to_string()));

        let state = state.with_file_context(FileContext::new("main.py", "x"));
        assert_eq!(edit_target(&state), Some("main.py".to_string()));

        assert_eq!(edit_target(&WorkingState::new("refactor: x = 1")), None);
    }

    #[test]
    fn test_edit_target_skips_literals_in_code() {
        let cases = [
            "refactor: def greet(): return 'greeting'",
            "refactor: open('/tmp/x', 'w').write(data)",
            "optimize: for line in open(\"/var/log/app.log\"): pass",
        ];
        for query in cases {
            assert_eq!(edit_target(&WorkingState::new(query)), None, "{}", query);
        }
    }

    #[test]
    fn test_json_helpers() {
        let v = serde_json::json!({
            "list": ["a", 2],
            "one": "single",
            "score": 8,
            "empty": ""
        });
        assert_eq!(json_bullets(&v, "list"), "- a\n- 2");
        assert_eq!(json_bullets(&v, "one"), "- single");
        assert_eq!(json_bullets(&v, "missing"), "");
        assert_eq!(json_text(&v, "score"), "8");
        assert!(required_code(&v, "empty").is_err());
        assert_eq!(required_code(&v, "one").unwrap(), "single");
    }

    #[test]
    fn test_prompt_code_truncated() {
        let long = "x".repeat(PROMPT_CODE_LIMIT + 100);
        let state = WorkingState::new("q").with_file_context(FileContext::new("a.py", long));
        assert_eq!(prompt_code(&state).chars().count(), PROMPT_CODE_LIMIT);
    }
}
