//! Tool Wire Types
//!
//! Every tool call crosses the bridge as `{tool_name, params}` and comes
//! back as plain text. A failed call is text that starts with
//! `TOOL_ERROR_PREFIX`; nothing else signals failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix that marks a tool reply as an error.
pub const TOOL_ERROR_PREFIX: &str = "ERROR: ";

/// Wire names of the tools the bridge knows about.
pub mod names {
    pub const READ_FILE: &str = "read_file";
    pub const WRITE_FILE: &str = "write_file";
    pub const DELETE_FILE: &str = "delete_file";
    pub const LIST_FILES: &str = "list_files";
    pub const EXECUTE_CODE: &str = "execute_code";
}

/// Whether a tool reply reports failure.
pub fn is_tool_error(reply: &str) -> bool {
    reply.starts_with(TOOL_ERROR_PREFIX)
}

/// Render a failure reason as a tool reply.
pub fn tool_error(reason: impl std::fmt::Display) -> String {
    format!("{}{}", TOOL_ERROR_PREFIX, reason)
}

/// A single tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub tool_name: String,
    pub params: Value,
    /// Conversation thread the call is made for; used for log correlation
    /// only and never sent to the tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl ToolRequest {
    pub fn new(tool_name: impl Into<String>, params: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            params,
            thread_id: None,
        }
    }

    pub fn read_file(path: &str) -> Self {
        Self::new(names::READ_FILE, serde_json::json!({ "path": path }))
    }

    pub fn write_file(path: &str, content: &str) -> Self {
        Self::new(
            names::WRITE_FILE,
            serde_json::json!({ "path": path, "content": content }),
        )
    }

    pub fn delete_file(path: &str) -> Self {
        Self::new(names::DELETE_FILE, serde_json::json!({ "path": path }))
    }

    pub fn list_files(directory: &str) -> Self {
        Self::new(names::LIST_FILES, serde_json::json!({ "directory": directory }))
    }

    pub fn execute_code(code: &str) -> Self {
        Self::new(names::EXECUTE_CODE, serde_json::json!({ "code": code }))
    }

    /// Tag the request with the thread it belongs to.
    pub fn for_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }
}
