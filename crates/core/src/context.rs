//! Tool Execution Context
//!
//! `ExecutionContext` is the read-only base shared by anything that runs on
//! behalf of a conversation thread. `ToolContext` adds the per-call
//! identifier and path resolution against the workspace root.
//!
//! Tools receive a `ToolContext` and cannot see the working state of the
//! turn that triggered them.

use std::path::{Path, PathBuf};

/// Base execution context: immutable information about the calling thread.
pub trait ExecutionContext: Send + Sync {
    /// Correlation token of the conversation thread.
    fn thread_id(&self) -> &str;

    /// Root directory that relative paths resolve against.
    fn workspace_root(&self) -> &Path;
}

/// Context for a single tool invocation.
#[derive(Debug, Clone)]
pub struct ToolContext {
    thread_id: String,
    workspace_root: PathBuf,
    /// Unique identifier for this specific tool call.
    tool_call_id: String,
}

impl ToolContext {
    /// Create a new ToolContext.
    pub fn new(
        thread_id: impl Into<String>,
        workspace_root: impl Into<PathBuf>,
        tool_call_id: impl Into<String>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            workspace_root: workspace_root.into(),
            tool_call_id: tool_call_id.into(),
        }
    }

    /// Returns the unique tool call identifier.
    pub fn tool_call_id(&self) -> &str {
        &self.tool_call_id
    }

    /// Resolve a user-supplied path: absolute paths pass through, relative
    /// ones are joined onto the workspace root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.workspace_root.join(candidate)
        }
    }
}

impl ExecutionContext for ToolContext {
    fn thread_id(&self) -> &str {
        &self.thread_id
    }

    fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }
}
