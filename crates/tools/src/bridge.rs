//! Tool Bridge
//!
//! Synchronous facade over the tool host. Callers on blocking threads get
//! text back for every call; failures are `ERROR: ` strings, never panics or
//! `Err` values.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};
use will_of_code_core::{BlockingRunner, CoreError, CoreResult, ToolContext, UnifiedToolRegistry};

use crate::executor::{is_tool_error, tool_error, ToolRequest};

/// Default bound on a single tool call.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Synchronous tool invocation.
pub trait ToolBridge: Send + Sync {
    /// Invoke a tool and return its text reply.
    fn call(&self, request: &ToolRequest) -> String;

    fn read_file(&self, path: &str) -> String {
        self.call(&ToolRequest::read_file(path))
    }

    fn write_file(&self, path: &str, content: &str) -> String {
        self.call(&ToolRequest::write_file(path, content))
    }

    fn delete_file(&self, path: &str) -> String {
        self.call(&ToolRequest::delete_file(path))
    }

    fn list_files(&self, directory: &str) -> String {
        self.call(&ToolRequest::list_files(directory))
    }

    fn execute_code(&self, code: &str) -> String {
        self.call(&ToolRequest::execute_code(code))
    }
}

/// `ToolBridge` that executes tools from a `UnifiedToolRegistry` on a
/// dedicated runtime.
pub struct RegistryToolBridge {
    registry: Arc<UnifiedToolRegistry>,
    runner: BlockingRunner,
    timeout: Duration,
    workspace_root: PathBuf,
}

impl RegistryToolBridge {
    pub fn new(
        registry: Arc<UnifiedToolRegistry>,
        workspace_root: impl Into<PathBuf>,
        timeout: Duration,
    ) -> CoreResult<Self> {
        info!(
            tools = ?registry.names(),
            mutating = ?registry.mutating_tools(),
            "Tool bridge ready"
        );
        Ok(Self {
            registry,
            runner: BlockingRunner::new("tool-bridge")?,
            timeout,
            workspace_root: workspace_root.into(),
        })
    }

    fn render(value: Value) -> String {
        match value {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }
}

impl ToolBridge for RegistryToolBridge {
    fn call(&self, request: &ToolRequest) -> String {
        let name = request.tool_name.clone();
        if !self.registry.contains(&name) {
            return tool_error(format!("Tool '{}' not found", name));
        }

        let thread_id = request.thread_id.clone().unwrap_or_default();
        let ctx = ToolContext::new(
            thread_id.clone(),
            self.workspace_root.clone(),
            uuid::Uuid::new_v4().to_string(),
        );
        let registry = self.registry.clone();
        let params = request.params.clone();
        let tool = name.clone();

        debug!(tool = %name, thread_id = %thread_id, "Invoking tool");
        let outcome = self.runner.run(self.timeout, async move {
            registry.execute(&tool, &ctx, params).await
        });

        let reply = match outcome {
            Ok(Ok(value)) => Self::render(value),
            Ok(Err(err)) => tool_error(err),
            Err(CoreError::Timeout { secs }) => {
                tool_error(format!("Tool '{}' timed out after {}s", name, secs))
            }
            Err(err) => tool_error(err),
        };

        if is_tool_error(&reply) {
            warn!(tool = %name, thread_id = %thread_id, reply = %reply, "Tool call failed");
        }
        reply
    }
}
