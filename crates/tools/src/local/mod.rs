//! Local Tool Host
//!
//! In-process implementations of the five bridge tools. Relative paths
//! resolve against the workspace root carried by `ToolContext`.
//!
//! `execute_code` runs the configured interpreter as a child process. It is
//! not a sandbox; deployments that accept untrusted input must route it to
//! an isolated host instead.

mod delete;
mod execute;
mod list;
mod read;
mod write;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use will_of_code_core::{CoreError, CoreResult, UnifiedToolRegistry};

pub use delete::DeleteFileTool;
pub use execute::ExecuteCodeTool;
pub use list::ListFilesTool;
pub use read::ReadFileTool;
pub use write::WriteFileTool;

/// Settings for the local tool host.
#[derive(Debug, Clone)]
pub struct LocalToolConfig {
    /// Interpreter invoked as `<interpreter> -c <code>`.
    pub interpreter: String,
    /// Wall-clock limit for a single `execute_code` run.
    pub exec_timeout: Duration,
}

impl Default for LocalToolConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            exec_timeout: Duration::from_secs(30),
        }
    }
}

/// Register all local tools into `registry`.
pub fn register_local_tools(registry: &mut UnifiedToolRegistry, config: &LocalToolConfig) {
    registry.register(Arc::new(ReadFileTool::new()));
    registry.register(Arc::new(WriteFileTool::new()));
    registry.register(Arc::new(DeleteFileTool::new()));
    registry.register(Arc::new(ListFilesTool::new()));
    registry.register(Arc::new(ExecuteCodeTool::new(
        config.interpreter.clone(),
        config.exec_timeout,
    )));
}

/// Build a registry containing only the local tools.
pub fn local_registry(config: &LocalToolConfig) -> UnifiedToolRegistry {
    let mut registry = UnifiedToolRegistry::new();
    register_local_tools(&mut registry, config);
    registry
}

/// Fetch a required string argument.
fn required_str<'a>(args: &'a Value, key: &str) -> CoreResult<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| CoreError::validation(format!("Missing required parameter: {}", key)))
}

/// Map an I/O failure on `path` to a tool error with the path attached.
fn io_failure(action: &str, path: &std::path::Path, err: std::io::Error) -> CoreError {
    match err.kind() {
        std::io::ErrorKind::NotFound => {
            CoreError::not_found(format!("{}: {}", action, path.display()))
        }
        _ => CoreError::internal(format!("{} {}: {}", action, path.display(), err)),
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use std::path::Path;
    use will_of_code_core::ToolContext;

    pub fn make_ctx(dir: &Path) -> ToolContext {
        ToolContext::new("test-thread", dir.to_path_buf(), "tc-test")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_registry_contents() {
        let registry = local_registry(&LocalToolConfig::default());
        assert_eq!(
            registry.names(),
            vec!["read_file", "write_file", "delete_file", "list_files", "execute_code"]
        );
        assert_eq!(
            registry.mutating_tools(),
            vec!["write_file", "delete_file", "execute_code"]
        );
    }

    #[test]
    fn test_required_str() {
        let args = serde_json::json!({"path": "a.txt", "n": 3});
        assert_eq!(required_str(&args, "path").unwrap(), "a.txt");
        assert!(required_str(&args, "n").is_err());
        let err = required_str(&args, "content").unwrap_err();
        assert!(err.to_string().contains("Missing required parameter: content"));
    }
}
