//! write_file: create or overwrite a file, creating parent directories.

use async_trait::async_trait;
use serde_json::Value;
use will_of_code_core::{CoreResult, ToolContext, ToolDefinitionTrait, ToolExecutable};

use super::{io_failure, required_str};
use crate::executor::names;

pub struct WriteFileTool;

impl WriteFileTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WriteFileTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolDefinitionTrait for WriteFileTool {
    fn name(&self) -> &str {
        names::WRITE_FILE
    }

    fn description(&self) -> &str {
        "Write content to a file (creates or overwrites). Creates parent directories as needed."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File to write" },
                "content": { "type": "string", "description": "Full new file content" }
            },
            "required": ["path", "content"]
        })
    }

    fn is_mutating(&self) -> bool {
        true
    }
}

#[async_trait]
impl ToolExecutable for WriteFileTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> CoreResult<Value> {
        let path = ctx.resolve(required_str(&args, "path")?);
        let content = required_str(&args, "content")?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| io_failure("Failed to create directories for", &path, e))?;
            }
        }

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| io_failure("Failed to write file", &path, e))?;

        tracing::info!(path = %path.display(), bytes = content.len(), "File written");
        Ok(Value::String(format!("File saved: {}", path.display())))
    }
}
