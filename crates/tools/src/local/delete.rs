//! delete_file: remove a single file.

use async_trait::async_trait;
use serde_json::Value;
use will_of_code_core::{CoreError, CoreResult, ToolContext, ToolDefinitionTrait, ToolExecutable};

use super::{io_failure, required_str};
use crate::executor::names;

pub struct DeleteFileTool;

impl DeleteFileTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DeleteFileTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolDefinitionTrait for DeleteFileTool {
    fn name(&self) -> &str {
        names::DELETE_FILE
    }

    fn description(&self) -> &str {
        "Delete a file"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File to delete" }
            },
            "required": ["path"]
        })
    }

    fn is_mutating(&self) -> bool {
        true
    }
}

#[async_trait]
impl ToolExecutable for DeleteFileTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> CoreResult<Value> {
        let path = ctx.resolve(required_str(&args, "path")?);

        if path.is_dir() {
            return Err(CoreError::validation(format!(
                "Refusing to delete directory: {}",
                path.display()
            )));
        }

        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| io_failure("Failed to delete file", &path, e))?;

        tracing::info!(path = %path.display(), "File deleted");
        Ok(Value::String(format!("File deleted: {}", path.display())))
    }
}
