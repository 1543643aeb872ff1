//! read_file: return a file's contents as text.

use async_trait::async_trait;
use serde_json::Value;
use will_of_code_core::{CoreResult, ToolContext, ToolDefinitionTrait, ToolExecutable};

use super::{io_failure, required_str};
use crate::executor::names;

pub struct ReadFileTool;

impl ReadFileTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReadFileTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolDefinitionTrait for ReadFileTool {
    fn name(&self) -> &str {
        names::READ_FILE
    }

    fn description(&self) -> &str {
        "Read and return the contents of a file"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File to read" }
            },
            "required": ["path"]
        })
    }
}

#[async_trait]
impl ToolExecutable for ReadFileTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> CoreResult<Value> {
        let path = ctx.resolve(required_str(&args, "path")?);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| io_failure("Failed to read file", &path, e))?;
        Ok(Value::String(content))
    }
}
