//! execute_code: run a snippet through the configured interpreter.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use will_of_code_core::{
    CoreError, CoreResult, ExecutionContext, ToolContext, ToolDefinitionTrait, ToolExecutable,
};

use super::required_str;
use crate::executor::names;

/// Output longer than this is cut off.
pub const MAX_OUTPUT_CHARS: usize = 30_000;
const TRUNCATION_MARKER: &str = "\n\n... (output truncated)";

pub struct ExecuteCodeTool {
    interpreter: String,
    timeout: Duration,
}

impl ExecuteCodeTool {
    pub fn new(interpreter: impl Into<String>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
        }
    }
}

/// Cut `text` to at most `max` characters, appending a marker when cut.
fn truncate_output(mut text: String, max: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max) {
        text.truncate(idx);
        text.push_str(TRUNCATION_MARKER);
    }
    text
}

async fn drain<R: AsyncReadExt + Unpin>(reader: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut r) = reader {
        let _ = r.read_to_end(&mut buf).await;
    }
    buf
}

impl ToolDefinitionTrait for ExecuteCodeTool {
    fn name(&self) -> &str {
        names::EXECUTE_CODE
    }

    fn description(&self) -> &str {
        "Execute code with the configured interpreter and return its output"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "code": { "type": "string", "description": "Source to execute" }
            },
            "required": ["code"]
        })
    }

    fn is_mutating(&self) -> bool {
        true
    }
}

#[async_trait]
impl ToolExecutable for ExecuteCodeTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> CoreResult<Value> {
        let code = required_str(&args, "code")?;

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg("-c")
            .arg(code)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if ctx.workspace_root().is_dir() {
            cmd.current_dir(ctx.workspace_root());
        }

        let mut child = cmd.spawn().map_err(|e| {
            CoreError::execution(format!("Failed to start '{}': {}", self.interpreter, e))
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Pipes are drained concurrently with the wait so a chatty child
        // cannot block on a full pipe.
        let waited = tokio::time::timeout(self.timeout, async {
            tokio::join!(child.wait(), drain(stdout), drain(stderr))
        })
        .await;

        let (status, out, err) = match waited {
            Ok(result) => result,
            Err(_) => {
                let _ = child.kill().await;
                tracing::warn!(
                    interpreter = %self.interpreter,
                    timeout_secs = self.timeout.as_secs(),
                    "Code execution timed out"
                );
                return Err(CoreError::timeout(self.timeout.as_secs()));
            }
        };

        let status = status.map_err(|e| CoreError::execution(format!("Failed to wait: {}", e)))?;
        let stdout = String::from_utf8_lossy(&out);
        let stderr = String::from_utf8_lossy(&err);

        let mut text = stdout.to_string();
        if !stderr.is_empty() {
            text.push_str("\nStderr:\n");
            text.push_str(&stderr);
        }
        let text = truncate_output(text, MAX_OUTPUT_CHARS);

        if status.success() {
            if text.is_empty() {
                return Ok(Value::String("Code executed (no output)".to_string()));
            }
            Ok(Value::String(text))
        } else {
            let exit_code = status.code().unwrap_or(-1);
            Err(CoreError::execution(format!(
                "exit code {}\n{}",
                exit_code, text
            )))
        }
    }
}
