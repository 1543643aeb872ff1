//! list_files: render a directory as an indented tree.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use will_of_code_core::{CoreError, CoreResult, ToolContext, ToolDefinitionTrait, ToolExecutable};

use super::required_str;
use crate::executor::names;

/// Deepest level rendered below the requested directory.
const MAX_DEPTH: usize = 2;
/// Files shown per directory.
const MAX_FILES_PER_DIR: usize = 20;
const INDENT: &str = "    ";

pub struct ListFilesTool;

impl ListFilesTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ListFilesTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorted (files, subdirectories) of `dir`. Unreadable entries are skipped.
fn read_sorted(dir: &Path) -> std::io::Result<(Vec<String>, Vec<String>)> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)?.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            dirs.push(name);
        } else {
            files.push(name);
        }
    }
    files.sort();
    dirs.sort();
    Ok((files, dirs))
}

fn walk(dir: &Path, label: &str, level: usize, out: &mut Vec<String>) -> std::io::Result<bool> {
    let (files, dirs) = read_sorted(dir)?;
    out.push(format!("{}{}/", INDENT.repeat(level), label));

    let child_indent = INDENT.repeat(level + 1);
    for file in files.iter().take(MAX_FILES_PER_DIR) {
        out.push(format!("{}{}", child_indent, file));
    }
    if files.len() > MAX_FILES_PER_DIR {
        out.push(format!(
            "{}... ({} more files)",
            child_indent,
            files.len() - MAX_FILES_PER_DIR
        ));
    }

    if level < MAX_DEPTH {
        for sub in &dirs {
            // Subdirectories that vanish or deny access mid-walk are skipped.
            let _ = walk(&dir.join(sub), sub, level + 1, out);
        }
    }

    Ok(!files.is_empty() || !dirs.is_empty())
}

/// Render `dir` as a tree (depth-limited, sorted).
pub fn render_tree(dir: &Path) -> CoreResult<String> {
    if !dir.exists() {
        return Err(CoreError::not_found(format!(
            "Directory not found: {}",
            dir.display()
        )));
    }
    if !dir.is_dir() {
        return Err(CoreError::validation(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let label = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| dir.display().to_string());

    let mut lines = Vec::new();
    let has_entries = walk(dir, &label, 0, &mut lines)?;
    if !has_entries {
        return Ok("Empty directory".to_string());
    }
    Ok(lines.join("\n"))
}

impl ToolDefinitionTrait for ListFilesTool {
    fn name(&self) -> &str {
        names::LIST_FILES
    }

    fn description(&self) -> &str {
        "List all files and folders in a directory as a tree"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "directory": { "type": "string", "description": "Directory to list" }
            },
            "required": ["directory"]
        })
    }
}

#[async_trait]
impl ToolExecutable for ListFilesTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> CoreResult<Value> {
        let dir = ctx.resolve(required_str(&args, "directory")?);
        render_tree(&dir).map(Value::String)
    }
}
