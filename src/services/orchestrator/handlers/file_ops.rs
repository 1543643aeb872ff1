//! File Operation Handlers
//!
//! `file_read` and `folder_list` use the read-only tools directly.
//! `file_write`, `file_delete` and `run_code` only propose; the approval gate
//! performs the operation after an accept.

use tracing::warn;

use super::{fence_language, Handler, HandlerContext, HandlerError, HandlerKind, HandlerResult};
use crate::models::state::{ActionPayload, EditSource, FileContext, WorkingState};
use crate::services::orchestrator::constants::ANALYSIS_CODE_LIMIT;
use crate::services::orchestrator::path_utils::{
    display_name, extract_fenced_block, extract_file_path, extract_path, text_after_colon,
    truncate_chars,
};
use will_of_code_tools::names;

// ============================================================================
// file_read
// ============================================================================

/// Reads the named file, loads it as the file context and summarizes it.
pub struct FileReadHandler;

impl Handler for FileReadHandler {
    fn name(&self) -> &'static str {
        "file_read"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Producer
    }

    fn handle(&self, mut state: WorkingState, ctx: &HandlerContext) -> HandlerResult<WorkingState> {
        let path = extract_file_path(state.query()).ok_or_else(|| {
            HandlerError::missing_input(
                "Please provide a file path, e.g. `read file: /path/to/file.py`",
            )
        })?;

        let content = ctx
            .tools()
            .read_file(&path)
            .map_err(|reply| HandlerError::Tool {
                tool: names::READ_FILE.to_string(),
                reply,
            })?;

        let prompt = format!(
            "Briefly analyze this code:\n```\n{}\n```",
            truncate_chars(&content, ANALYSIS_CODE_LIMIT)
        );
        let analysis = match ctx
            .generator()
            .generate("You summarize source files for a developer.", &prompt)
        {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(path = %path, error = %e, "File analysis failed");
                format!("(analysis unavailable: {})", e)
            }
        };

        state.result_text = format!("**File: {}**\n\n{}", display_name(&path), analysis);
        state.file_context = Some(FileContext::new(path, content));
        Ok(state)
    }
}

// ============================================================================
// folder_list
// ============================================================================

/// Lists the named directory, or the workspace root.
pub struct FolderListHandler;

impl FolderListHandler {
    fn directory(query: &str) -> String {
        extract_path(query)
            .or_else(|| {
                text_after_colon(query)
                    .filter(|rest| !rest.contains(char::is_whitespace))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| ".".to_string())
    }
}

impl Handler for FolderListHandler {
    fn name(&self) -> &'static str {
        "folder_list"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Producer
    }

    fn handle(&self, mut state: WorkingState, ctx: &HandlerContext) -> HandlerResult<WorkingState> {
        let directory = Self::directory(state.query());
        let listing = ctx
            .tools()
            .list_files(&directory)
            .map_err(|reply| HandlerError::Tool {
                tool: names::LIST_FILES.to_string(),
                reply,
            })?;

        state.result_text = format!("**Files in {}:**\n```\n{}\n```", directory, listing);
        Ok(state)
    }
}

// ============================================================================
// file_write
// ============================================================================

/// Proposes writing a fenced code block (or the loaded file) to a path.
pub struct FileWriteHandler;

impl Handler for FileWriteHandler {
    fn name(&self) -> &'static str {
        "file_write"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Mutator
    }

    fn handle(&self, mut state: WorkingState, _ctx: &HandlerContext) -> HandlerResult<WorkingState> {
        let path = extract_file_path(state.query());
        let content = extract_fenced_block(state.query()).or_else(|| {
            state
                .file_context
                .as_ref()
                .map(|f| f.content.clone())
                .filter(|c| !c.is_empty())
        });

        let (path, content) = match (path, content) {
            (Some(path), Some(content)) => (path, content),
            _ => {
                return Err(HandlerError::missing_input(
                    "Please specify a file path and content to write.",
                ))
            }
        };

        state.result_text = format!(
            "**Write Confirmation Required**\n\n\
             Write {} line(s) to `{}`:\n```{}\n{}\n```",
            content.lines().count(),
            path,
            fence_language(&state),
            content
        );
        state.produced_code = Some(content.clone());
        state.propose(ActionPayload::ApplyEdit {
            source: EditSource::FileWrite,
            path: Some(path),
            code: content,
            changes: None,
        });
        Ok(state)
    }
}

// ============================================================================
// file_delete
// ============================================================================

pub struct FileDeleteHandler;

impl Handler for FileDeleteHandler {
    fn name(&self) -> &'static str {
        "file_delete"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Mutator
    }

    fn handle(&self, mut state: WorkingState, _ctx: &HandlerContext) -> HandlerResult<WorkingState> {
        let path = extract_file_path(state.query()).ok_or_else(|| {
            HandlerError::missing_input("Please specify a file path to delete.")
        })?;

        state.result_text = format!(
            "**Delete Confirmation Required**\n\nAre you sure you want to delete:\n`{}`",
            path
        );
        state.propose(ActionPayload::DeleteFile { path });
        Ok(state)
    }
}

// ============================================================================
// run_code
// ============================================================================

/// Proposes running code taken from a fenced block or the text after `:`.
pub struct RunCodeHandler;

impl Handler for RunCodeHandler {
    fn name(&self) -> &'static str {
        "run_code"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Mutator
    }

    fn handle(&self, mut state: WorkingState, _ctx: &HandlerContext) -> HandlerResult<WorkingState> {
        let code = extract_fenced_block(state.query())
            .or_else(|| text_after_colon(state.query()).map(str::to_string))
            .ok_or_else(|| HandlerError::missing_input("No code provided to execute."))?;

        state.result_text = format!(
            "**Run Code - Confirmation Required**\n\nCode to execute:\n```{}\n{}\n```",
            fence_language(&state),
            code
        );
        state.produced_code = Some(code.clone());
        state.propose(ActionPayload::RunCode { code });
        Ok(state)
    }
}
