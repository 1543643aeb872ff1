//! Edit Handlers
//!
//! Mutators that rewrite code and propose the rewrite as an `apply_edit`.
//! Nothing is written until the approval gate commits the proposal.

use super::{
    edit_target, fence_language, json_bullets, json_text, prompt_code, required_code, Handler,
    HandlerContext, HandlerError, HandlerKind, HandlerResult,
};
use crate::models::state::{ActionPayload, EditSource, WorkingState};

const EDITOR_SYSTEM_PROMPT: &str = "You are an expert software engineer editing existing code. \
Return complete code, never fragments.";

const JSON_ONLY: &str = "Respond ONLY with valid JSON, no markdown.";

/// Record an edit proposal on the state.
fn propose_edit(
    state: &mut WorkingState,
    source: EditSource,
    code: String,
    changes: Option<String>,
) {
    let path = edit_target(state);
    state.produced_code = Some(code.clone());
    state.propose(ActionPayload::ApplyEdit {
        source,
        path,
        code,
        changes: changes.filter(|c| !c.trim().is_empty()),
    });
}

/// Footer telling the user where an accepted edit would go.
fn target_note(state: &WorkingState) -> String {
    match state.action_payload().and_then(ActionPayload::path) {
        Some(path) => format!("\n\nAccept to write these changes to `{}`.", path),
        None => "\n\nNo target file was named; accepting will not write anything.".to_string(),
    }
}

// ============================================================================
// refactor
// ============================================================================

pub struct RefactorHandler;

impl Handler for RefactorHandler {
    fn name(&self) -> &'static str {
        "refactor"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Mutator
    }

    fn handle(&self, mut state: WorkingState, ctx: &HandlerContext) -> HandlerResult<WorkingState> {
        let prompt = format!(
            "Refactor this code. Return JSON:\n\
             {{\"refactored_code\": \"code\", \"changes\": [\"change1\"]}}\n\n\
             Request: {}\n\nCode:\n```\n{}\n```\n\n{}",
            state.query(),
            prompt_code(&state),
            JSON_ONLY
        );
        let reply = ctx.generator().generate_json(EDITOR_SYSTEM_PROMPT, &prompt)?;

        let code = required_code(&reply, "refactored_code")?;
        let changes = json_bullets(&reply, "changes");
        state.result_text = format!(
            "## Refactored\n\n**Changes:**\n{}\n\n```{}\n{}\n```",
            changes,
            fence_language(&state),
            code
        );
        propose_edit(&mut state, EditSource::Refactor, code, Some(changes));
        state.result_text.push_str(&target_note(&state));
        Ok(state)
    }
}

// ============================================================================
// documentation
// ============================================================================

pub struct DocumentationHandler;

impl Handler for DocumentationHandler {
    fn name(&self) -> &'static str {
        "documentation"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Mutator
    }

    fn handle(&self, mut state: WorkingState, ctx: &HandlerContext) -> HandlerResult<WorkingState> {
        let prompt = format!(
            "Add docstrings and comments. Return JSON:\n\
             {{\"documented_code\": \"code with docs\"}}\n\n\
             Code:\n```\n{}\n```\n\n{}",
            prompt_code(&state),
            JSON_ONLY
        );
        let reply = ctx.generator().generate_json(EDITOR_SYSTEM_PROMPT, &prompt)?;

        let code = required_code(&reply, "documented_code")?;
        state.result_text = format!(
            "## Documented Code\n\n```{}\n{}\n```",
            fence_language(&state),
            code
        );
        propose_edit(&mut state, EditSource::Documentation, code, None);
        state.result_text.push_str(&target_note(&state));
        Ok(state)
    }
}

// ============================================================================
// optimize
// ============================================================================

pub struct OptimizeHandler;

impl Handler for OptimizeHandler {
    fn name(&self) -> &'static str {
        "optimize"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Mutator
    }

    fn handle(&self, mut state: WorkingState, ctx: &HandlerContext) -> HandlerResult<WorkingState> {
        let prompt = format!(
            "Optimize this code. Return JSON:\n\
             {{\"optimized_code\": \"code\", \"improvements\": [\"improvement\"]}}\n\n\
             Code:\n```\n{}\n```\n\n{}",
            prompt_code(&state),
            JSON_ONLY
        );
        let reply = ctx.generator().generate_json(EDITOR_SYSTEM_PROMPT, &prompt)?;

        let code = required_code(&reply, "optimized_code")?;
        let improvements = json_bullets(&reply, "improvements");
        state.result_text = format!(
            "## Optimized\n\n**Improvements:**\n{}\n\n```{}\n{}\n```",
            improvements,
            fence_language(&state),
            code
        );
        propose_edit(&mut state, EditSource::Optimize, code, Some(improvements));
        state.result_text.push_str(&target_note(&state));
        Ok(state)
    }
}

// ============================================================================
// file_edit
// ============================================================================

/// Applies a described change to the loaded file.
pub struct FileEditHandler;

impl Handler for FileEditHandler {
    fn name(&self) -> &'static str {
        "file_edit"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Mutator
    }

    fn handle(&self, mut state: WorkingState, ctx: &HandlerContext) -> HandlerResult<WorkingState> {
        let file = match state.file_context.as_ref() {
            Some(file) if !file.content.is_empty() => file,
            _ => {
                return Err(HandlerError::missing_input(
                    "Open a file first, then describe the change you want made to it.",
                ))
            }
        };

        let prompt = format!(
            "You are editing a file. Make ONLY the requested change.\n\
             Return the COMPLETE file content with your modification applied; \
             include every line of the original.\n\n\
             Return JSON:\n\
             {{\"modified_code\": \"the complete file\", \"changes\": \"brief description\"}}\n\n\
             User request: {}\n\n\
             COMPLETE ORIGINAL FILE:\n```\n{}\n```\n\n{}",
            state.query(),
            file.content,
            JSON_ONLY
        );
        let reply = ctx.generator().generate_json(EDITOR_SYSTEM_PROMPT, &prompt)?;

        let code = required_code(&reply, "modified_code")?;
        let changes = match json_text(&reply, "changes") {
            c if c.trim().is_empty() => "Code modified".to_string(),
            c => c,
        };
        state.result_text = format!("## Changes Made\n\n{}", changes);
        propose_edit(&mut state, EditSource::FileEdit, code, Some(changes));
        state.result_text.push_str(&target_note(&state));
        Ok(state)
    }
}
