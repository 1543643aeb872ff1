//! Producer Handlers
//!
//! Content-only handlers: they call the generator and render its reply.

use super::{
    fence_language, json_bullets, json_text, prompt_code, Handler, HandlerContext, HandlerKind,
    HandlerResult,
};
use crate::models::state::WorkingState;

const CODER_SYSTEM_PROMPT: &str =
    "You are an expert programming assistant. Write clean, correct, idiomatic code.";

const JSON_ONLY: &str = "Respond ONLY with valid JSON, no markdown.";

fn non_empty(code: String) -> Option<String> {
    if code.trim().is_empty() {
        None
    } else {
        Some(code)
    }
}

// ============================================================================
// generate
// ============================================================================

/// Answers a request, with code when it needs some.
pub struct GenerateHandler;

impl Handler for GenerateHandler {
    fn name(&self) -> &'static str {
        "generate"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Producer
    }

    fn handle(&self, mut state: WorkingState, ctx: &HandlerContext) -> HandlerResult<WorkingState> {
        let prompt = format!(
            "Answer this request. Return JSON:\n\
             {{\"code\": \"code if needed\", \"explanation\": \"your answer\"}}\n\n\
             Request: {}\n\n{}",
            state.query(),
            JSON_ONLY
        );
        let reply = ctx.generator().generate_json(CODER_SYSTEM_PROMPT, &prompt)?;

        let code = non_empty(json_text(&reply, "code"));
        let explanation = json_text(&reply, "explanation");
        state.result_text = match &code {
            Some(code) => format!("{}\n\n```\n{}\n```", explanation, code),
            None => explanation,
        };
        state.produced_code = code;
        Ok(state)
    }
}

// ============================================================================
// common
// ============================================================================

/// Plain conversation.
pub struct CommonHandler;

impl Handler for CommonHandler {
    fn name(&self) -> &'static str {
        "common"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Producer
    }

    fn handle(&self, mut state: WorkingState, ctx: &HandlerContext) -> HandlerResult<WorkingState> {
        let reply = ctx.generator().generate(
            "You are a friendly coding assistant. Reply briefly and conversationally.",
            state.query(),
        )?;
        state.result_text = reply.trim().to_string();
        Ok(state)
    }
}

// ============================================================================
// debug
// ============================================================================

/// Finds issues and proposes fixed code (shown, not applied).
pub struct DebugHandler;

impl Handler for DebugHandler {
    fn name(&self) -> &'static str {
        "debug"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Producer
    }

    fn handle(&self, mut state: WorkingState, ctx: &HandlerContext) -> HandlerResult<WorkingState> {
        let prompt = format!(
            "Debug this code. Return JSON:\n\
             {{\"issues\": [\"issue1\"], \"fixed_code\": \"code\", \"explanation\": \"what was fixed\"}}\n\n\
             Request: {}\n\nCode: {}\n\n{}",
            state.query(),
            prompt_code(&state),
            JSON_ONLY
        );
        let reply = ctx.generator().generate_json(CODER_SYSTEM_PROMPT, &prompt)?;

        let fixed = json_text(&reply, "fixed_code");
        state.result_text = format!(
            "**Issues:**\n{}\n\n**Fix:**\n{}\n\n```{}\n{}\n```",
            json_bullets(&reply, "issues"),
            json_text(&reply, "explanation"),
            fence_language(&state),
            fixed
        );
        state.produced_code = non_empty(fixed);
        Ok(state)
    }
}

// ============================================================================
// explain
// ============================================================================

pub struct ExplainHandler;

impl Handler for ExplainHandler {
    fn name(&self) -> &'static str {
        "explain"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Producer
    }

    fn handle(&self, mut state: WorkingState, ctx: &HandlerContext) -> HandlerResult<WorkingState> {
        let prompt = format!("Explain this code clearly:\n{}", prompt_code(&state));
        let reply = ctx.generator().generate(
            "You explain code step by step for readers of any skill level.",
            &prompt,
        )?;
        state.result_text = format!("**Explanation:**\n\n{}", reply.trim());
        Ok(state)
    }
}

// ============================================================================
// code_review
// ============================================================================

pub struct CodeReviewHandler;

impl Handler for CodeReviewHandler {
    fn name(&self) -> &'static str {
        "code_review"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Producer
    }

    fn handle(&self, mut state: WorkingState, ctx: &HandlerContext) -> HandlerResult<WorkingState> {
        let prompt = format!(
            "Review this code. Return JSON:\n\
             {{\"score\": 8, \"issues\": [\"issue\"], \"suggestions\": [\"tip\"]}}\n\n\
             Code:\n```\n{}\n```\n\n{}",
            prompt_code(&state),
            JSON_ONLY
        );
        let reply = ctx.generator().generate_json(
            "You are a meticulous code reviewer. Score quality from 1 to 10.",
            &prompt,
        )?;

        let score = match json_text(&reply, "score") {
            s if s.trim().is_empty() => "7".to_string(),
            s => s,
        };
        state.result_text = format!(
            "## Code Review ({}/10)\n\n**Issues:**\n{}\n\n**Suggestions:**\n{}",
            score,
            json_bullets(&reply, "issues"),
            json_bullets(&reply, "suggestions")
        );
        Ok(state)
    }
}

// ============================================================================
// test_gen
// ============================================================================

pub struct TestGenHandler;

impl Handler for TestGenHandler {
    fn name(&self) -> &'static str {
        "test_gen"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Producer
    }

    fn handle(&self, mut state: WorkingState, ctx: &HandlerContext) -> HandlerResult<WorkingState> {
        let prompt = format!(
            "Generate tests. Return JSON:\n\
             {{\"tests\": \"test code\", \"description\": \"what is tested\"}}\n\n\
             Code:\n```\n{}\n```\n\n{}",
            prompt_code(&state),
            JSON_ONLY
        );
        let reply = ctx.generator().generate_json(CODER_SYSTEM_PROMPT, &prompt)?;

        let tests = json_text(&reply, "tests");
        state.result_text = format!(
            "## Generated Tests\n\n{}\n\n```{}\n{}\n```",
            json_text(&reply, "description"),
            fence_language(&state),
            tests
        );
        state.produced_code = non_empty(tests);
        Ok(state)
    }
}
