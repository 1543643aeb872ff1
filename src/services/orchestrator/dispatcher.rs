//! Handler Registry / Dispatcher
//!
//! Maps a classified intent to exactly one handler and runs it. Handler
//! errors, panics and contract violations are contained here and recorded on
//! the Working State as a `handler_failure`; nothing escapes to the caller.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::constants::{DEFAULT_CLARIFICATION_QUESTION, HANDLER_FAILURE_MESSAGE};
use super::handlers::{
    CodeReviewHandler, CommonHandler, DebugHandler, DocumentationHandler, ExplainHandler,
    FileDeleteHandler, FileEditHandler, FileReadHandler, FileWriteHandler, FolderListHandler,
    GenerateHandler, Handler, HandlerContext, HandlerError, HandlerKind, OptimizeHandler,
    RefactorHandler, RunCodeHandler, TestGenHandler,
};
use crate::models::state::{Intent, TurnFault, WorkingState};

/// Static intent → handler mapping.
pub struct HandlerRegistry {
    handlers: HashMap<Intent, Arc<dyn Handler>>,
    fallback: Arc<dyn Handler>,
}

impl HandlerRegistry {
    /// Registry with no handlers besides the `generate` fallback.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Arc::new(GenerateHandler),
        }
    }

    /// Register a handler for an intent, replacing any existing one.
    pub fn register(&mut self, intent: Intent, handler: Arc<dyn Handler>) {
        self.handlers.insert(intent, handler);
    }

    /// Handler for an intent; unmapped intents get the fallback.
    pub fn resolve(&self, intent: Intent) -> Arc<dyn Handler> {
        self.handlers
            .get(&intent)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Intent::Generate, Arc::new(GenerateHandler));
        registry.register(Intent::Common, Arc::new(CommonHandler));
        registry.register(Intent::Debug, Arc::new(DebugHandler));
        registry.register(Intent::Explain, Arc::new(ExplainHandler));
        registry.register(Intent::CodeReview, Arc::new(CodeReviewHandler));
        registry.register(Intent::TestGen, Arc::new(TestGenHandler));
        registry.register(Intent::FileRead, Arc::new(FileReadHandler));
        registry.register(Intent::FolderList, Arc::new(FolderListHandler));
        registry.register(Intent::Refactor, Arc::new(RefactorHandler));
        registry.register(Intent::Documentation, Arc::new(DocumentationHandler));
        registry.register(Intent::Optimize, Arc::new(OptimizeHandler));
        registry.register(Intent::FileEdit, Arc::new(FileEditHandler));
        registry.register(Intent::FileWrite, Arc::new(FileWriteHandler));
        registry.register(Intent::FileDelete, Arc::new(FileDeleteHandler));
        registry.register(Intent::RunCode, Arc::new(RunCodeHandler));
        registry
    }
}

/// Runs the handler for a classified Working State.
pub struct Dispatcher {
    registry: HandlerRegistry,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Run exactly one handler. Never fails; failures are recorded on the
    /// returned state.
    pub fn dispatch(&self, mut state: WorkingState, ctx: &HandlerContext) -> WorkingState {
        let intent = state.intent.unwrap_or(Intent::Generate);

        if intent == Intent::Clarify {
            let question = state
                .clarification_question
                .get_or_insert_with(|| DEFAULT_CLARIFICATION_QUESTION.to_string())
                .clone();
            state.clear_pending();
            state.result_text = question;
            return state;
        }

        let handler = self.registry.resolve(intent);
        let name = handler.name();
        let snapshot = state.clone();
        debug!(thread_id = %ctx.thread_id(), intent = %intent, handler = name, "Dispatching");

        let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle(state, ctx)));
        let tool_calls = ctx.tools().drain_log();

        let mut result = match outcome {
            Ok(Ok(next)) => Self::enforce_contract(handler.as_ref(), &snapshot, next),
            Ok(Err(err)) => Self::recover(name, snapshot, err),
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(handler = name, reason = %reason, "Handler panicked");
                Self::fail(snapshot, name, format!("panicked: {}", reason))
            }
        };

        for entry in tool_calls {
            result.record_tool(entry);
        }
        result.handled_by = Some(name.to_string());
        info!(
            thread_id = %ctx.thread_id(),
            handler = name,
            pending = result.pending_action().map(|p| p.as_str()).unwrap_or("none"),
            "Handler finished"
        );
        result
    }

    fn enforce_contract(
        handler: &dyn Handler,
        before: &WorkingState,
        mut after: WorkingState,
    ) -> WorkingState {
        let name = handler.name();

        if after.query() != before.query() {
            warn!(handler = name, "Handler replaced the request text");
            return Self::fail(before.clone(), name, "request text was modified");
        }

        match handler.kind() {
            HandlerKind::Producer if after.has_pending() => {
                warn!(handler = name, "Producer returned a pending action");
                after.clear_pending();
                Self::fail(after, name, "producer returned a pending action")
            }
            HandlerKind::Mutator if !after.has_pending() => {
                warn!(handler = name, "Mutator returned without a proposal");
                Self::fail(after, name, "mutator returned without a proposal")
            }
            _ => after,
        }
    }

    fn recover(name: &str, mut state: WorkingState, err: HandlerError) -> WorkingState {
        match err {
            HandlerError::MissingInput(message) => {
                debug!(handler = name, "Missing input");
                state.result_text = message;
                state
            }
            HandlerError::Tool { tool, reply } => {
                warn!(handler = name, tool = %tool, reply = %reply, "Tool call failed");
                state.result_text = reply.clone();
                state.fault = Some(TurnFault::ToolError {
                    tool,
                    reason: reply,
                });
                state
            }
            other => {
                warn!(handler = name, error = %other, "Handler failed");
                Self::fail(state, name, other.to_string())
            }
        }
    }

    fn fail(mut state: WorkingState, handler: &str, reason: impl Into<String>) -> WorkingState {
        state.clear_pending();
        state.result_text = HANDLER_FAILURE_MESSAGE.to_string();
        state.fault = Some(TurnFault::HandlerFailure {
            handler: handler.to_string(),
            reason: reason.into(),
        });
        state
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(HandlerRegistry::default())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
