//! Approval Gate
//!
//! Suspends a turn whose Working State carries a pending proposal and settles
//! it later through an explicit resume call. The gate is the only component
//! that performs mutating tool calls, and only after an `accept`.
//!
//! ```text
//! Running ──► Complete
//!    │
//!    └──► Suspended ──► Accepted ──► Complete
//!               │
//!               └────► Rejected ──► Complete
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use will_of_code_tools::{is_tool_error, ToolBridge, ToolRequest};

use crate::models::state::{ActionPayload, ToolLogEntry, TurnFault, WorkingState};
use crate::models::turn::{Decision, ProposalDescriptor, ResumeResponse};
use crate::services::graph_workflow::{Checkpoint, CheckpointStore};
use crate::utils::error::{AppError, AppResult};

pub const REJECTION_MESSAGE: &str = "Changes rejected.";

const UNKNOWN_NODE: &str = "unknown";

// ============================================================================
// Gate State
// ============================================================================

/// Lifecycle of one turn as seen by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Running,
    Suspended,
    Accepted,
    Rejected,
    Complete,
}

impl GateState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateState::Running => "running",
            GateState::Suspended => "suspended",
            GateState::Accepted => "accepted",
            GateState::Rejected => "rejected",
            GateState::Complete => "complete",
        }
    }

    pub fn can_transition_to(&self, next: GateState) -> bool {
        matches!(
            (self, next),
            (GateState::Running, GateState::Complete)
                | (GateState::Running, GateState::Suspended)
                | (GateState::Suspended, GateState::Accepted)
                | (GateState::Suspended, GateState::Rejected)
                | (GateState::Accepted, GateState::Complete)
                | (GateState::Rejected, GateState::Complete)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GateState::Complete)
    }
}

impl std::fmt::Display for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn transition(thread_id: &str, from: GateState, to: GateState) -> GateState {
    if from.can_transition_to(to) {
        info!(thread_id = %thread_id, from = %from, to = %to, "Gate transition");
    } else {
        error!(thread_id = %thread_id, from = %from, to = %to, "Illegal gate transition");
    }
    to
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of running a finished pipeline through the gate.
#[derive(Debug, Clone)]
pub enum GateOutcome {
    /// No proposal; the turn is done.
    Complete(WorkingState),
    /// A checkpoint was stored; the caller must resume.
    Suspended {
        state: WorkingState,
        proposal: ProposalDescriptor,
    },
}

impl GateOutcome {
    pub fn state(&self) -> &WorkingState {
        match self {
            GateOutcome::Complete(state) => state,
            GateOutcome::Suspended { state, .. } => state,
        }
    }

    pub fn proposal(&self) -> Option<&ProposalDescriptor> {
        match self {
            GateOutcome::Complete(_) => None,
            GateOutcome::Suspended { proposal, .. } => Some(proposal),
        }
    }
}

/// A settled proposal: the caller-facing reply plus the final state.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub response: ResumeResponse,
    pub state: WorkingState,
}

// ============================================================================
// Approval Gate
// ============================================================================

pub struct ApprovalGate {
    store: Arc<dyn CheckpointStore>,
    bridge: Arc<dyn ToolBridge>,
    idle: Duration,
}

impl ApprovalGate {
    pub fn new(store: Arc<dyn CheckpointStore>, bridge: Arc<dyn ToolBridge>, idle: Duration) -> Self {
        Self {
            store,
            bridge,
            idle,
        }
    }

    /// Suspend when the state carries a proposal, otherwise complete.
    pub async fn evaluate(&self, thread_id: &str, state: WorkingState) -> AppResult<GateOutcome> {
        let payload = match state.action_payload() {
            Some(payload) => payload.clone(),
            None => {
                transition(thread_id, GateState::Running, GateState::Complete);
                return Ok(GateOutcome::Complete(state));
            }
        };

        let node = state
            .handled_by
            .clone()
            .unwrap_or_else(|| UNKNOWN_NODE.to_string());
        let proposal = ProposalDescriptor::from_payload(&payload);
        self.store
            .put(Checkpoint::new(thread_id, state.clone(), node))
            .await?;

        transition(thread_id, GateState::Running, GateState::Suspended);
        Ok(GateOutcome::Suspended { state, proposal })
    }

    /// Settle a suspended turn. The checkpoint is consumed whatever the
    /// outcome; an unknown, consumed or expired token fails.
    pub async fn resume(&self, thread_id: &str, decision: Decision) -> AppResult<Resolution> {
        let checkpoint = self
            .store
            .take(thread_id)
            .await?
            .ok_or_else(|| AppError::invalid_checkpoint(thread_id))?;

        if checkpoint.is_expired(self.idle) {
            warn!(thread_id = %thread_id, created_at = %checkpoint.created_at, "Resume on expired checkpoint");
            return Err(AppError::invalid_checkpoint(thread_id));
        }

        let mut state = checkpoint.suspended_state;
        let payload = state.clear_pending().ok_or_else(|| {
            AppError::internal(format!("Checkpoint {} holds no proposal", thread_id))
        })?;

        let resolution = match decision {
            Decision::Reject => {
                transition(thread_id, GateState::Suspended, GateState::Rejected);
                state.result_text = REJECTION_MESSAGE.to_string();
                Resolution {
                    response: ResumeResponse {
                        result_text: state.result_text.clone(),
                        applied: false,
                    },
                    state,
                }
            }
            Decision::Accept => {
                transition(thread_id, GateState::Suspended, GateState::Accepted);
                self.commit(thread_id, state, payload).await?
            }
        };

        let from = match decision {
            Decision::Accept => GateState::Accepted,
            Decision::Reject => GateState::Rejected,
        };
        transition(thread_id, from, GateState::Complete);
        Ok(resolution)
    }

    /// Discard a checkpoint without resuming it.
    pub async fn abandon(&self, thread_id: &str) -> AppResult<bool> {
        let removed = self.store.discard(thread_id).await?;
        if removed {
            info!(thread_id = %thread_id, "Checkpoint abandoned");
        }
        Ok(removed)
    }

    /// Evict checkpoints idle past the window; returns the evicted tokens.
    pub async fn evict_idle(&self) -> AppResult<Vec<String>> {
        let evicted = self.store.evict_idle(self.idle).await?;
        if !evicted.is_empty() {
            info!(count = evicted.len(), "Evicted idle checkpoints");
        }
        Ok(evicted)
    }

    async fn commit(
        &self,
        thread_id: &str,
        mut state: WorkingState,
        payload: ActionPayload,
    ) -> AppResult<Resolution> {
        let request = match &payload {
            ActionPayload::ApplyEdit {
                path: Some(path),
                code,
                ..
            } => ToolRequest::write_file(path, code),
            ActionPayload::ApplyEdit { path: None, .. } => {
                debug!(thread_id = %thread_id, "Accepted edit has no target path");
                state.result_text =
                    "Changes accepted. No target file was named, so nothing was written."
                        .to_string();
                return Ok(Resolution {
                    response: ResumeResponse {
                        result_text: state.result_text.clone(),
                        applied: true,
                    },
                    state,
                });
            }
            ActionPayload::DeleteFile { path } => ToolRequest::delete_file(path),
            ActionPayload::RunCode { code } => ToolRequest::execute_code(code),
        }
        .for_thread(thread_id);

        let bridge = self.bridge.clone();
        let call = request.clone();
        let reply = tokio::task::spawn_blocking(move || bridge.call(&call))
            .await
            .map_err(|e| AppError::internal(format!("Task join error: {}", e)))?;

        let ok = !is_tool_error(&reply);
        state.record_tool(ToolLogEntry::new(
            request.tool_name.clone(),
            request.params.clone(),
            &reply,
            ok,
        ));

        if !ok {
            warn!(thread_id = %thread_id, tool = %request.tool_name, reply = %reply, "Commit failed");
            state.result_text = reply.clone();
            state.fault = Some(TurnFault::ToolError {
                tool: request.tool_name,
                reason: reply,
            });
            return Ok(Resolution {
                response: ResumeResponse {
                    result_text: state.result_text.clone(),
                    applied: false,
                },
                state,
            });
        }

        state.result_text = match &payload {
            ActionPayload::ApplyEdit { path, .. } => format!(
                "Changes accepted and saved to `{}`.",
                path.as_deref().unwrap_or_default()
            ),
            ActionPayload::DeleteFile { path } => format!("File deleted: `{}`", path),
            ActionPayload::RunCode { .. } => format!("## Output\n\n```\n{}\n```", reply.trim_end()),
        };
        info!(thread_id = %thread_id, tool = %request.tool_name, "Proposal applied");
        Ok(Resolution {
            response: ResumeResponse {
                result_text: state.result_text.clone(),
                applied: true,
            },
            state,
        })
    }
}
