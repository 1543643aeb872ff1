//! Orchestrator Service
//!
//! Runs one turn end to end: safety filter, classification, dispatch, then
//! the approval gate. The synchronous part runs on a blocking thread; the
//! gate's checkpoint persistence is async.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;
use will_of_code_llm::TextGenerator;
use will_of_code_tools::ToolBridge;

use super::approval_gate::{ApprovalGate, GateOutcome, Resolution};
use super::classifier::{Classifier, RoutingTable};
use super::dispatcher::{Dispatcher, HandlerRegistry};
use super::handlers::HandlerContext;
use super::safety::SafetyFilter;
use crate::models::settings::AppConfig;
use crate::models::state::{FileContext, WorkingState};
use crate::models::turn::{ResumeRequest, ResumeResponse, TurnRequest, TurnResponse};
use crate::services::graph_workflow::CheckpointStore;
use crate::utils::error::{AppError, AppResult};

/// The synchronous stages of a turn.
struct Pipeline {
    safety: SafetyFilter,
    classifier: Classifier,
    dispatcher: Dispatcher,
    generator: Arc<dyn TextGenerator>,
    bridge: Arc<dyn ToolBridge>,
}

impl Pipeline {
    fn run(&self, thread_id: &str, mut state: WorkingState) -> WorkingState {
        if self.safety.screen(&mut state) {
            return state;
        }

        let classification = self.classifier.apply(&mut state);
        debug!(
            thread_id = %thread_id,
            intent = %classification.intent,
            confidence = classification.confidence,
            phase = ?classification.phase,
            "Classified"
        );

        let ctx = HandlerContext::new(self.generator.clone(), self.bridge.clone(), thread_id);
        self.dispatcher.dispatch(state, &ctx)
    }
}

pub struct Orchestrator {
    pipeline: Arc<Pipeline>,
    gate: Arc<ApprovalGate>,
    sweep_interval: Duration,
}

impl Orchestrator {
    pub fn new(
        config: &AppConfig,
        generator: Arc<dyn TextGenerator>,
        bridge: Arc<dyn ToolBridge>,
        store: Arc<dyn CheckpointStore>,
    ) -> AppResult<Self> {
        Self::with_registry(config, HandlerRegistry::default(), generator, bridge, store)
    }

    /// Build with a custom handler registry.
    pub fn with_registry(
        config: &AppConfig,
        registry: HandlerRegistry,
        generator: Arc<dyn TextGenerator>,
        bridge: Arc<dyn ToolBridge>,
        store: Arc<dyn CheckpointStore>,
    ) -> AppResult<Self> {
        config.validate().map_err(AppError::config)?;

        let table = RoutingTable::default_table()?;
        info!(
            routes = table.len(),
            handlers = registry.len(),
            "Orchestrator pipeline built"
        );
        let classifier = Classifier::new(table, generator.clone(), config.clarification_threshold);
        let pipeline = Pipeline {
            safety: SafetyFilter::new(config.extra_blocked_paths.iter()),
            classifier,
            dispatcher: Dispatcher::new(registry),
            generator,
            bridge: bridge.clone(),
        };
        let gate = ApprovalGate::new(
            store,
            bridge,
            Duration::from_secs(config.checkpoint_idle_secs),
        );

        Ok(Self {
            pipeline: Arc::new(pipeline),
            gate: Arc::new(gate),
            sweep_interval: Duration::from_secs(config.checkpoint_sweep_secs),
        })
    }

    /// Run one turn. A turn that produced a proposal returns suspended, with
    /// `proposal` set; settle it with [`Orchestrator::resume`].
    pub async fn run_turn(&self, request: TurnRequest) -> AppResult<TurnResponse> {
        if request.query.trim().is_empty() {
            return Err(AppError::validation("Query must not be empty"));
        }

        let thread_id = request
            .thread_id
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut state = WorkingState::new(request.query);
        if let Some(file) = request.file_context {
            state = state.with_file_context(FileContext::new(file.path, file.content));
        }

        info!(thread_id = %thread_id, "Turn started");
        let pipeline = self.pipeline.clone();
        let tid = thread_id.clone();
        let state = tokio::task::spawn_blocking(move || pipeline.run(&tid, state))
            .await
            .map_err(|e| AppError::internal(format!("Task join error: {}", e)))?;

        let outcome = self.gate.evaluate(&thread_id, state).await?;
        let response = TurnResponse::from_state(
            thread_id.clone(),
            outcome.state(),
            outcome.proposal().cloned(),
        );
        info!(
            thread_id = %thread_id,
            intent = response.intent.map(|i| i.as_str()).unwrap_or("none"),
            suspended = matches!(outcome, GateOutcome::Suspended { .. }),
            "Turn finished"
        );
        Ok(response)
    }

    /// Settle a suspended turn.
    pub async fn resume(&self, request: ResumeRequest) -> AppResult<ResumeResponse> {
        self.resume_detailed(request)
            .await
            .map(|resolution| resolution.response)
    }

    /// Settle a suspended turn and return the final Working State as well.
    pub async fn resume_detailed(&self, request: ResumeRequest) -> AppResult<Resolution> {
        self.gate.resume(&request.thread_id, request.decision).await
    }

    /// Discard a suspended turn. Returns whether a checkpoint existed.
    pub async fn abandon(&self, thread_id: &str) -> AppResult<bool> {
        self.gate.abandon(thread_id).await
    }

    pub async fn evict_idle_checkpoints(&self) -> AppResult<Vec<String>> {
        self.gate.evict_idle().await
    }

    /// Periodically evict idle checkpoints until the handle is aborted.
    pub fn spawn_checkpoint_sweeper(&self) -> JoinHandle<()> {
        let gate = self.gate.clone();
        let period = self.sweep_interval.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = gate.evict_idle().await {
                    error!("Checkpoint sweep failed: {}", e);
                }
            }
        })
    }
}
