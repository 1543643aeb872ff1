//! Test doubles for the generation collaborator and the Tool Bridge.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use will_of_code::services::graph_workflow::{CheckpointStore, InMemoryCheckpointStore};
use will_of_code::{AppConfig, Orchestrator};
use will_of_code_llm::{LlmError, LlmResult, TextGenerator};
use will_of_code_tools::{
    local_registry, LocalToolConfig, RegistryToolBridge, ToolBridge, ToolRequest,
};

/// Replies in queue order; fails when the queue runs dry.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
}

impl ScriptedGenerator {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, _system: &str, _prompt: &str) -> LlmResult<String> {
        *self.calls.lock().unwrap() += 1;
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::NetworkError {
                message: "generator offline".to_string(),
            })
    }
}

/// Records every request, then forwards it to `inner` or answers with a
/// canned reply.
pub struct RecordingBridge {
    inner: Option<Box<dyn ToolBridge>>,
    canned: String,
    pub requests: Mutex<Vec<ToolRequest>>,
}

impl RecordingBridge {
    /// Forward to the local tools rooted at `root`.
    pub fn local(root: &Path, interpreter: &str) -> Self {
        let registry = local_registry(&LocalToolConfig {
            interpreter: interpreter.to_string(),
            exec_timeout: Duration::from_secs(10),
        });
        let bridge = RegistryToolBridge::new(Arc::new(registry), root, Duration::from_secs(10))
            .expect("tool runtime");
        Self {
            inner: Some(Box::new(bridge)),
            canned: String::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with `reply`.
    pub fn canned(reply: &str) -> Self {
        Self {
            inner: None,
            canned: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.tool_name.clone())
            .collect()
    }

    pub fn mutating_calls(&self) -> usize {
        self.tool_names()
            .iter()
            .filter(|n| matches!(n.as_str(), "write_file" | "delete_file" | "execute_code"))
            .count()
    }
}

impl ToolBridge for RecordingBridge {
    fn call(&self, request: &ToolRequest) -> String {
        self.requests.lock().unwrap().push(request.clone());
        match &self.inner {
            Some(inner) => inner.call(request),
            None => self.canned.clone(),
        }
    }
}

pub struct Harness {
    pub generator: Arc<ScriptedGenerator>,
    pub bridge: Arc<RecordingBridge>,
    pub orchestrator: Orchestrator,
}

pub fn harness_with(
    config: &AppConfig,
    replies: &[&str],
    bridge: RecordingBridge,
    store: Arc<dyn CheckpointStore>,
) -> Harness {
    let generator = Arc::new(ScriptedGenerator::new(replies));
    let bridge = Arc::new(bridge);
    let orchestrator =
        Orchestrator::new(config, generator.clone(), bridge.clone(), store).expect("orchestrator");
    Harness {
        generator,
        bridge,
        orchestrator,
    }
}

pub fn harness(replies: &[&str], bridge: RecordingBridge) -> Harness {
    harness_with(
        &AppConfig::default(),
        replies,
        bridge,
        Arc::new(InMemoryCheckpointStore::new()),
    )
}
