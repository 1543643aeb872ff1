//! Text Generator
//!
//! The synchronous face of the generation collaborator. Handlers and the
//! classifier run on blocking threads and call `TextGenerator`; the
//! `BlockingGenerator` adapter drives an async `LlmProvider` on its own
//! runtime with a bounded wait. Requests from different turns may overlap.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use will_of_code_core::BlockingRunner;

use crate::json::extract_json_object;
use crate::provider::LlmProvider;
use crate::types::{CompletionRequest, LlmResult};

/// Text in, text (or a JSON object) out.
pub trait TextGenerator: Send + Sync {
    /// Generate a free-form reply.
    fn generate(&self, system: &str, prompt: &str) -> LlmResult<String>;

    /// Generate a reply and parse it as a JSON object.
    fn generate_json(&self, system: &str, prompt: &str) -> LlmResult<Value> {
        let text = self.generate(system, prompt)?;
        extract_json_object(&text)
    }
}

/// `TextGenerator` backed by an async provider.
pub struct BlockingGenerator {
    provider: Arc<dyn LlmProvider>,
    runner: BlockingRunner,
    timeout: Duration,
}

impl BlockingGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> LlmResult<Self> {
        let runner = BlockingRunner::concurrent("llm")?;
        Ok(Self {
            provider,
            runner,
            timeout,
        })
    }

    fn complete(&self, request: CompletionRequest) -> LlmResult<String> {
        let provider = self.provider.clone();
        let response = self
            .runner
            .run(self.timeout, async move { provider.complete(request).await })??;
        Ok(response.content)
    }
}

impl TextGenerator for BlockingGenerator {
    fn generate(&self, system: &str, prompt: &str) -> LlmResult<String> {
        self.complete(CompletionRequest::new(prompt).with_system(system))
    }

    fn generate_json(&self, system: &str, prompt: &str) -> LlmResult<Value> {
        let text = self.complete(CompletionRequest::new(prompt).with_system(system).json())?;
        extract_json_object(&text)
    }
}
