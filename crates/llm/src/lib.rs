//! Will of Code LLM
//!
//! The generation collaborator used by the classifier fallback and the
//! handlers:
//! - `LlmProvider` - async provider interface
//! - `OpenAIProvider` - any OpenAI-compatible chat completions endpoint
//! - `TextGenerator` - synchronous facade used from blocking threads
//! - `extract_json_object` - structured reply parsing

pub mod generator;
pub mod http_client;
pub mod json;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use generator::{BlockingGenerator, TextGenerator};
pub use http_client::build_http_client;
pub use json::{extract_json_object, strip_code_fence};
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use types::*;
