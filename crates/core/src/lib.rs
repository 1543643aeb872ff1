//! Will of Code Core
//!
//! Foundational traits and error types shared by every crate in the Will of
//! Code workspace. Nothing in here knows about intents, handlers, or the
//! approval gate.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `context` - Tool execution context (`ExecutionContext`, `ToolContext`)
//! - `tool_trait` - Unified tool abstraction (`ToolDefinitionTrait`, `ToolExecutable`, `UnifiedTool`)
//! - `blocking` - Bounded-timeout, single-flight runner used by the synchronous facades

pub mod blocking;
pub mod context;
pub mod error;
pub mod tool_trait;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Context ────────────────────────────────────────────────────────────
pub use context::{ExecutionContext, ToolContext};

// ── Unified Tool Trait ─────────────────────────────────────────────────
pub use tool_trait::{ToolDefinitionTrait, ToolExecutable, UnifiedTool, UnifiedToolRegistry};

// ── Sync/Async Boundary ────────────────────────────────────────────────
pub use blocking::BlockingRunner;
