//! Will of Code Tools
//!
//! The Tool Bridge and the tools behind it:
//! - `ToolRequest`, `TOOL_ERROR_PREFIX`, `is_tool_error` - wire protocol
//! - `ToolBridge` - synchronous, bounded-timeout facade
//! - `RegistryToolBridge` - bridge over a `UnifiedToolRegistry`
//! - `local` - in-process file and code execution tools

pub mod bridge;
pub mod executor;
pub mod local;

// Re-export core types
pub use bridge::{RegistryToolBridge, ToolBridge, DEFAULT_TOOL_TIMEOUT};
pub use executor::{is_tool_error, names, tool_error, ToolRequest, TOOL_ERROR_PREFIX};
pub use local::{local_registry, register_local_tools, LocalToolConfig};
