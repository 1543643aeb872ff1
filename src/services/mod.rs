//! Services
//!
//! Business logic for a turn and the storage of suspended turns.

pub mod graph_workflow;
pub mod orchestrator;

pub use graph_workflow::{CheckpointStore, InMemoryCheckpointStore, SqliteCheckpointStore};
pub use orchestrator::Orchestrator;
