//! Checkpoint Services
//!
//! Storage for suspended turns across the approval boundary.
//!
//! - `checkpointer.rs` - CheckpointStore trait and InMemoryCheckpointStore
//! - `checkpoint_store.rs` - SqliteCheckpointStore for persistence across restarts

pub mod checkpoint_store;
pub mod checkpointer;

pub use checkpoint_store::SqliteCheckpointStore;
pub use checkpointer::{Checkpoint, CheckpointStore, InMemoryCheckpointStore};
