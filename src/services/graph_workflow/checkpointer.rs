//! Checkpoint Store
//!
//! Holds the Working State of a suspended turn between the proposal and the
//! caller's decision. A checkpoint is created only when the approval gate
//! suspends and is consumed exactly once: on resume, on explicit
//! abandonment, or by idle eviction.
//!
//! ## Implementations
//! - `InMemoryCheckpointStore` - default, sharded `DashMap`
//! - `SqliteCheckpointStore` - survives restarts (see checkpoint_store.rs)

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::models::state::WorkingState;
use crate::utils::error::AppResult;

// ============================================================================
// Checkpoint
// ============================================================================

/// A suspended turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Correlation token the caller resumes with.
    pub thread_id: String,
    /// Full Working State at the moment of suspension.
    pub suspended_state: WorkingState,
    /// Handler that produced the pending proposal.
    pub suspended_at_node: String,
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(
        thread_id: impl Into<String>,
        suspended_state: WorkingState,
        suspended_at_node: impl Into<String>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            suspended_state,
            suspended_at_node: suspended_at_node.into(),
            created_at: Utc::now(),
        }
    }

    /// Whether the checkpoint has been idle for longer than `idle`.
    pub fn is_expired(&self, idle: Duration) -> bool {
        self.is_expired_at(idle, Utc::now())
    }

    fn is_expired_at(&self, idle: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(idle) {
            Ok(window) => now - self.created_at > window,
            // A window too large for chrono never expires.
            Err(_) => false,
        }
    }
}

/// Cutoff timestamp for an idle window, saturating at the epoch.
pub(crate) fn idle_cutoff(idle: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(idle)
        .ok()
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

// ============================================================================
// CheckpointStore Trait
// ============================================================================

/// Keyed storage for suspended turns.
///
/// `take` must be atomic: of two concurrent calls for the same token at most
/// one observes the checkpoint.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Store a checkpoint, replacing any existing one for the same token.
    async fn put(&self, checkpoint: Checkpoint) -> AppResult<()>;

    /// Remove and return the checkpoint for a token.
    async fn take(&self, thread_id: &str) -> AppResult<Option<Checkpoint>>;

    /// Look at a checkpoint without consuming it.
    async fn peek(&self, thread_id: &str) -> AppResult<Option<Checkpoint>>;

    /// Drop a checkpoint. Returns whether one existed.
    async fn discard(&self, thread_id: &str) -> AppResult<bool>;

    /// Drop every checkpoint idle for longer than `idle`. Returns the evicted tokens.
    async fn evict_idle(&self, idle: Duration) -> AppResult<Vec<String>>;

    /// Number of suspended turns.
    async fn len(&self) -> AppResult<usize>;
}

// ============================================================================
// InMemoryCheckpointStore
// ============================================================================

/// In-memory `CheckpointStore`. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    store: DashMap<String, Checkpoint>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn put(&self, checkpoint: Checkpoint) -> AppResult<()> {
        self.store.insert(checkpoint.thread_id.clone(), checkpoint);
        Ok(())
    }

    async fn take(&self, thread_id: &str) -> AppResult<Option<Checkpoint>> {
        Ok(self.store.remove(thread_id).map(|(_, cp)| cp))
    }

    async fn peek(&self, thread_id: &str) -> AppResult<Option<Checkpoint>> {
        Ok(self.store.get(thread_id).map(|entry| entry.value().clone()))
    }

    async fn discard(&self, thread_id: &str) -> AppResult<bool> {
        Ok(self.store.remove(thread_id).is_some())
    }

    async fn evict_idle(&self, idle: Duration) -> AppResult<Vec<String>> {
        let expired: Vec<String> = self
            .store
            .iter()
            .filter(|entry| entry.value().is_expired(idle))
            .map(|entry| entry.key().clone())
            .collect();

        // Re-check under the shard lock so a checkpoint replaced in between
        // is not evicted.
        let mut evicted = Vec::with_capacity(expired.len());
        for thread_id in expired {
            if self
                .store
                .remove_if(&thread_id, |_, cp| cp.is_expired(idle))
                .is_some()
            {
                evicted.push(thread_id);
            }
        }
        Ok(evicted)
    }

    async fn len(&self) -> AppResult<usize> {
        Ok(self.store.len())
    }
}

// ============================================================================
// Tests
// ============================================================================
