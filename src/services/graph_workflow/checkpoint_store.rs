//! SQLite Checkpoint Store
//!
//! `CheckpointStore` backed by SQLite, so suspended turns survive a process
//! restart. The Working State is stored as JSON.
//!
//! Uses r2d2 connection pooling for thread-safe database access.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};

use super::checkpointer::{idle_cutoff, Checkpoint, CheckpointStore};
use crate::storage::database::DbPool;
use crate::utils::error::{AppError, AppResult};

/// SQLite-backed checkpoint storage.
pub struct SqliteCheckpointStore {
    pool: DbPool,
}

impl SqliteCheckpointStore {
    /// Create a store on the given pool.
    ///
    /// Automatically creates the checkpoints table if it does not exist.
    pub fn new(pool: DbPool) -> AppResult<Self> {
        let conn = pool
            .get()
            .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS checkpoints (
                thread_id TEXT PRIMARY KEY,
                state TEXT NOT NULL,
                suspended_at_node TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| AppError::database(format!("Failed to create checkpoints table: {}", e)))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_checkpoints_created_at
             ON checkpoints(created_at)",
            [],
        )
        .map_err(|e| AppError::database(format!("Failed to create index: {}", e)))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn put(&self, checkpoint: Checkpoint) -> AppResult<()> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))?;

            let state_json = serde_json::to_string(&checkpoint.suspended_state)?;

            conn.execute(
                "INSERT OR REPLACE INTO checkpoints
                 (thread_id, state, suspended_at_node, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    checkpoint.thread_id,
                    state_json,
                    checkpoint.suspended_at_node,
                    format_timestamp(&checkpoint.created_at),
                ],
            )
            .map_err(|e| AppError::database(format!("Failed to save checkpoint: {}", e)))?;

            Ok(())
        })
        .await
        .map_err(|e| AppError::database(format!("Task join error: {}", e)))?
    }

    async fn take(&self, thread_id: &str) -> AppResult<Option<Checkpoint>> {
        let pool = self.pool.clone();
        let tid = thread_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))?;

            // Delete and read in one statement so a token is consumed once.
            let result = conn.query_row(
                "DELETE FROM checkpoints WHERE thread_id = ?1
                 RETURNING thread_id, state, suspended_at_node, created_at",
                rusqlite::params![tid],
                RawCheckpointRow::from_row,
            );

            match result {
                Ok(raw) => Ok(Some(parse_checkpoint_row(raw)?)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(AppError::database(format!(
                    "Failed to take checkpoint: {}",
                    e
                ))),
            }
        })
        .await
        .map_err(|e| AppError::database(format!("Task join error: {}", e)))?
    }

    async fn peek(&self, thread_id: &str) -> AppResult<Option<Checkpoint>> {
        let pool = self.pool.clone();
        let tid = thread_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))?;

            let result = conn.query_row(
                "SELECT thread_id, state, suspended_at_node, created_at
                 FROM checkpoints
                 WHERE thread_id = ?1",
                rusqlite::params![tid],
                RawCheckpointRow::from_row,
            );

            match result {
                Ok(raw) => Ok(Some(parse_checkpoint_row(raw)?)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(AppError::database(format!(
                    "Failed to load checkpoint: {}",
                    e
                ))),
            }
        })
        .await
        .map_err(|e| AppError::database(format!("Task join error: {}", e)))?
    }

    async fn discard(&self, thread_id: &str) -> AppResult<bool> {
        let pool = self.pool.clone();
        let tid = thread_id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))?;

            let deleted = conn
                .execute(
                    "DELETE FROM checkpoints WHERE thread_id = ?1",
                    rusqlite::params![tid],
                )
                .map_err(|e| AppError::database(format!("Failed to delete checkpoint: {}", e)))?;

            Ok(deleted > 0)
        })
        .await
        .map_err(|e| AppError::database(format!("Task join error: {}", e)))?
    }

    async fn evict_idle(&self, idle: Duration) -> AppResult<Vec<String>> {
        let pool = self.pool.clone();
        let cutoff = format_timestamp(&idle_cutoff(idle));

        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))?;

            let mut stmt = conn
                .prepare(
                    "DELETE FROM checkpoints WHERE created_at < ?1
                     RETURNING thread_id",
                )
                .map_err(|e| AppError::database(format!("Failed to prepare eviction: {}", e)))?;

            let evicted = stmt
                .query_map(rusqlite::params![cutoff], |row| row.get::<_, String>(0))
                .map_err(|e| AppError::database(format!("Failed to evict checkpoints: {}", e)))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| AppError::database(format!("Failed to evict checkpoints: {}", e)))?;

            Ok(evicted)
        })
        .await
        .map_err(|e| AppError::database(format!("Task join error: {}", e)))?
    }

    async fn len(&self) -> AppResult<usize> {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))?;

            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM checkpoints", [], |row| row.get(0))
                .map_err(|e| AppError::database(format!("Failed to count checkpoints: {}", e)))?;

            Ok(count.max(0) as usize)
        })
        .await
        .map_err(|e| AppError::database(format!("Task join error: {}", e)))?
    }
}

// ============================================================================
// Internal Helpers
// ============================================================================

/// Fixed-width RFC 3339 so text comparison orders by time.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Raw row data from the database before parsing JSON fields.
struct RawCheckpointRow {
    thread_id: String,
    state: String,
    suspended_at_node: String,
    created_at: String,
}

impl RawCheckpointRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            thread_id: row.get(0)?,
            state: row.get(1)?,
            suspended_at_node: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

/// Parse a raw database row into a Checkpoint.
fn parse_checkpoint_row(raw: RawCheckpointRow) -> AppResult<Checkpoint> {
    let suspended_state = serde_json::from_str(&raw.state).map_err(|e| {
        AppError::database(format!("Failed to parse checkpoint state: {}", e))
    })?;

    let created_at = DateTime::parse_from_rfc3339(&raw.created_at)
        .map_err(|e| AppError::database(format!("Failed to parse created_at: {}", e)))?
        .with_timezone(&Utc);

    Ok(Checkpoint {
        thread_id: raw.thread_id,
        suspended_state,
        suspended_at_node: raw.suspended_at_node,
        created_at,
    })
}

// ============================================================================
// Tests
// ============================================================================
