//! SQLite Connection Pooling
//!
//! Pool construction for the SQLite-backed stores. Schemas are owned by the
//! stores themselves.

use std::path::Path;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::utils::error::{AppError, AppResult};

/// Shared SQLite connection pool
pub type DbPool = Arc<Pool<SqliteConnectionManager>>;

/// Open (or create) a pooled database file.
pub fn open_pool(db_path: &Path) -> AppResult<DbPool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let manager = SqliteConnectionManager::file(db_path);
    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

    tracing::debug!(path = %db_path.display(), "SQLite pool opened");
    Ok(Arc::new(pool))
}

/// In-memory database, one connection so every caller sees the same data.
pub fn in_memory_pool() -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;
    Ok(Arc::new(pool))
}
