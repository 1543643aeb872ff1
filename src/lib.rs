//! Will of Code
//!
//! An intent-routed coding assistant. Each request passes a safety filter,
//! is classified to one intent and handled by one handler. Mutating results
//! are held as proposals until the caller accepts or rejects them.
//!
//! - Data models (Working State, turn request/response, settings)
//! - Services (orchestrator, checkpoint stores)
//! - Storage layer (SQLite pool, JSON config)
//! - Utilities (errors, paths)

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::settings::{AppConfig, CheckpointBackend, SettingsUpdate};
pub use models::turn::{Decision, ResumeRequest, ResumeResponse, TurnRequest, TurnResponse};
pub use services::orchestrator::Orchestrator;
pub use utils::error::{AppError, AppResult};
