//! Storage Layer
//!
//! Handles data persistence: the SQLite pool and the JSON config file.

pub mod config;
pub mod database;

pub use config::*;
pub use database::*;
