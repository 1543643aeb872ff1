//! Data Models
//!
//! Contains all data structures used throughout the application.

pub mod settings;
pub mod state;
pub mod turn;

pub use settings::*;
pub use state::*;
pub use turn::*;
