//! Orchestrator Module
//!
//! Routes each request to one handler and holds mutating proposals behind
//! the approval gate.
//!
//! - `safety.rs` - protected-path deny-list
//! - `classifier.rs` - routing table plus generator fallback
//! - `dispatcher.rs` - intent → handler registry and contract enforcement
//! - `handlers/` - one handler per intent
//! - `approval_gate.rs` - suspend/resume state machine
//! - `service.rs` - the per-turn pipeline

pub mod approval_gate;
pub mod classifier;
pub mod constants;
pub mod dispatcher;
pub mod handlers;
pub mod path_utils;
pub mod safety;
mod service;

pub use approval_gate::{ApprovalGate, GateOutcome, GateState, Resolution};
pub use classifier::{Classification, ClassificationPhase, Classifier, RoutingTable};
pub use dispatcher::{Dispatcher, HandlerRegistry};
pub use handlers::{Handler, HandlerContext, HandlerError, HandlerKind, HandlerResult};
pub use safety::{SafetyFilter, SafetyVerdict};
pub use service::Orchestrator;
