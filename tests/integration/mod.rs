//! Integration Tests Module
//!
//! End-to-end turns through the public `Orchestrator` API with a scripted
//! generator and real or recorded tools.

// Shared test doubles and builders
mod support;

// Routing, safety and producer turns
mod turn_flow_test;

// Suspend/resume through the approval gate
mod approval_flow_test;

// SQLite-backed checkpoints across orchestrator instances
mod checkpoint_persistence_test;
