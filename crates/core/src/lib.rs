//! Foliometrics Core - Investment performance and cost-basis engine.
//!
//! This crate computes per-security and aggregated return metrics
//! (ordinary, Modified Dietz, annualized internal rate) and long/short
//! cost basis from ordered transaction streams. It is host-agnostic:
//! rates and splits arrive through the `fx` collaborator trait, and all
//! user-facing amounts stay in exact scaled-decimal arithmetic.

pub mod aggregation;
pub mod constants;
pub mod cost_basis;
pub mod errors;
pub mod fx;
pub mod report;
pub mod returns;
pub mod securities;
pub mod transactions;

// Re-export common types from the returns and report modules
pub use report::*;
pub use returns::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
