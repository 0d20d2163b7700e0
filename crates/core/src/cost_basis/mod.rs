//! Long and short cost-basis tracking, by running average cost or by
//! host-resolved lot matching.

mod basis_model;
mod basis_tracker;

pub use basis_model::{BasisContext, BasisMethod, CostBasisState, TransactionIndex};
pub use basis_tracker::CostBasisTracker;

#[cfg(test)]
mod basis_tracker_tests;
