//! Return metrics: ordinary and Modified Dietz holding-period returns and
//! the annualized internal rate, with mergeable accumulators and audits.

mod irr_solver;
mod return_extractor;
mod returns_model;

pub use return_extractor::{AggregateReturn, ReturnExtractor};
pub use returns_model::{
    collapse_flows, ReturnAudit, ReturnCashFlow, ReturnKind, ReturnTotals, ReturnWindowKind,
};
