//! Two-level grouping of per-security returns into cells, rollups, and a
//! grand total under a selectable policy.

mod aggregation_model;
mod grouped_returns;

pub use aggregation_model::{AggregationPolicy, GroupKey, GroupLabel};
pub use grouped_returns::GroupedReturns;

pub(crate) use aggregation_model::MATCH_ALL_LABEL;

#[cfg(test)]
mod aggregation_tests;
