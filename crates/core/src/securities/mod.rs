//! Security-account descriptors and the scaled-integer arithmetic helpers
//! shared by the scanners, extractors, and basis trackers.

mod scale_factors;
mod securities_model;

pub use scale_factors::ScaleFactors;
pub use securities_model::{SecurityAccount, SecurityType, TradeableClass};
