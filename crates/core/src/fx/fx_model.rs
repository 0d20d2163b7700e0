use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A unit-changing corporate action on a security.
///
/// `quantity_factor` is the multiplier applied to share counts carried
/// forward across the action date: 2 for a 2-for-1 split, 0.5 for a
/// 1-for-2 reverse split.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SplitAdjustment {
    pub date: NaiveDate,
    pub quantity_factor: Decimal,
}

impl SplitAdjustment {
    pub fn new(date: NaiveDate, quantity_factor: Decimal) -> Self {
        Self {
            date,
            quantity_factor,
        }
    }
}
