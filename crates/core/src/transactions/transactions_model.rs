use crate::errors::{Result, ValidationError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dated economic effect of one transaction on one security position.
///
/// Monetary fields are raw integers at the pairing's cash scale; position
/// and quantity are raw integers at the security scale. Buy, sell,
/// short-sale, and cover amounts are non-negative magnitudes; `net_income`
/// carries its sign (income less expenses). Events are immutable once
/// built and ordered by `(date, id)`, with the id as the stable tie-break
/// for same-day activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEvent {
    pub id: String,
    pub date: NaiveDate,
    /// Signed position after this event.
    pub position: i64,
    /// Signed share delta of this event, eligible for split adjustment.
    pub quantity: i64,
    pub buy: i64,
    pub sell: i64,
    pub short_sell: i64,
    pub cover_short: i64,
    pub commission: i64,
    pub net_income: i64,
    /// Allocated raw quantities per acquiring transaction id, present when
    /// the host resolved explicit lot matches for this disposal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_allocations: Option<BTreeMap<String, i64>>,
}

impl TransactionEvent {
    /// A bare event recording a position with no money movement; callers
    /// fill the monetary fields with struct update syntax.
    pub fn new(id: impl Into<String>, date: NaiveDate, position: i64) -> Self {
        Self {
            id: id.into(),
            date,
            position,
            quantity: 0,
            buy: 0,
            sell: 0,
            short_sell: 0,
            cover_short: 0,
            commission: 0,
            net_income: 0,
            lot_allocations: None,
        }
    }

    /// Net capital this event commits to the position: purchases and cover
    /// costs, less sale and short proceeds. Positive means money moved into
    /// the holding. Commission enters cost basis, not the return flows.
    pub fn capital_flow(&self) -> i64 {
        self.buy + self.cover_short - self.sell - self.short_sell
    }

    /// Total acquisition cost recorded on this event.
    pub fn acquisition_cost(&self) -> i64 {
        self.buy + self.commission
    }

    /// Ordering key: date first, id as the stable tie-break.
    pub fn sort_key(&self) -> (NaiveDate, &str) {
        (self.date, self.id.as_str())
    }
}

/// Parses a compact YYYYMMDD integer into a date.
pub fn date_from_compact(compact: u32) -> Result<NaiveDate> {
    let year = (compact / 10_000) as i32;
    let month = compact / 100 % 100;
    let day = compact % 100;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ValidationError::CompactDate(compact).into())
}

/// Formats a date as a compact YYYYMMDD integer.
pub fn date_to_compact(date: NaiveDate) -> u32 {
    date.year() as u32 * 10_000 + date.month() * 100 + date.day()
}
