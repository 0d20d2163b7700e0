use crate::securities::SecurityAccount;
use crate::transactions::TransactionEvent;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Basis computation method, fixed when the tracker is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BasisMethod {
    #[default]
    AverageCost,
    LotMatched,
}

impl BasisMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BasisMethod::AverageCost => "AVERAGE_COST",
            BasisMethod::LotMatched => "LOT_MATCHED",
        }
    }
}

impl fmt::Display for BasisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Running per-security basis state.
///
/// All fields are raw scaled integers. `long_basis` accumulates the cost
/// of the open long position; `short_basis` accumulates the net credit of
/// the open short position; both are non-negative. The previous position
/// and its date feed split adjustment on the next advance. The state moves
/// monotonically forward and is never rewound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CostBasisState {
    pub long_basis: i64,
    pub short_basis: i64,
    pub previous_position: i64,
    pub previous_date: Option<NaiveDate>,
}

/// Read-only id lookup over a security's transaction history, consulted
/// only when resolving lot allocations.
#[derive(Debug, Default)]
pub struct TransactionIndex<'a> {
    events: HashMap<&'a str, &'a TransactionEvent>,
}

impl<'a> TransactionIndex<'a> {
    pub fn from_events(events: impl IntoIterator<Item = &'a TransactionEvent>) -> Self {
        Self {
            events: events
                .into_iter()
                .map(|event| (event.id.as_str(), event))
                .collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&'a TransactionEvent> {
        self.events.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Everything an advance needs beyond the event itself: the security's
/// scaling and split collaborators, and the transaction lookup for lot
/// matching. Passed explicitly; the tracker keeps no ambient references.
pub struct BasisContext<'a> {
    pub security: &'a SecurityAccount,
    pub transactions: &'a TransactionIndex<'a>,
}

impl<'a> BasisContext<'a> {
    pub fn new(security: &'a SecurityAccount, transactions: &'a TransactionIndex<'a>) -> Self {
        Self {
            security,
            transactions,
        }
    }
}
