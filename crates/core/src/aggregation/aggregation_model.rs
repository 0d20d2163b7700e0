use crate::securities::SecurityAccount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label assigned to securities a policy sends to one bucket regardless
/// of classifier values.
pub(crate) const MATCH_ALL_LABEL: &str = "ALL";

/// Classifier key deriving one group label from a security account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupKey {
    Account,
    TradeableClass,
    Ticker,
    SecurityType,
    SecuritySubtype,
}

impl GroupKey {
    pub const fn as_str(&self) -> &'static str {
        match self {
            GroupKey::Account => "ACCOUNT",
            GroupKey::TradeableClass => "TRADEABLE_CLASS",
            GroupKey::Ticker => "TICKER",
            GroupKey::SecurityType => "SECURITY_TYPE",
            GroupKey::SecuritySubtype => "SECURITY_SUBTYPE",
        }
    }

    /// The label this key assigns to a security account. Securities with
    /// no recorded subtype fall back to their type label so the
    /// type/subtype hierarchy stays total.
    pub fn label_for(&self, security: &SecurityAccount) -> String {
        match self {
            GroupKey::Account => security.account_name.clone(),
            GroupKey::TradeableClass => security.tradeable_class().to_string(),
            GroupKey::Ticker => security.ticker.clone(),
            GroupKey::SecurityType => security.security_type.to_string(),
            GroupKey::SecuritySubtype => security
                .security_subtype
                .clone()
                .unwrap_or_else(|| security.security_type.to_string()),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Two-level grouping strategy for rolling per-security returns up into
/// group figures. Selecting a policy is a pure lookup with no state;
/// `Ungrouped` is the match-all placeholder sending everything to one
/// cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationPolicy {
    AccountThenClass,
    TickerThenAccount,
    TypeThenSubtype,
    #[default]
    Ungrouped,
}

impl AggregationPolicy {
    pub const ALL: [AggregationPolicy; 4] = [
        AggregationPolicy::AccountThenClass,
        AggregationPolicy::TickerThenAccount,
        AggregationPolicy::TypeThenSubtype,
        AggregationPolicy::Ungrouped,
    ];

    pub const fn primary(&self) -> Option<GroupKey> {
        match self {
            AggregationPolicy::AccountThenClass => Some(GroupKey::Account),
            AggregationPolicy::TickerThenAccount => Some(GroupKey::Ticker),
            AggregationPolicy::TypeThenSubtype => Some(GroupKey::SecurityType),
            AggregationPolicy::Ungrouped => None,
        }
    }

    pub const fn secondary(&self) -> Option<GroupKey> {
        match self {
            AggregationPolicy::AccountThenClass => Some(GroupKey::TradeableClass),
            AggregationPolicy::TickerThenAccount => Some(GroupKey::Account),
            AggregationPolicy::TypeThenSubtype => Some(GroupKey::SecuritySubtype),
            AggregationPolicy::Ungrouped => None,
        }
    }

    /// Whether the secondary key strictly refines the primary. Only the
    /// type/subtype pairing forms a hierarchy; the flag changes labeling
    /// and rollup layout, never arithmetic.
    pub const fn secondary_refines_primary(&self) -> bool {
        matches!(self, AggregationPolicy::TypeThenSubtype)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            AggregationPolicy::AccountThenClass => "ACCOUNT_THEN_CLASS",
            AggregationPolicy::TickerThenAccount => "TICKER_THEN_ACCOUNT",
            AggregationPolicy::TypeThenSubtype => "TYPE_THEN_SUBTYPE",
            AggregationPolicy::Ungrouped => "UNGROUPED",
        }
    }
}

impl fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Label pair addressing one aggregation cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupLabel {
    pub primary: String,
    pub secondary: String,
}

impl GroupLabel {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// The cell a policy assigns to a security.
    pub fn for_security(policy: AggregationPolicy, security: &SecurityAccount) -> Self {
        let label = |key: Option<GroupKey>| {
            key.map_or_else(|| MATCH_ALL_LABEL.to_string(), |key| key.label_for(security))
        };
        Self {
            primary: label(policy.primary()),
            secondary: label(policy.secondary()),
        }
    }

    /// One display string for the pair: a path when the secondary refines
    /// the primary, a comma join of the independent labels otherwise.
    pub fn render(&self, refines: bool) -> String {
        if refines {
            format!("{}/{}", self.primary, self.secondary)
        } else {
            format!("{}, {}", self.primary, self.secondary)
        }
    }
}
