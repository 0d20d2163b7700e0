use super::scale_factors::ScaleFactors;
use crate::errors::{CalculatorError, Result};
use crate::fx::RateProviderTrait;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Security classification used by the type/subtype aggregation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityType {
    #[default]
    Stock,
    Bond,
    MutualFund,
    CertificateOfDeposit,
    OptionContract,
    Other,
}

impl SecurityType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SecurityType::Stock => "STOCK",
            SecurityType::Bond => "BOND",
            SecurityType::MutualFund => "MUTUAL_FUND",
            SecurityType::CertificateOfDeposit => "CERTIFICATE_OF_DEPOSIT",
            SecurityType::OptionContract => "OPTION_CONTRACT",
            SecurityType::Other => "OTHER",
        }
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a holding is a market security or the account's cash bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeableClass {
    Security,
    Cash,
}

impl TradeableClass {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TradeableClass::Security => "SECURITY",
            TradeableClass::Cash => "CASH",
        }
    }
}

impl fmt::Display for TradeableClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One security held in one account, with the metadata and collaborators
/// the engine needs: decimal scaling, classification for aggregation, and
/// the optional rate/split provider. A missing provider marks the cash
/// bucket, whose position is its own value and which never split-adjusts.
#[derive(Clone)]
pub struct SecurityAccount {
    pub id: String,
    pub account_name: String,
    pub ticker: String,
    pub name: String,
    pub security_type: SecurityType,
    pub security_subtype: Option<String>,
    pub scale: ScaleFactors,
    rates: Option<Arc<dyn RateProviderTrait>>,
}

impl SecurityAccount {
    pub fn new(
        id: impl Into<String>,
        account_name: impl Into<String>,
        ticker: impl Into<String>,
        name: impl Into<String>,
        security_type: SecurityType,
        scale: ScaleFactors,
    ) -> Self {
        Self {
            id: id.into(),
            account_name: account_name.into(),
            ticker: ticker.into(),
            name: name.into(),
            security_type,
            security_subtype: None,
            scale,
            rates: None,
        }
    }

    /// The account's cash bucket in a currency with `cash_decimals` places.
    pub fn cash(
        id: impl Into<String>,
        account_name: impl Into<String>,
        cash_decimals: u32,
    ) -> Result<Self> {
        Ok(Self::new(
            id,
            account_name,
            "CASH",
            "Cash",
            SecurityType::Other,
            ScaleFactors::cash_only(cash_decimals)?,
        ))
    }

    /// Attaches the rate/split provider for this security.
    pub fn with_rates(mut self, rates: Arc<dyn RateProviderTrait>) -> Self {
        self.rates = Some(rates);
        self
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.security_subtype = Some(subtype.into());
        self
    }

    pub fn is_cash(&self) -> bool {
        self.rates.is_none()
    }

    pub fn tradeable_class(&self) -> TradeableClass {
        if self.is_cash() {
            TradeableClass::Cash
        } else {
            TradeableClass::Security
        }
    }

    /// Split ratio applied to positions carried from `reference_date` to
    /// `target_date`: the adjusted rate over the unadjusted rate at the
    /// target date, exactly one for cash.
    pub fn split_ratio(&self, reference_date: NaiveDate, target_date: NaiveDate) -> Result<Decimal> {
        let Some(provider) = &self.rates else {
            return Ok(Decimal::ONE);
        };
        if reference_date == target_date {
            return Ok(Decimal::ONE);
        }
        let current = provider.rate(target_date);
        if current <= Decimal::ZERO {
            return Err(self.missing_rate(target_date));
        }
        let adjusted = provider.adjust_rate_for_splits(reference_date, current, target_date);
        Ok(adjusted / current)
    }

    /// Raw position recorded at `reference_date`, restated in the units in
    /// effect at `target_date`, rounded half away from zero.
    pub fn adjust_position(
        &self,
        position: i64,
        reference_date: NaiveDate,
        target_date: NaiveDate,
    ) -> Result<i64> {
        let ratio = self.split_ratio(reference_date, target_date)?;
        if ratio == Decimal::ONE {
            return Ok(position);
        }
        (Decimal::from(position) * ratio)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or_else(|| {
                CalculatorError::Calculation(format!(
                    "split-adjusted position for {} overflows i64",
                    self.id
                ))
                .into()
            })
    }

    /// Currency value of a raw position on `date`, rounded to the cash
    /// decimal places. Cash positions are their own value.
    pub fn position_value(&self, position: i64, date: NaiveDate) -> Result<Decimal> {
        if position == 0 {
            return Ok(Decimal::ZERO);
        }
        let units = self.scale.position(position);
        let Some(provider) = &self.rates else {
            return Ok(units);
        };
        let rate = provider.rate(date);
        if rate <= Decimal::ZERO {
            return Err(self.missing_rate(date));
        }
        Ok((units / rate).round_dp(self.scale.cash_decimals()))
    }

    fn missing_rate(&self, date: NaiveDate) -> crate::errors::Error {
        CalculatorError::MissingRate {
            security_id: self.id.clone(),
            date,
        }
        .into()
    }
}

impl fmt::Debug for SecurityAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityAccount")
            .field("id", &self.id)
            .field("account_name", &self.account_name)
            .field("ticker", &self.ticker)
            .field("security_type", &self.security_type)
            .field("security_subtype", &self.security_subtype)
            .field("scale", &self.scale)
            .field("has_rates", &self.rates.is_some())
            .finish()
    }
}
