use crate::errors::{CalculatorError, Result, ValidationError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Largest decimal-place count accepted from host metadata.
const MAX_DECIMAL_PLACES: u32 = 12;

/// Fixed-point conversion factors for one security/currency pairing.
///
/// Positions are raw integers carrying `security_decimals` implied places,
/// cash amounts carry `cash_decimals`. The two derived factors make
/// quantity-times-price and value-over-quantity arithmetic exact without
/// ever leaving `Decimal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleFactors {
    security_decimals: u32,
    cash_decimals: u32,
}

impl ScaleFactors {
    pub fn new(security_decimals: u32, cash_decimals: u32) -> Result<Self> {
        if security_decimals > MAX_DECIMAL_PLACES {
            return Err(ValidationError::DecimalPlaces(security_decimals).into());
        }
        if cash_decimals > MAX_DECIMAL_PLACES {
            return Err(ValidationError::DecimalPlaces(cash_decimals).into());
        }
        Ok(Self {
            security_decimals,
            cash_decimals,
        })
    }

    /// Factors for a cash balance, which carries the currency's places on
    /// both sides.
    pub fn cash_only(cash_decimals: u32) -> Result<Self> {
        Self::new(cash_decimals, cash_decimals)
    }

    pub fn security_decimals(&self) -> u32 {
        self.security_decimals
    }

    pub fn cash_decimals(&self) -> u32 {
        self.cash_decimals
    }

    /// Raw position to unit count.
    pub fn position(&self, raw: i64) -> Decimal {
        Decimal::new(raw, self.security_decimals)
    }

    /// Raw cash amount to currency amount.
    pub fn cash(&self, raw: i64) -> Decimal {
        Decimal::new(raw, self.cash_decimals)
    }

    /// Unit count back to a raw position, rounded half away from zero.
    pub fn raw_position(&self, units: Decimal) -> Result<i64> {
        to_raw(units, self.security_decimals)
    }

    /// Currency amount back to a raw cash amount, rounded half away from
    /// zero.
    pub fn raw_cash(&self, amount: Decimal) -> Result<i64> {
        to_raw(amount, self.cash_decimals)
    }

    /// Multiplier taking raw-quantity times per-unit price into raw cash:
    /// ten to the (cash minus security) decimal places.
    pub fn value_factor(&self) -> Decimal {
        pow10_ratio(self.cash_decimals, self.security_decimals)
    }

    /// Multiplier taking raw-value over raw-quantity into a per-unit cash
    /// cost: ten to the (security minus cash) decimal places.
    pub fn unit_cost_factor(&self) -> Decimal {
        pow10_ratio(self.security_decimals, self.cash_decimals)
    }

    /// Raw cash value of a raw quantity at a per-unit currency price.
    pub fn raw_value(&self, quantity: i64, unit_price: Decimal) -> Result<i64> {
        let value = Decimal::from(quantity) * unit_price * self.value_factor();
        to_raw(value, 0)
    }

    /// Per-unit currency cost of a raw cash value spread over a raw
    /// quantity. The quantity must be nonzero.
    pub fn unit_cost(&self, value: i64, quantity: i64) -> Decimal {
        debug_assert!(quantity != 0, "unit cost over a zero quantity");
        Decimal::from(value) * self.unit_cost_factor() / Decimal::from(quantity)
    }
}

fn to_raw(scaled: Decimal, places: u32) -> Result<i64> {
    let shifted = scaled * pow10_ratio(places, 0);
    shifted
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| {
            CalculatorError::Calculation(format!("scaled amount {} overflows i64", scaled)).into()
        })
}

/// Exact Decimal for ten to the (num - den) power, either side of zero.
fn pow10_ratio(num: u32, den: u32) -> Decimal {
    if num >= den {
        Decimal::from(10_i64.pow(num - den))
    } else {
        Decimal::new(1, den - num)
    }
}
