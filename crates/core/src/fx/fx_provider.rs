use super::fx_model::SplitAdjustment;
use super::fx_traits::RateProviderTrait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// In-memory rate history with an ordered split list.
///
/// Rates are stored per day; a lookup returns the latest rate at or before
/// the requested date, falling back to the earliest known rate for dates
/// that precede the history. Using a BTreeMap keeps the at-or-before
/// lookup O(log N).
pub struct StaticRateProvider {
    rates: BTreeMap<NaiveDate, Decimal>,
    splits: Vec<SplitAdjustment>,
}

impl StaticRateProvider {
    /// Builds a provider from host-convention rates (units per
    /// reporting-currency unit).
    pub fn new(
        rates: impl IntoIterator<Item = (NaiveDate, Decimal)>,
        splits: impl IntoIterator<Item = SplitAdjustment>,
    ) -> Self {
        let mut splits: Vec<SplitAdjustment> = splits.into_iter().collect();
        splits.sort_by_key(|split| split.date);
        Self {
            rates: rates.into_iter().collect(),
            splits,
        }
    }

    /// Builds a provider from unit prices, inverting each into a rate.
    /// Non-positive prices are skipped.
    pub fn from_prices(
        prices: impl IntoIterator<Item = (NaiveDate, Decimal)>,
        splits: impl IntoIterator<Item = SplitAdjustment>,
    ) -> Self {
        let rates = prices
            .into_iter()
            .filter(|(_, price)| price.is_sign_positive() && !price.is_zero())
            .map(|(date, price)| (date, Decimal::ONE / price));
        Self::new(rates, splits)
    }

    /// Cumulative quantity factor for splits effective after `from` and at
    /// or before `to`. Reversed date order inverts the factor.
    fn factor_between(&self, from: NaiveDate, to: NaiveDate) -> Decimal {
        if from == to {
            return Decimal::ONE;
        }
        let (low, high, invert) = if from < to {
            (from, to, false)
        } else {
            (to, from, true)
        };
        let mut factor = Decimal::ONE;
        for split in &self.splits {
            if split.date > low && split.date <= high && !split.quantity_factor.is_zero() {
                factor *= split.quantity_factor;
            }
        }
        if invert && !factor.is_zero() {
            Decimal::ONE / factor
        } else {
            factor
        }
    }
}

impl RateProviderTrait for StaticRateProvider {
    fn rate(&self, date: NaiveDate) -> Decimal {
        self.rates
            .range(..=date)
            .next_back()
            .or_else(|| self.rates.iter().next())
            .map(|(_, rate)| *rate)
            .unwrap_or(Decimal::ZERO)
    }

    fn adjust_rate_for_splits(
        &self,
        reference_date: NaiveDate,
        rate: Decimal,
        target_date: NaiveDate,
    ) -> Decimal {
        rate * self.factor_between(reference_date, target_date)
    }
}
