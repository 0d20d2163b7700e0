use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Trait defining the contract for security rate and split lookups.
///
/// A rate follows the host convention of security units per one
/// reporting-currency unit, the reciprocal of the unit price. The engine
/// never interprets a single rate on its own: positions are valued by
/// dividing unit counts by the rate, and split adjustment only uses the
/// ratio of an adjusted rate to the rate it was derived from, so any
/// consistent rate convention works.
///
/// A non-positive rate means the provider has no usable data for the date
/// and is surfaced by the callers as a missing-rate error.
pub trait RateProviderTrait: Send + Sync {
    /// Rate effective on `date`.
    fn rate(&self, date: NaiveDate) -> Decimal;

    /// Rescales `rate` across unit-changing corporate actions between
    /// `reference_date` and `target_date`. Both date directions are
    /// supported; adjusting forward across a 2-for-1 split doubles the
    /// rate, adjusting backward halves it.
    fn adjust_rate_for_splits(
        &self,
        reference_date: NaiveDate,
        rate: Decimal,
        target_date: NaiveDate,
    ) -> Decimal;
}
