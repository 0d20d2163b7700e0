use super::basis_model::{BasisContext, BasisMethod, CostBasisState};
use crate::constants::POSITION_EPSILON;
use crate::errors::{CalculatorError, Result};
use crate::transactions::TransactionEvent;
use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;

/// Advances long and short cost basis across one security's ordered event
/// stream.
///
/// Long basis accumulates purchase cost plus commission while the position
/// grows and releases cost on reductions, at the running average unit cost
/// or, for `LotMatched`, at the allocation-weighted unit cost of the
/// matched acquisition lots. Short basis mirrors the long side with signs
/// and comparisons reversed, always averaging. An unusable lot table
/// degrades to the average formula; out-of-order delivery is a caller
/// defect.
#[derive(Debug, Clone)]
pub struct CostBasisTracker {
    method: BasisMethod,
    state: CostBasisState,
    last_seen: Option<(NaiveDate, String)>,
}

impl CostBasisTracker {
    pub fn new(method: BasisMethod) -> Self {
        Self {
            method,
            state: CostBasisState::default(),
            last_seen: None,
        }
    }

    /// Rebuilds state by replaying already-sorted prior events, leaving
    /// the tracker ready to advance over the current event.
    pub fn with_history<'a>(
        method: BasisMethod,
        prior_events: impl IntoIterator<Item = &'a TransactionEvent>,
        ctx: &BasisContext,
    ) -> Result<Self> {
        let mut tracker = Self::new(method);
        for event in prior_events {
            tracker.advance(event, ctx)?;
        }
        Ok(tracker)
    }

    pub fn method(&self) -> BasisMethod {
        self.method
    }

    pub fn state(&self) -> CostBasisState {
        self.state
    }

    /// Raw cost of the open long position.
    pub fn long_basis(&self) -> i64 {
        self.state.long_basis
    }

    /// Raw net credit of the open short position.
    pub fn short_basis(&self) -> i64 {
        self.state.short_basis
    }

    /// Applies one event and returns the updated state.
    pub fn advance(&mut self, event: &TransactionEvent, ctx: &BasisContext) -> Result<CostBasisState> {
        if let Some((seen_date, seen_id)) = &self.last_seen {
            let out_of_order = event.date < *seen_date
                || (event.date == *seen_date && event.id.as_str() < seen_id.as_str());
            if out_of_order {
                return Err(CalculatorError::OutOfOrderTransaction {
                    id: event.id.clone(),
                    date: event.date,
                    previous_date: *seen_date,
                }
                .into());
            }
        }
        self.last_seen = Some((event.date, event.id.clone()));

        // Previous position restated in the units in effect on the event
        // date, so comparisons and unit costs line up across splits.
        let adjusted_previous = match self.state.previous_date {
            Some(previous_date) if self.state.previous_position != 0 => ctx.security.adjust_position(
                self.state.previous_position,
                previous_date,
                event.date,
            )?,
            _ => self.state.previous_position,
        };

        let long_basis = self.long_basis_after(event, adjusted_previous, ctx)?;
        let short_basis = self.short_basis_after(event, adjusted_previous, ctx)?;

        self.state = CostBasisState {
            long_basis,
            short_basis,
            previous_position: event.position,
            previous_date: Some(event.date),
        };
        Ok(self.state)
    }

    fn long_basis_after(
        &self,
        event: &TransactionEvent,
        adjusted_previous: i64,
        ctx: &BasisContext,
    ) -> Result<i64> {
        let scale = ctx.security.scale;
        if scale.position(event.position) <= POSITION_EPSILON {
            return Ok(0);
        }
        if event.position >= adjusted_previous {
            return Ok(self.state.long_basis + event.buy + event.commission);
        }

        // Partial reduction: 0 < position < adjusted previous, so the
        // previous position cannot be zero here.
        debug_assert!(adjusted_previous > 0);
        let average = scale.unit_cost(self.state.long_basis, adjusted_previous);
        let unit_cost = match self.method {
            BasisMethod::AverageCost => average,
            BasisMethod::LotMatched => match self.lot_unit_cost(event, ctx)? {
                Some(matched) => matched,
                None => average,
            },
        };
        let released = scale.raw_value(event.position - adjusted_previous, unit_cost)?;
        Ok(self.state.long_basis + released)
    }

    fn short_basis_after(
        &self,
        event: &TransactionEvent,
        adjusted_previous: i64,
        ctx: &BasisContext,
    ) -> Result<i64> {
        let scale = ctx.security.scale;
        if scale.position(event.position) >= -POSITION_EPSILON {
            return Ok(0);
        }
        if event.position <= adjusted_previous {
            return Ok(self.state.short_basis + event.short_sell - event.commission);
        }

        // Partial cover: adjusted previous < position < 0.
        debug_assert!(adjusted_previous < 0);
        let unit_credit = scale.unit_cost(self.state.short_basis, adjusted_previous);
        let released = scale.raw_value(event.position - adjusted_previous, unit_credit)?;
        Ok(self.state.short_basis + released)
    }

    /// Allocation-weighted unit cost over the matched lots, or `None` when
    /// the table is absent or unusable and the average formula applies.
    fn lot_unit_cost(&self, event: &TransactionEvent, ctx: &BasisContext) -> Result<Option<Decimal>> {
        let Some(table) = &event.lot_allocations else {
            return Ok(None);
        };
        if table.is_empty() {
            warn!(
                "transaction {} carries an empty lot table; using average cost",
                event.id
            );
            return Ok(None);
        }

        let scale = ctx.security.scale;
        let mut total_cost = Decimal::ZERO;
        let mut total_units = Decimal::ZERO;
        for (lot_id, allocated) in table {
            let Some(lot) = ctx.transactions.get(lot_id) else {
                warn!(
                    "transaction {} allocates unknown lot {}; using average cost",
                    event.id, lot_id
                );
                return Ok(None);
            };
            if *allocated <= 0 {
                warn!(
                    "transaction {} allocates a non-positive quantity from lot {}; using average cost",
                    event.id, lot_id
                );
                return Ok(None);
            }
            let lot_quantity = ctx.security.adjust_position(lot.quantity, lot.date, event.date)?;
            if lot_quantity <= 0 {
                warn!(
                    "lot {} has no acquired quantity to match; using average cost",
                    lot_id
                );
                return Ok(None);
            }
            let lot_cost = scale.unit_cost(lot.acquisition_cost(), lot_quantity);
            let units = scale.position(*allocated);
            total_cost += units * lot_cost;
            total_units += units;
        }
        if total_units.is_zero() {
            return Ok(None);
        }
        Ok(Some(total_cost / total_units))
    }
}
