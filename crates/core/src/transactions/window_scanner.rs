use super::transactions_model::TransactionEvent;
use crate::errors::{CalculatorError, Result, ValidationError};
use crate::securities::SecurityAccount;
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Closed reporting interval; both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl ReportWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ValidationError::WindowBounds { start, end }.into());
        }
        Ok(Self { start, end })
    }

    /// Calendar year of `end`, up to it.
    pub fn year_to_date(end: NaiveDate) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(end.year(), 1, 1).ok_or_else(|| {
            ValidationError::InvalidInput(format!("no January 1 for year {}", end.year()))
        })?;
        Self::new(start, end)
    }

    /// Trailing twelve months ending at `end`.
    pub fn trailing_year(end: NaiveDate) -> Result<Self> {
        let start = end.checked_sub_months(Months::new(12)).ok_or_else(|| {
            ValidationError::InvalidInput(format!("cannot step one year back from {}", end))
        })?;
        Self::new(start, end)
    }

    /// From the first recorded event date through `end`.
    pub fn full_history(first_event: NaiveDate, end: NaiveDate) -> Result<Self> {
        Self::new(first_event, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Elapsed days between the bounds; zero for a degenerate window.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Fraction of the window remaining after `date`, used to time-weight
    /// flows. Meaningless for zero-day windows; callers check `days` first.
    pub fn weight_after(&self, date: NaiveDate) -> Decimal {
        let remaining = (self.end - date).num_days();
        Decimal::from(remaining) / Decimal::from(self.days())
    }
}

/// The slice of an event the scanner retains: enough to reconstruct a
/// position at a boundary date and to order pointer updates under merges.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PositionMarker {
    date: NaiveDate,
    id: String,
    position: i64,
}

impl PositionMarker {
    fn from_event(event: &TransactionEvent) -> Self {
        Self {
            date: event.date,
            id: event.id.clone(),
            position: event.position,
        }
    }

    fn sort_key(&self) -> (NaiveDate, &str) {
        (self.date, self.id.as_str())
    }
}

/// Partitions one security's ordered event stream around a reporting
/// window while retaining only three events: the last strictly before the
/// window start, the last at or before the start, and the last within the
/// window. Boundary positions are reconstructed from those pointers with
/// split adjustment; no event history is kept.
///
/// Callers deliver the full stream in non-decreasing `(date, id)` order,
/// including events outside the window. Events after the window end are
/// accepted and ignored.
#[derive(Debug, Clone)]
pub struct TransactionWindowScanner {
    window: ReportWindow,
    last_before_start: Option<PositionMarker>,
    last_at_or_before_start: Option<PositionMarker>,
    last_in_window: Option<PositionMarker>,
    last_seen: Option<(NaiveDate, String)>,
}

impl TransactionWindowScanner {
    pub fn new(window: ReportWindow) -> Self {
        Self {
            window,
            last_before_start: None,
            last_at_or_before_start: None,
            last_in_window: None,
            last_seen: None,
        }
    }

    pub fn window(&self) -> ReportWindow {
        self.window
    }

    /// Classifies one event against the window and updates the retained
    /// pointers. Out-of-order delivery is a caller defect.
    pub fn advance(&mut self, event: &TransactionEvent) -> Result<()> {
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

        if event.date < self.window.start() {
            self.last_before_start = Some(PositionMarker::from_event(event));
            self.last_at_or_before_start = Some(PositionMarker::from_event(event));
        } else if event.date <= self.window.end() {
            if event.date == self.window.start() {
                self.last_at_or_before_start = Some(PositionMarker::from_event(event));
            }
            self.last_in_window = Some(PositionMarker::from_event(event));
        }
        Ok(())
    }

    /// Folds another scanner over the same window into this one. Each
    /// pointer takes the later `(date, id)` of the pair, which makes the
    /// operation commutative and associative over stream partitions.
    pub fn merge(&mut self, other: &TransactionWindowScanner) -> Result<()> {
        if self.window != other.window {
            return Err(CalculatorError::WindowMismatch {
                left_start: self.window.start(),
                left_end: self.window.end(),
                right_start: other.window.start(),
                right_end: other.window.end(),
            }
            .into());
        }
        merge_marker(&mut self.last_before_start, &other.last_before_start);
        merge_marker(
            &mut self.last_at_or_before_start,
            &other.last_at_or_before_start,
        );
        merge_marker(&mut self.last_in_window, &other.last_in_window);
        if let Some(seen) = &other.last_seen {
            match &self.last_seen {
                Some(mine) if (mine.0, mine.1.as_str()) >= (seen.0, seen.1.as_str()) => {}
                _ => self.last_seen = Some(seen.clone()),
            }
        }
        Ok(())
    }

    /// Raw position at the window start: the at-or-before-start event's
    /// position restated in start-date units, or zero with no history.
    pub fn start_position(&self, security: &SecurityAccount) -> Result<i64> {
        match &self.last_at_or_before_start {
            Some(marker) => {
                security.adjust_position(marker.position, marker.date, self.window.start())
            }
            None => Ok(0),
        }
    }

    /// Raw position at the window end: the last in-window event's position
    /// restated in end-date units, falling back to the last event before
    /// the start for windows the security sat out, else zero.
    pub fn end_position(&self, security: &SecurityAccount) -> Result<i64> {
        let marker = self
            .last_in_window
            .as_ref()
            .or(self.last_before_start.as_ref());
        match marker {
            Some(marker) => {
                security.adjust_position(marker.position, marker.date, self.window.end())
            }
            None => Ok(0),
        }
    }

    /// Currency value of the start position on the start date.
    pub fn start_value(&self, security: &SecurityAccount) -> Result<Decimal> {
        let position = self.start_position(security)?;
        security.position_value(position, self.window.start())
    }

    /// Currency value of the end position on the end date.
    pub fn end_value(&self, security: &SecurityAccount) -> Result<Decimal> {
        let position = self.end_position(security)?;
        security.position_value(position, self.window.end())
    }
}

fn merge_marker(mine: &mut Option<PositionMarker>, theirs: &Option<PositionMarker>) {
    if let Some(other) = theirs {
        match mine {
            Some(current) if current.sort_key() >= other.sort_key() => {}
            _ => *mine = Some(other.clone()),
        }
    }
}
