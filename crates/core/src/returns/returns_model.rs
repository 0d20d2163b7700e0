use super::irr_solver;
use crate::constants::{
    DECIMAL_PRECISION, DISPLAY_DECIMAL_PRECISION, IRR_DAYS_PER_YEAR, IRR_DEFAULT_GUESS,
};
use crate::errors::{CalculatorError, Result};
use crate::transactions::ReportWindow;
use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Return metric selected at extractor construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnKind {
    Ordinary,
    ModifiedDietz,
    InternalRate,
}

impl ReturnKind {
    pub const ALL: [ReturnKind; 3] = [
        ReturnKind::Ordinary,
        ReturnKind::ModifiedDietz,
        ReturnKind::InternalRate,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ReturnKind::Ordinary => "ORDINARY",
            ReturnKind::ModifiedDietz => "MODIFIED_DIETZ",
            ReturnKind::InternalRate => "INTERNAL_RATE",
        }
    }
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the reporting window was chosen. Only labels audits and reports;
/// never feeds arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnWindowKind {
    #[default]
    Reporting,
    Inception,
    TrailingYear,
    YearToDate,
    Custom,
}

impl ReturnWindowKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReturnWindowKind::Reporting => "REPORTING",
            ReturnWindowKind::Inception => "INCEPTION",
            ReturnWindowKind::TrailingYear => "TRAILING_YEAR",
            ReturnWindowKind::YearToDate => "YEAR_TO_DATE",
            ReturnWindowKind::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for ReturnWindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One dated currency flow with the transaction it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnCashFlow {
    pub date: NaiveDate,
    pub value: Decimal,
    pub source_id: String,
}

impl ReturnCashFlow {
    pub fn new(date: NaiveDate, value: Decimal, source_id: impl Into<String>) -> Self {
        Self {
            date,
            value,
            source_id: source_id.into(),
        }
    }

    fn sort_key(&self) -> (NaiveDate, &str) {
        (self.date, self.source_id.as_str())
    }
}

/// Sums same-date entries of a sorted flow list into one entry per date,
/// keeping the smallest contributing source id and dropping dates that net
/// to zero.
pub fn collapse_flows(flows: &[ReturnCashFlow]) -> Vec<ReturnCashFlow> {
    let mut collapsed: Vec<ReturnCashFlow> = Vec::new();
    for flow in flows {
        match collapsed.last_mut() {
            Some(last) if last.date == flow.date => last.value += flow.value,
            _ => collapsed.push(flow.clone()),
        }
    }
    collapsed.retain(|flow| !flow.value.is_zero());
    collapsed
}

/// Merges a second sorted flow list into the first, keeping `(date, id)`
/// order.
pub(crate) fn merge_sorted_flows(mine: &mut Vec<ReturnCashFlow>, theirs: &[ReturnCashFlow]) {
    if theirs.is_empty() {
        return;
    }
    let mut merged = Vec::with_capacity(mine.len() + theirs.len());
    let mut left = std::mem::take(mine).into_iter().peekable();
    let mut right = theirs.iter().cloned().peekable();
    loop {
        match (left.peek(), right.peek()) {
            (Some(a), Some(b)) => {
                if a.sort_key() <= b.sort_key() {
                    merged.push(left.next().unwrap());
                } else {
                    merged.push(right.next().unwrap());
                }
            }
            (Some(_), None) => merged.push(left.next().unwrap()),
            (None, Some(_)) => merged.push(right.next().unwrap()),
            (None, None) => break,
        }
    }
    *mine = merged;
}

/// Accumulated inputs of one return computation over one window: boundary
/// values, the income scalar, invested capital, and the dated flow lists.
/// The metric kind only selects which formula reads these at compute time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnTotals {
    pub window: ReportWindow,
    pub start_value: Decimal,
    pub end_value: Decimal,
    pub income: Decimal,
    pub invested: Decimal,
    pub capital_flows: Vec<ReturnCashFlow>,
    pub income_flows: Vec<ReturnCashFlow>,
}

impl ReturnTotals {
    pub fn new(window: ReportWindow) -> Self {
        Self {
            window,
            start_value: Decimal::ZERO,
            end_value: Decimal::ZERO,
            income: Decimal::ZERO,
            invested: Decimal::ZERO,
            capital_flows: Vec::new(),
            income_flows: Vec::new(),
        }
    }

    /// Folds another security's totals over the same window into this one:
    /// scalars add, sorted flow lists union. Commutative and associative.
    pub fn absorb(&mut self, other: &ReturnTotals) -> Result<()> {
        if self.window != other.window {
            return Err(CalculatorError::WindowMismatch {
                left_start: self.window.start(),
                left_end: self.window.end(),
                right_start: other.window.start(),
                right_end: other.window.end(),
            }
            .into());
        }
        self.start_value += other.start_value;
        self.end_value += other.end_value;
        self.income += other.income;
        self.invested += other.invested;
        merge_sorted_flows(&mut self.capital_flows, &other.capital_flows);
        merge_sorted_flows(&mut self.income_flows, &other.income_flows);
        Ok(())
    }

    fn flows_total(&self) -> Decimal {
        self.capital_flows.iter().map(|flow| flow.value).sum()
    }

    fn gain(&self) -> Decimal {
        self.end_value + self.income - self.start_value - self.flows_total()
    }

    /// Unweighted holding-period return: the gain over start value plus
    /// capital put in during the window.
    pub fn ordinary_return(&self) -> Option<Decimal> {
        if self.window.days() <= 0 {
            return None;
        }
        let denominator = self.start_value + self.invested;
        if denominator.is_zero() {
            return None;
        }
        Some((self.gain() / denominator).round_dp(DECIMAL_PRECISION))
    }

    /// Modified Dietz return: the gain over start value plus capital flows
    /// weighted by the fraction of the window remaining after each flow.
    pub fn modified_dietz_return(&self) -> Option<Decimal> {
        if self.window.days() <= 0 {
            return None;
        }
        let weighted: Decimal = self
            .capital_flows
            .iter()
            .map(|flow| self.window.weight_after(flow.date) * flow.value)
            .sum();
        let denominator = self.start_value + weighted;
        if denominator.is_zero() {
            return None;
        }
        Some((self.gain() / denominator).round_dp(DECIMAL_PRECISION))
    }

    /// Annualized internal rate: the root of the discounted flow series
    /// built from the sign-flipped start value and capital flows, income
    /// at its dates, and the end value. Undefined when fewer than two
    /// dated amounts survive collapsing or the solver does not converge.
    pub fn internal_rate_return(&self) -> Option<Decimal> {
        let days = self.window.days();
        if days <= 0 {
            return None;
        }

        let mut series: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        if !self.start_value.is_zero() {
            series.insert(self.window.start(), -self.start_value);
        }
        for flow in &self.capital_flows {
            *series.entry(flow.date).or_default() -= flow.value;
        }
        for flow in &self.income_flows {
            *series.entry(flow.date).or_default() += flow.value;
        }
        if !self.end_value.is_zero() {
            *series.entry(self.window.end()).or_default() += self.end_value;
        }

        let first_date = *series.keys().next()?;
        let flows: Vec<(f64, f64)> = series
            .iter()
            .filter(|(_, value)| !value.is_zero())
            .map(|(date, value)| {
                ((*date - first_date).num_days() as f64, value.to_f64().unwrap_or(0.0))
            })
            .collect();
        if flows.len() < 2 {
            return None;
        }

        let years = days as f64 / IRR_DAYS_PER_YEAR;
        let rate = irr_solver::solve(&flows, self.irr_guess(years))?;
        Decimal::from_f64(rate).map(|value| value.round_dp(DECIMAL_PRECISION))
    }

    /// Newton seed: the Modified Dietz return spread over the window's
    /// years, floored so the discount base stays positive, with a 10%
    /// default when Dietz gives nothing usable.
    fn irr_guess(&self, years: f64) -> f64 {
        match self.modified_dietz_return().and_then(|dietz| dietz.to_f64()) {
            Some(dietz) => {
                let base = 1.0 + dietz / years;
                if base <= 0.0 {
                    IRR_DEFAULT_GUESS
                } else {
                    base.max(0.01) - 1.0
                }
            }
            None => IRR_DEFAULT_GUESS,
        }
    }

    pub fn compute(&self, kind: ReturnKind) -> Option<Decimal> {
        match kind {
            ReturnKind::Ordinary => self.ordinary_return(),
            ReturnKind::ModifiedDietz => self.modified_dietz_return(),
            ReturnKind::InternalRate => self.internal_rate_return(),
        }
    }

    pub fn audit(
        &self,
        kind: ReturnKind,
        window_kind: ReturnWindowKind,
        result: Option<Decimal>,
    ) -> ReturnAudit {
        ReturnAudit {
            kind,
            window_kind,
            start_date: self.window.start(),
            end_date: self.window.end(),
            start_value: self.start_value,
            end_value: self.end_value,
            income: self.income,
            invested: self.invested,
            capital_flows: collapse_flows(&self.capital_flows),
            income_flows: collapse_flows(&self.income_flows),
            result,
        }
    }
}

/// Everything a host needs to reconcile one return figure by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnAudit {
    pub kind: ReturnKind,
    pub window_kind: ReturnWindowKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_value: Decimal,
    pub end_value: Decimal,
    pub income: Decimal,
    pub invested: Decimal,
    pub capital_flows: Vec<ReturnCashFlow>,
    pub income_flows: Vec<ReturnCashFlow>,
    pub result: Option<Decimal>,
}

impl fmt::Display for ReturnAudit {
    /// Currency amounts render at display precision; the result keeps its
    /// full rate precision.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cash = |value: &Decimal| value.round_dp(DISPLAY_DECIMAL_PRECISION);
        writeln!(
            f,
            "{} [{}] {}..{}: start {}, end {}, income {}, invested {}",
            self.kind,
            self.window_kind,
            self.start_date,
            self.end_date,
            cash(&self.start_value),
            cash(&self.end_value),
            cash(&self.income),
            cash(&self.invested)
        )?;
        for flow in &self.capital_flows {
            writeln!(f, "  capital {} {} ({})", flow.date, cash(&flow.value), flow.source_id)?;
        }
        for flow in &self.income_flows {
            writeln!(f, "  income  {} {} ({})", flow.date, cash(&flow.value), flow.source_id)?;
        }
        match &self.result {
            Some(value) => write!(f, "  result {}", value),
            None => write!(f, "  result undefined"),
        }
    }
}
