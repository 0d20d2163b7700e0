use super::returns_model::{
    merge_sorted_flows, ReturnAudit, ReturnCashFlow, ReturnKind, ReturnTotals, ReturnWindowKind,
};
use crate::errors::{CalculatorError, Result};
use crate::securities::SecurityAccount;
use crate::transactions::{ReportWindow, TransactionEvent, TransactionWindowScanner};
use rust_decimal::Decimal;

/// Lifecycle of a lazily computed figure. Accumulation dirties the cache;
/// a stale cached value is unrepresentable.
#[derive(Debug, Clone, PartialEq)]
enum ResultState {
    Accumulating,
    Cached(Option<Decimal>),
}

/// Computes one return metric for one security account over one window.
///
/// Feed the security's full ordered event stream through `process_event`;
/// the embedded scanner reconstructs boundary positions while flows
/// accumulate for events inside the open-start interval. `result` values
/// lazily and caches until the next event or merge. Partial streams of the
/// same security can be processed in separate extractors and folded
/// together with `merge`, which commutes and associates.
#[derive(Debug, Clone)]
pub struct ReturnExtractor {
    security: SecurityAccount,
    kind: ReturnKind,
    window_kind: ReturnWindowKind,
    scanner: TransactionWindowScanner,
    income: Decimal,
    invested: Decimal,
    capital_flows: Vec<ReturnCashFlow>,
    income_flows: Vec<ReturnCashFlow>,
    state: ResultState,
}

impl ReturnExtractor {
    pub fn new(security: SecurityAccount, kind: ReturnKind, window: ReportWindow) -> Self {
        Self {
            security,
            kind,
            window_kind: ReturnWindowKind::default(),
            scanner: TransactionWindowScanner::new(window),
            income: Decimal::ZERO,
            invested: Decimal::ZERO,
            capital_flows: Vec::new(),
            income_flows: Vec::new(),
            state: ResultState::Accumulating,
        }
    }

    /// Overrides the audit label for non-default window choices.
    pub fn with_window_kind(mut self, window_kind: ReturnWindowKind) -> Self {
        self.window_kind = window_kind;
        self
    }

    pub fn kind(&self) -> ReturnKind {
        self.kind
    }

    pub fn window(&self) -> ReportWindow {
        self.scanner.window()
    }

    pub fn security(&self) -> &SecurityAccount {
        &self.security
    }

    /// Applies one event. Boundary pointers always advance; flows count
    /// only strictly after the window start and at or before its end, since
    /// a start-date event is already embedded in the start position.
    pub fn process_event(&mut self, event: &TransactionEvent) -> Result<()> {
        self.scanner.advance(event)?;
        let window = self.scanner.window();
        if event.date > window.start() && event.date <= window.end() {
            let capital = event.capital_flow();
            if capital != 0 {
                let value = self.security.scale.cash(capital);
                self.capital_flows
                    .push(ReturnCashFlow::new(event.date, value, event.id.clone()));
                if value > Decimal::ZERO {
                    self.invested += value;
                }
            }
            if event.net_income != 0 {
                let value = self.security.scale.cash(event.net_income);
                self.income += value;
                self.income_flows
                    .push(ReturnCashFlow::new(event.date, value, event.id.clone()));
            }
        }
        self.state = ResultState::Accumulating;
        Ok(())
    }

    /// Folds another extractor over the same security, metric, and window
    /// into this one and dirties the cache.
    pub fn merge(&mut self, other: &ReturnExtractor) -> Result<()> {
        if self.kind != other.kind {
            return Err(CalculatorError::MetricKindMismatch {
                left: self.kind.to_string(),
                right: other.kind.to_string(),
            }
            .into());
        }
        if self.security.id != other.security.id {
            return Err(CalculatorError::SecurityMismatch {
                left: self.security.id.clone(),
                right: other.security.id.clone(),
            }
            .into());
        }
        self.scanner.merge(&other.scanner)?;
        self.income += other.income;
        self.invested += other.invested;
        merge_sorted_flows(&mut self.capital_flows, &other.capital_flows);
        merge_sorted_flows(&mut self.income_flows, &other.income_flows);
        self.state = ResultState::Accumulating;
        Ok(())
    }

    /// Materializes the accumulated inputs, valuing boundary positions
    /// through the security's rate provider.
    pub fn totals(&self) -> Result<ReturnTotals> {
        Ok(ReturnTotals {
            window: self.scanner.window(),
            start_value: self.scanner.start_value(&self.security)?,
            end_value: self.scanner.end_value(&self.security)?,
            income: self.income,
            invested: self.invested,
            capital_flows: self.capital_flows.clone(),
            income_flows: self.income_flows.clone(),
        })
    }

    /// The metric value, `None` when undefined for this window. Computed
    /// lazily and cached until the next accumulation.
    pub fn result(&mut self) -> Result<Option<Decimal>> {
        if let ResultState::Cached(value) = &self.state {
            return Ok(*value);
        }
        let value = self.totals()?.compute(self.kind);
        self.state = ResultState::Cached(value);
        Ok(value)
    }

    /// The reconciliation trail behind `result`.
    pub fn audit(&mut self) -> Result<ReturnAudit> {
        let result = self.result()?;
        Ok(self.totals()?.audit(self.kind, self.window_kind, result))
    }
}

/// Accumulates finalized per-security totals into a group figure: scalars
/// add, flow lists union, and the same formula family reads the combined
/// totals. Absorbing is commutative and associative across member order.
#[derive(Debug, Clone)]
pub struct AggregateReturn {
    kind: ReturnKind,
    window_kind: ReturnWindowKind,
    totals: ReturnTotals,
    members: usize,
    state: ResultState,
}

impl AggregateReturn {
    pub fn new(kind: ReturnKind, window: ReportWindow) -> Self {
        Self {
            kind,
            window_kind: ReturnWindowKind::default(),
            totals: ReturnTotals::new(window),
            members: 0,
            state: ResultState::Accumulating,
        }
    }

    pub fn with_window_kind(mut self, window_kind: ReturnWindowKind) -> Self {
        self.window_kind = window_kind;
        self
    }

    pub fn kind(&self) -> ReturnKind {
        self.kind
    }

    pub fn window(&self) -> ReportWindow {
        self.totals.window
    }

    /// Number of member securities absorbed so far.
    pub fn members(&self) -> usize {
        self.members
    }

    /// Folds one security's finalized totals into the group.
    pub fn absorb(&mut self, totals: &ReturnTotals) -> Result<()> {
        self.totals.absorb(totals)?;
        self.members += 1;
        self.state = ResultState::Accumulating;
        Ok(())
    }

    /// Folds an extractor's totals in, insisting on a matching metric.
    pub fn absorb_extractor(&mut self, extractor: &ReturnExtractor) -> Result<()> {
        if self.kind != extractor.kind() {
            return Err(CalculatorError::MetricKindMismatch {
                left: self.kind.to_string(),
                right: extractor.kind().to_string(),
            }
            .into());
        }
        self.absorb(&extractor.totals()?)
    }

    pub fn totals(&self) -> &ReturnTotals {
        &self.totals
    }

    /// The group metric value, lazily computed and cached.
    pub fn result(&mut self) -> Option<Decimal> {
        if let ResultState::Cached(value) = &self.state {
            return *value;
        }
        let value = self.totals.compute(self.kind);
        self.state = ResultState::Cached(value);
        value
    }

    pub fn audit(&mut self) -> ReturnAudit {
        let result = self.result();
        self.totals.audit(self.kind, self.window_kind, result)
    }
}
