use super::aggregation_model::{AggregationPolicy, GroupLabel};
use crate::errors::{CalculatorError, Result};
use crate::returns::{AggregateReturn, ReturnExtractor, ReturnKind, ReturnWindowKind};
use crate::transactions::ReportWindow;
use std::collections::BTreeMap;

/// Per-security returns bucketed by one policy: `(primary, secondary)`
/// cells, primary-level rollups, and a grand total, each an
/// `AggregateReturn` over the shared window. Securities are absorbed in
/// any order; every cell, rollup, and the total read the same absorbed
/// scalars, so the refinement flag never changes a figure.
#[derive(Debug, Clone)]
pub struct GroupedReturns {
    policy: AggregationPolicy,
    window_kind: ReturnWindowKind,
    cells: BTreeMap<GroupLabel, AggregateReturn>,
    rollups: BTreeMap<String, AggregateReturn>,
    total: AggregateReturn,
}

impl GroupedReturns {
    /// An empty grouping ready to bucket extractors carrying `kind` over
    /// `window`; `window_kind` labels every cell's audit.
    pub fn new(
        policy: AggregationPolicy,
        kind: ReturnKind,
        window: ReportWindow,
        window_kind: ReturnWindowKind,
    ) -> Self {
        Self {
            policy,
            window_kind,
            cells: BTreeMap::new(),
            rollups: BTreeMap::new(),
            total: AggregateReturn::new(kind, window).with_window_kind(window_kind),
        }
    }

    /// Buckets finalized extractors, insisting every one carries `kind`
    /// over `window`.
    pub fn build(
        policy: AggregationPolicy,
        kind: ReturnKind,
        window: ReportWindow,
        extractors: &[ReturnExtractor],
    ) -> Result<Self> {
        let mut grouped = Self::new(policy, kind, window, ReturnWindowKind::default());
        for extractor in extractors {
            grouped.add(extractor)?;
        }
        Ok(grouped)
    }

    /// Buckets one more security's totals into its cell, its primary
    /// rollup, and the grand total.
    pub fn add(&mut self, extractor: &ReturnExtractor) -> Result<()> {
        let kind = self.total.kind();
        let window = self.total.window();
        if extractor.kind() != kind {
            return Err(CalculatorError::MetricKindMismatch {
                left: kind.to_string(),
                right: extractor.kind().to_string(),
            }
            .into());
        }
        if extractor.window() != window {
            return Err(CalculatorError::WindowMismatch {
                left_start: window.start(),
                left_end: window.end(),
                right_start: extractor.window().start(),
                right_end: extractor.window().end(),
            }
            .into());
        }
        let totals = extractor.totals()?;
        let label = GroupLabel::for_security(self.policy, extractor.security());
        let primary = label.primary.clone();
        let window_kind = self.window_kind;
        self.cells
            .entry(label)
            .or_insert_with(|| AggregateReturn::new(kind, window).with_window_kind(window_kind))
            .absorb(&totals)?;
        self.rollups
            .entry(primary)
            .or_insert_with(|| AggregateReturn::new(kind, window).with_window_kind(window_kind))
            .absorb(&totals)?;
        self.total.absorb(&totals)
    }

    pub fn policy(&self) -> AggregationPolicy {
        self.policy
    }

    pub fn kind(&self) -> ReturnKind {
        self.total.kind()
    }

    pub fn window(&self) -> ReportWindow {
        self.total.window()
    }

    pub fn window_kind(&self) -> ReturnWindowKind {
        self.window_kind
    }

    /// Securities absorbed into the grand total.
    pub fn members(&self) -> usize {
        self.total.members()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = (&GroupLabel, &AggregateReturn)> {
        self.cells.iter()
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = (&GroupLabel, &mut AggregateReturn)> {
        self.cells.iter_mut()
    }

    pub fn cell_mut(&mut self, primary: &str, secondary: &str) -> Option<&mut AggregateReturn> {
        self.cells
            .iter_mut()
            .find(|(label, _)| label.primary == primary && label.secondary == secondary)
            .map(|(_, aggregate)| aggregate)
    }

    pub fn rollups_mut(&mut self) -> impl Iterator<Item = (&str, &mut AggregateReturn)> {
        self.rollups
            .iter_mut()
            .map(|(primary, aggregate)| (primary.as_str(), aggregate))
    }

    pub fn rollup_mut(&mut self, primary: &str) -> Option<&mut AggregateReturn> {
        self.rollups.get_mut(primary)
    }

    pub fn total(&self) -> &AggregateReturn {
        &self.total
    }

    pub fn total_mut(&mut self) -> &mut AggregateReturn {
        &mut self.total
    }

    /// Display label for one cell under this policy's refinement flag.
    pub fn cell_label(&self, label: &GroupLabel) -> String {
        label.render(self.policy.secondary_refines_primary())
    }
}
