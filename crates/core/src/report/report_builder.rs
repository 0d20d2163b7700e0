use super::report_model::{
    GroupPerformanceReport, GroupedPerformanceReport, SecurityPerformanceReport,
};
use crate::aggregation::{AggregationPolicy, GroupLabel, GroupedReturns, MATCH_ALL_LABEL};
use crate::constants::{DAYS_PER_YEAR, DECIMAL_PRECISION};
use crate::cost_basis::{BasisContext, BasisMethod, CostBasisTracker, TransactionIndex};
use crate::errors::Result;
use crate::returns::{
    AggregateReturn, ReturnAudit, ReturnExtractor, ReturnKind, ReturnWindowKind,
};
use crate::securities::SecurityAccount;
use crate::transactions::{ReportWindow, TransactionEvent, TransactionWindowScanner};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// Converts a whole-window return into an annual rate. Windows under a
/// year report the unannualized figure unchanged; a total loss caps the
/// result at -1 so the root stays real.
pub fn annualized(rate: Decimal, window: ReportWindow) -> Decimal {
    if rate <= dec!(-1) {
        return dec!(-1);
    }
    let days = window.days();
    if days <= 0 {
        return rate;
    }
    let years = Decimal::from(days) / DAYS_PER_YEAR;
    if years < Decimal::ONE {
        return rate;
    }
    let base = Decimal::ONE + rate;
    let exponent = Decimal::ONE / years;
    (base.powd(exponent) - Decimal::ONE).round_dp(DECIMAL_PRECISION)
}

/// Assembles the full performance picture for one security account from
/// its ordered event stream: all three return metrics with audits, the
/// boundary positions and values, and the basis at the window end.
pub fn build_security_report(
    security: &SecurityAccount,
    events: &[TransactionEvent],
    window: ReportWindow,
    window_kind: ReturnWindowKind,
    method: BasisMethod,
) -> Result<SecurityPerformanceReport> {
    let index = TransactionIndex::from_events(events);
    let ctx = BasisContext::new(security, &index);
    let mut scanner = TransactionWindowScanner::new(window);
    let mut tracker = CostBasisTracker::new(method);
    let mut extractors: Vec<ReturnExtractor> = ReturnKind::ALL
        .into_iter()
        .map(|kind| {
            ReturnExtractor::new(security.clone(), kind, window).with_window_kind(window_kind)
        })
        .collect();

    for event in events {
        scanner.advance(event)?;
        if event.date <= window.end() {
            tracker.advance(event, &ctx)?;
        }
        for extractor in &mut extractors {
            extractor.process_event(event)?;
        }
    }

    let mut ordinary = None;
    let mut modified_dietz = None;
    let mut internal_rate = None;
    let mut audits = Vec::with_capacity(extractors.len());
    for extractor in &mut extractors {
        let result = extractor.result()?;
        match extractor.kind() {
            ReturnKind::Ordinary => ordinary = result,
            ReturnKind::ModifiedDietz => modified_dietz = result,
            ReturnKind::InternalRate => internal_rate = result,
        }
        audits.push(extractor.audit()?);
    }

    Ok(SecurityPerformanceReport {
        security_id: security.id.clone(),
        account_name: security.account_name.clone(),
        ticker: security.ticker.clone(),
        window_kind,
        start_date: window.start(),
        end_date: window.end(),
        start_position: security.scale.position(scanner.start_position(security)?),
        end_position: security.scale.position(scanner.end_position(security)?),
        start_value: scanner.start_value(security)?,
        end_value: scanner.end_value(security)?,
        ordinary_return: ordinary,
        annualized_ordinary_return: ordinary.map(|rate| annualized(rate, window)),
        modified_dietz_return: modified_dietz,
        annualized_modified_dietz_return: modified_dietz.map(|rate| annualized(rate, window)),
        internal_rate_return: internal_rate,
        basis_method: method,
        long_basis: security.scale.cash(tracker.long_basis()),
        short_basis: security.scale.cash(tracker.short_basis()),
        audits,
    })
}

/// Builds grouped figures for every metric under one policy: each cell,
/// each primary rollup, and the grand total carry their three results and
/// audits.
pub fn build_grouped_reports(
    policy: AggregationPolicy,
    window: ReportWindow,
    window_kind: ReturnWindowKind,
    holdings: &[(SecurityAccount, Vec<TransactionEvent>)],
) -> Result<GroupedPerformanceReport> {
    let refines = policy.secondary_refines_primary();
    let mut cell_figures: BTreeMap<GroupLabel, Vec<GroupFigures>> = BTreeMap::new();
    let mut rollup_figures: BTreeMap<String, Vec<GroupFigures>> = BTreeMap::new();
    let mut total_figures: Vec<GroupFigures> = Vec::new();

    for kind in ReturnKind::ALL {
        let mut extractors = Vec::with_capacity(holdings.len());
        for (security, events) in holdings {
            let mut extractor = ReturnExtractor::new(security.clone(), kind, window)
                .with_window_kind(window_kind);
            for event in events {
                extractor.process_event(event)?;
            }
            extractors.push(extractor);
        }

        let mut grouped = GroupedReturns::new(policy, kind, window, window_kind);
        for extractor in &extractors {
            grouped.add(extractor)?;
        }

        for (label, aggregate) in grouped.cells_mut() {
            cell_figures
                .entry(label.clone())
                .or_default()
                .push(GroupFigures::from_aggregate(aggregate));
        }
        for (primary, aggregate) in grouped.rollups_mut() {
            rollup_figures
                .entry(primary.to_string())
                .or_default()
                .push(GroupFigures::from_aggregate(aggregate));
        }
        total_figures.push(GroupFigures::from_aggregate(grouped.total_mut()));
    }

    let groups = cell_figures
        .into_iter()
        .map(|(label, figures)| {
            let display_label = label.render(refines);
            assemble_group(label, display_label, figures)
        })
        .collect();
    let rollups = rollup_figures
        .into_iter()
        .map(|(primary, figures)| {
            let label = GroupLabel::new(primary.clone(), MATCH_ALL_LABEL);
            assemble_group(label, primary, figures)
        })
        .collect();
    let total = assemble_group(
        GroupLabel::new(MATCH_ALL_LABEL, MATCH_ALL_LABEL),
        MATCH_ALL_LABEL.to_string(),
        total_figures,
    );

    Ok(GroupedPerformanceReport {
        policy,
        window_kind,
        start_date: window.start(),
        end_date: window.end(),
        groups,
        rollups,
        total,
    })
}

/// One metric's finalized figures for one group, captured while the
/// grouping for that metric is still mutable.
struct GroupFigures {
    members: usize,
    result: Option<Decimal>,
    audit: ReturnAudit,
}

impl GroupFigures {
    fn from_aggregate(aggregate: &mut AggregateReturn) -> Self {
        Self {
            members: aggregate.members(),
            result: aggregate.result(),
            audit: aggregate.audit(),
        }
    }
}

fn assemble_group(
    label: GroupLabel,
    display_label: String,
    figures: Vec<GroupFigures>,
) -> GroupPerformanceReport {
    let mut ordinary = None;
    let mut modified_dietz = None;
    let mut internal_rate = None;
    let mut members = 0;
    let mut audits = Vec::with_capacity(figures.len());
    for group in figures {
        members = group.members;
        match group.audit.kind {
            ReturnKind::Ordinary => ordinary = group.result,
            ReturnKind::ModifiedDietz => modified_dietz = group.result,
            ReturnKind::InternalRate => internal_rate = group.result,
        }
        audits.push(group.audit);
    }
    let start_value = audits.first().map(|audit| audit.start_value).unwrap_or_default();
    let end_value = audits.first().map(|audit| audit.end_value).unwrap_or_default();
    GroupPerformanceReport {
        label,
        display_label,
        members,
        start_value,
        end_value,
        ordinary_return: ordinary,
        modified_dietz_return: modified_dietz,
        internal_rate_return: internal_rate,
        audits,
    }
}
