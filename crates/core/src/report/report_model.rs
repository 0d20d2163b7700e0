use crate::aggregation::{AggregationPolicy, GroupLabel};
use crate::cost_basis::BasisMethod;
use crate::returns::{ReturnAudit, ReturnWindowKind};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Performance of one security account over one window: boundary
/// positions and values, every return metric, the basis standing at the
/// window end, and the reconciliation audit behind each figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPerformanceReport {
    pub security_id: String,
    pub account_name: String,
    pub ticker: String,
    pub window_kind: ReturnWindowKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_position: Decimal,
    pub end_position: Decimal,
    pub start_value: Decimal,
    pub end_value: Decimal,
    pub ordinary_return: Option<Decimal>,
    pub annualized_ordinary_return: Option<Decimal>,
    pub modified_dietz_return: Option<Decimal>,
    pub annualized_modified_dietz_return: Option<Decimal>,
    pub internal_rate_return: Option<Decimal>,
    pub basis_method: BasisMethod,
    pub long_basis: Decimal,
    pub short_basis: Decimal,
    pub audits: Vec<ReturnAudit>,
}

/// One aggregation cell or rollup: the combined figures for every metric
/// over the group's absorbed securities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPerformanceReport {
    pub label: GroupLabel,
    pub display_label: String,
    pub members: usize,
    pub start_value: Decimal,
    pub end_value: Decimal,
    pub ordinary_return: Option<Decimal>,
    pub modified_dietz_return: Option<Decimal>,
    pub internal_rate_return: Option<Decimal>,
    pub audits: Vec<ReturnAudit>,
}

/// Grouped performance under one policy: cells keyed by label pair,
/// primary-level rollups, and the grand total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedPerformanceReport {
    pub policy: AggregationPolicy,
    pub window_kind: ReturnWindowKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub groups: Vec<GroupPerformanceReport>,
    pub rollups: Vec<GroupPerformanceReport>,
    pub total: GroupPerformanceReport,
}
