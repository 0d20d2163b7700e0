//! Report assembly: per-security performance summaries and grouped
//! rollups ready for serialization.

mod report_builder;
mod report_model;

pub use report_builder::{annualized, build_grouped_reports, build_security_report};
pub use report_model::{
    GroupPerformanceReport, GroupedPerformanceReport, SecurityPerformanceReport,
};
