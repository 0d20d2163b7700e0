//! Core error types for the foliometrics engine.
//!
//! This module separates caller defects (precondition violations, surfaced
//! as errors) from undefined computation results, which are not errors and
//! are reported as `None` by the extractors.

use chrono::NaiveDate;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Calculation failed: {0}")]
    Calculation(#[from] CalculatorError),
}

/// Errors that occur during return and cost-basis calculations.
///
/// Every variant is a broken caller contract. Undefined numeric outcomes
/// (empty windows, non-convergent solves) never appear here.
#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("Transaction {id} dated {date} arrived after {previous_date}; events must be delivered in (date, id) order")]
    OutOfOrderTransaction {
        id: String,
        date: NaiveDate,
        previous_date: NaiveDate,
    },

    #[error("Cannot merge a {right} accumulator into a {left} accumulator")]
    MetricKindMismatch { left: String, right: String },

    #[error("Cannot merge report windows {left_start}..{left_end} and {right_start}..{right_end}")]
    WindowMismatch {
        left_start: NaiveDate,
        left_end: NaiveDate,
        right_start: NaiveDate,
        right_end: NaiveDate,
    },

    #[error("Cannot merge partial streams of {left} and {right}; both must belong to one security account")]
    SecurityMismatch { left: String, right: String },

    #[error("No usable rate for security {security_id} on {date}")]
    MissingRate {
        security_id: String,
        date: NaiveDate,
    },

    #[error("Calculation failed: {0}")]
    Calculation(String),
}

/// Validation errors for host-supplied input.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid compact date {0}; expected YYYYMMDD")]
    CompactDate(u32),

    #[error("Report window start {start} is after end {end}")]
    WindowBounds { start: NaiveDate, end: NaiveDate },

    #[error("Decimal place count {0} exceeds supported precision")]
    DecimalPlaces(u32),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}
