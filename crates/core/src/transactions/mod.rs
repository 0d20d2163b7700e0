//! Transaction event model and the window scanner that reconstructs
//! boundary positions from an ordered event stream.

mod transactions_model;
mod window_scanner;

pub use transactions_model::{date_from_compact, date_to_compact, TransactionEvent};
pub use window_scanner::{ReportWindow, TransactionWindowScanner};
