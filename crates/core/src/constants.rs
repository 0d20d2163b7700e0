use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Decimal precision for reported return rates
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Positions within this distance of zero are treated as flat
pub const POSITION_EPSILON: Decimal = dec!(0.00001);

/// Day count used when annualizing a holding-period return
pub const DAYS_PER_YEAR: Decimal = dec!(365.25);

/// Day count used for discount exponents inside the rate solver
pub const IRR_DAYS_PER_YEAR: f64 = 365.0;

/// Maximum Newton-Raphson iterations before the solver gives up
pub const IRR_MAX_ITERATIONS: u32 = 100;

/// Absolute floor for the net-present-value convergence tolerance
pub const IRR_ABSOLUTE_TOLERANCE: f64 = 1e-6;

/// Relative tolerance, scaled by the series' total absolute flow
pub const IRR_RELATIVE_TOLERANCE: f64 = 1e-9;

/// Annual-rate guess used when Modified Dietz gives no usable seed
pub const IRR_DEFAULT_GUESS: f64 = 0.10;

/// Smallest discount base (1 + r) the solver will evaluate
pub const IRR_MIN_BASE: f64 = 1e-6;
