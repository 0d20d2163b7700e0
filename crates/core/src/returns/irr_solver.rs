//! Newton-Raphson annual-rate solver with a bracketing bisection fallback.
//!
//! Flows are `(days since the first flow, signed amount)` pairs and the
//! solved rate `r` zeroes `sum(amount / (1 + r)^(days / 365))`. The
//! discount base is floored at a small positive value so fractional powers
//! stay defined whatever the iteration wanders through.

use crate::constants::{
    IRR_ABSOLUTE_TOLERANCE, IRR_DAYS_PER_YEAR, IRR_MAX_ITERATIONS, IRR_MIN_BASE,
    IRR_RELATIVE_TOLERANCE,
};
use log::debug;

/// Rate grid scanned for a sign change when Newton fails.
const BRACKET_GRID: [f64; 13] = [
    -0.9999, -0.99, -0.9, -0.5, -0.2, 0.0, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 100.0,
];

/// Solves for the annual rate, or `None` when the series has no root the
/// solver can reach: fewer than two flows, all flows one-signed, or no
/// convergence within the iteration limit.
pub(crate) fn solve(flows: &[(f64, f64)], guess: f64) -> Option<f64> {
    if flows.len() < 2 {
        return None;
    }
    let has_positive = flows.iter().any(|(_, amount)| *amount > 0.0);
    let has_negative = flows.iter().any(|(_, amount)| *amount < 0.0);
    if !has_positive || !has_negative {
        return None;
    }

    let tolerance = npv_tolerance(flows);
    newton(flows, guess, tolerance).or_else(|| {
        debug!("newton iteration failed from guess {guess}; bracketing");
        bisect(flows, tolerance)
    })
}

/// Residual tolerance scaled to the series, with an absolute floor.
fn npv_tolerance(flows: &[(f64, f64)]) -> f64 {
    let total: f64 = flows.iter().map(|(_, amount)| amount.abs()).sum();
    IRR_ABSOLUTE_TOLERANCE.max(total * IRR_RELATIVE_TOLERANCE)
}

/// Net present value and its derivative with respect to the rate.
fn npv_and_derivative(flows: &[(f64, f64)], rate: f64) -> (f64, f64) {
    let base = (1.0 + rate).max(IRR_MIN_BASE);
    let mut npv = 0.0;
    let mut derivative = 0.0;
    for (days, amount) in flows {
        let exponent = days / IRR_DAYS_PER_YEAR;
        let discount = base.powf(exponent);
        npv += amount / discount;
        derivative -= exponent * amount / (discount * base);
    }
    (npv, derivative)
}

fn npv(flows: &[(f64, f64)], rate: f64) -> f64 {
    npv_and_derivative(flows, rate).0
}

fn newton(flows: &[(f64, f64)], guess: f64, tolerance: f64) -> Option<f64> {
    let mut rate = guess.max(IRR_MIN_BASE - 1.0);
    for iteration in 0..IRR_MAX_ITERATIONS {
        let (residual, derivative) = npv_and_derivative(flows, rate);
        if residual.abs() < tolerance {
            debug!("rate solver converged to {rate} after {iteration} iterations");
            return Some(rate);
        }
        if !derivative.is_finite() || derivative.abs() < f64::EPSILON {
            return None;
        }
        let next = (rate - residual / derivative).max(IRR_MIN_BASE - 1.0);
        if !next.is_finite() {
            return None;
        }
        if (next - rate).abs() < 1e-12 {
            // Stalled; accept only if the residual is already inside
            // tolerance at the fixed point.
            return (npv(flows, next).abs() < tolerance).then_some(next);
        }
        rate = next;
    }
    None
}

/// Scans a fixed rate grid for a sign change and halves the bracket.
fn bisect(flows: &[(f64, f64)], tolerance: f64) -> Option<f64> {
    let mut previous_rate = BRACKET_GRID[0];
    let mut previous_npv = npv(flows, previous_rate);
    for &rate in &BRACKET_GRID[1..] {
        if previous_npv.abs() < tolerance {
            return Some(previous_rate);
        }
        let current_npv = npv(flows, rate);
        if previous_npv * current_npv < 0.0 {
            return halve(flows, previous_rate, rate, tolerance);
        }
        previous_rate = rate;
        previous_npv = current_npv;
    }
    None
}

fn halve(flows: &[(f64, f64)], mut low: f64, mut high: f64, tolerance: f64) -> Option<f64> {
    let mut low_npv = npv(flows, low);
    for _ in 0..IRR_MAX_ITERATIONS {
        let mid = 0.5 * (low + high);
        let mid_npv = npv(flows, mid);
        if mid_npv.abs() < tolerance {
            return Some(mid);
        }
        if low_npv * mid_npv < 0.0 {
            high = mid;
        } else {
            low = mid;
            low_npv = mid_npv;
        }
    }
    None
}
