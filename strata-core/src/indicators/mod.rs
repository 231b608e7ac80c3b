//! Rolling indicator primitives used by the signal layers.
//!
//! All functions take a value slice and return a `Vec<f64>` of the same
//! length, with NaN for positions where the window has insufficient history.
//! A NaN inside a window makes that window's output NaN — missing data is
//! never silently skipped.

pub mod rolling;
pub mod rsi;

pub use rolling::{momentum, rolling_max, rolling_mean, rolling_min, rolling_std, zscore};
pub use rsi::rsi;

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
