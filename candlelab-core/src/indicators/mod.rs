//! Indicator implementations used by the shipped strategies.
//!
//! Every indicator maps a candle slice to a series of the same length, with
//! `NaN` wherever the lookback window is not yet full. Value `i` depends only
//! on candles `0..=i`, so computing on a prefix reproduces the prefix of the
//! full-series result.

pub mod atr;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod vortex;

pub use atr::{true_range, Atr};
pub use rsi::Rsi;
pub use sma::{rolling_mean, Sma};
pub use stddev::{rolling_std, RollingStd};
pub use vortex::{Vortex, VortexLine};

use crate::domain::Candle;

/// A single-series indicator over candles.
pub trait Indicator: Send + Sync {
    /// Name including parameters (e.g. `sma_20`).
    fn name(&self) -> &str;

    /// Number of leading candles that produce `NaN`.
    fn lookback(&self) -> usize;

    /// Compute the full series. Output length equals `candles.len()`.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Value at the last index of a computed series, if it is a number.
pub fn last_valid(series: &[f64]) -> Option<f64> {
    series.last().copied().filter(|v| !v.is_nan())
}

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
