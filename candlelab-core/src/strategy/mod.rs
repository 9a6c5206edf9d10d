//! Strategy contract and the shipped signal functions.
//!
//! Two layers:
//! - [`Strategy`]: a signal function that looks at a candle prefix and
//!   answers with a desired [`Stance`] (or `None` when inconclusive).
//! - [`StrategyAdapter`]: what the simulator talks to. It turns whatever the
//!   strategy produces into one [`Decision`] per candle.
//!
//! Both are called with `&candles[..=i]` only, so a strategy can never see
//! the future. Implementations must be pure: the same prefix always yields
//! the same answer.

pub mod adapter;
pub mod atr_trailing_stop;
pub mod ma_anticipation;
pub mod ma_cross;
pub mod ma_rsi_volume;
pub mod params;
pub mod rsi_threshold;
pub mod schedule;
pub mod vortex_cross;

pub use adapter::{FallbackAdapter, SignalAdapter};
pub use atr_trailing_stop::{AtrTrailingStop, AtrTrailingStopParams};
pub use ma_anticipation::{MovingAverageAnticipation, MovingAverageAnticipationParams};
pub use ma_cross::{MovingAverageCross, MovingAverageCrossParams};
pub use ma_rsi_volume::{MaRsiVolume, MaRsiVolumeParams};
pub use params::StrategyParams;
pub use rsi_threshold::{RsiThreshold, RsiThresholdParams};
pub use schedule::DecisionSchedule;
pub use vortex_cross::{VortexCross, VortexParams};

use crate::domain::{Candle, Decision, Stance};
use crate::error::{ConfigError, StrategyError};

/// Market-timing signal over a candle prefix.
///
/// # Invariants
/// - `evaluate()` only reads the slice it is given (the last element is the
///   current candle).
/// - `evaluate()` is deterministic for the same prefix.
/// - `None` means "no opinion"; it is not an error.
pub trait Strategy: Send + Sync {
    /// Stable identifier, used in logs and result files.
    fn name(&self) -> &str;

    /// Minimum prefix length before the strategy can be conclusive.
    fn warmup_candles(&self) -> usize;

    fn evaluate(&self, candles: &[Candle]) -> Result<Option<Stance>, StrategyError>;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn warmup_candles(&self) -> usize {
        (**self).warmup_candles()
    }

    fn evaluate(&self, candles: &[Candle]) -> Result<Option<Stance>, StrategyError> {
        (**self).evaluate(candles)
    }
}

/// The single interface the simulator uses to obtain decisions.
pub trait StrategyAdapter: Send + Sync {
    /// Decision for the last candle of `candles`.
    fn decide(&self, candles: &[Candle]) -> Result<Decision, StrategyError>;

    /// Label for logs and results.
    fn label(&self) -> String {
        "custom".to_string()
    }
}

/// The trailing `len` candles of a prefix (or all of them if shorter).
pub(crate) fn tail(candles: &[Candle], len: usize) -> &[Candle] {
    &candles[candles.len().saturating_sub(len)..]
}

/// Value `back` positions before the end of a series, if it is a number.
pub(crate) fn value_back(series: &[f64], back: usize) -> Option<f64> {
    series
        .len()
        .checked_sub(back + 1)
        .map(|i| series[i])
        .filter(|v| !v.is_nan())
}

pub(crate) fn ensure_not_empty(strategy: &str, candles: &[Candle]) -> Result<(), StrategyError> {
    if candles.is_empty() {
        return Err(StrategyError::new(strategy, "evaluated on an empty candle prefix"));
    }
    Ok(())
}

pub(crate) fn require_window(
    strategy: &'static str,
    param: &'static str,
    value: usize,
) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidStrategyParam {
            strategy,
            param,
            reason: "window must be at least 1".into(),
        });
    }
    Ok(())
}

pub(crate) fn require_positive(
    strategy: &'static str,
    param: &'static str,
    value: f64,
) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::InvalidStrategyParam {
            strategy,
            param,
            reason: format!("must be positive and finite, got {value}"),
        });
    }
    Ok(())
}
