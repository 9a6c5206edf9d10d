//! Moving average crossover.
//!
//! - Long while the fast SMA is above the slow SMA
//! - Flat otherwise
//! - Inconclusive until the slow SMA is defined

use serde::{Deserialize, Serialize};

use super::{ensure_not_empty, require_window, tail, Strategy};
use crate::domain::{Candle, Stance};
use crate::error::{ConfigError, StrategyError};
use crate::indicators::{last_valid, Indicator, Sma};

const NAME: &str = "moving_average_cross";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingAverageCrossParams {
    pub fast_window: usize,
    pub slow_window: usize,
}

impl Default for MovingAverageCrossParams {
    fn default() -> Self {
        Self {
            fast_window: 7,
            slow_window: 40,
        }
    }
}

impl MovingAverageCrossParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_window(NAME, "fast_window", self.fast_window)?;
        require_window(NAME, "slow_window", self.slow_window)?;
        if self.slow_window <= self.fast_window {
            return Err(ConfigError::InvalidStrategyParam {
                strategy: NAME,
                param: "slow_window",
                reason: format!(
                    "must exceed fast_window ({} <= {})",
                    self.slow_window, self.fast_window
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MovingAverageCross {
    params: MovingAverageCrossParams,
    fast: Sma,
    slow: Sma,
}

impl MovingAverageCross {
    pub fn new(params: MovingAverageCrossParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            fast: Sma::new(params.fast_window),
            slow: Sma::new(params.slow_window),
            params,
        })
    }
}

impl Strategy for MovingAverageCross {
    fn name(&self) -> &str {
        NAME
    }

    fn warmup_candles(&self) -> usize {
        self.params.slow_window
    }

    fn evaluate(&self, candles: &[Candle]) -> Result<Option<Stance>, StrategyError> {
        ensure_not_empty(NAME, candles)?;
        let window = tail(candles, self.params.slow_window);

        let fast = last_valid(&self.fast.compute(window));
        let slow = last_valid(&self.slow.compute(window));

        Ok(match (fast, slow) {
            (Some(f), Some(s)) if f > s => Some(Stance::Long),
            (Some(_), Some(_)) => Some(Stance::Flat),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::make_candles;

    fn strategy(fast: usize, slow: usize) -> MovingAverageCross {
        MovingAverageCross::new(MovingAverageCrossParams {
            fast_window: fast,
            slow_window: slow,
        })
        .unwrap()
    }

    #[test]
    fn long_in_uptrend() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 105.0]);
        assert_eq!(strategy(2, 3).evaluate(&candles), Ok(Some(Stance::Long)));
    }

    #[test]
    fn flat_in_downtrend() {
        let candles = make_candles(&[105.0, 102.0, 101.0, 100.0]);
        assert_eq!(strategy(2, 3).evaluate(&candles), Ok(Some(Stance::Flat)));
    }

    #[test]
    fn inconclusive_during_warmup() {
        let candles = make_candles(&[100.0, 101.0]);
        assert_eq!(strategy(2, 3).evaluate(&candles), Ok(None));
    }

    #[test]
    fn rejects_inverted_windows() {
        let err = MovingAverageCross::new(MovingAverageCrossParams {
            fast_window: 10,
            slow_window: 5,
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidStrategyParam { param: "slow_window", .. }
        ));
    }

    #[test]
    fn defaults_match_documented_values() {
        let params = MovingAverageCrossParams::default();
        assert_eq!((params.fast_window, params.slow_window), (7, 40));
    }
}
