//! Moving average anticipation.
//!
//! Tries to act before a crossover happens. When the two averages are
//! closer than `volatility_factor × σ` (σ = rolling stdev of closes over
//! `slow_window`, taken at the previous candle), the gradients over the
//! last two candles decide:
//! - fast rising and steeper than slow → Long
//! - fast falling and steeper than slow → Flat
//!
//! Anything else is inconclusive.

use serde::{Deserialize, Serialize};

use super::{ensure_not_empty, require_positive, require_window, tail, value_back, Strategy};
use crate::domain::{Candle, Stance};
use crate::error::{ConfigError, StrategyError};
use crate::indicators::{rolling_std, Indicator, Sma};

const NAME: &str = "moving_average_anticipation";

/// Candles between the two points of the gradient.
const GRADIENT_SPAN: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingAverageAnticipationParams {
    pub volatility_factor: f64,
    pub fast_window: usize,
    pub slow_window: usize,
}

impl Default for MovingAverageAnticipationParams {
    fn default() -> Self {
        Self {
            volatility_factor: 0.5,
            fast_window: 7,
            slow_window: 40,
        }
    }
}

impl MovingAverageAnticipationParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive(NAME, "volatility_factor", self.volatility_factor)?;
        require_window(NAME, "fast_window", self.fast_window)?;
        if self.slow_window < 2 || self.slow_window <= self.fast_window {
            return Err(ConfigError::InvalidStrategyParam {
                strategy: NAME,
                param: "slow_window",
                reason: format!(
                    "must be at least 2 and exceed fast_window ({})",
                    self.fast_window
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MovingAverageAnticipation {
    params: MovingAverageAnticipationParams,
    fast: Sma,
    slow: Sma,
}

impl MovingAverageAnticipation {
    pub fn new(params: MovingAverageAnticipationParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            fast: Sma::new(params.fast_window),
            slow: Sma::new(params.slow_window),
            params,
        })
    }
}

impl Strategy for MovingAverageAnticipation {
    fn name(&self) -> &str {
        NAME
    }

    fn warmup_candles(&self) -> usize {
        self.params.slow_window + GRADIENT_SPAN
    }

    fn evaluate(&self, candles: &[Candle]) -> Result<Option<Stance>, StrategyError> {
        ensure_not_empty(NAME, candles)?;
        let window = tail(candles, self.warmup_candles());

        let fast = self.fast.compute(window);
        let slow = self.slow.compute(window);
        let closes: Vec<f64> = window.iter().map(|c| c.close).collect();
        let volatility = rolling_std(&closes, self.params.slow_window);

        let (Some(fast_now), Some(fast_prev), Some(slow_now), Some(slow_prev), Some(sigma)) = (
            value_back(&fast, 0),
            value_back(&fast, GRADIENT_SPAN),
            value_back(&slow, 0),
            value_back(&slow, GRADIENT_SPAN),
            value_back(&volatility, 1),
        ) else {
            return Ok(None);
        };

        let fast_gradient = fast_now - fast_prev;
        let slow_gradient = slow_now - slow_prev;
        let gap = (fast_now - slow_now).abs();

        if gap >= sigma * self.params.volatility_factor {
            return Ok(None);
        }

        Ok(if fast_gradient > 0.0 && fast_gradient > slow_gradient {
            Some(Stance::Long)
        } else if fast_gradient < 0.0 && fast_gradient < slow_gradient {
            Some(Stance::Flat)
        } else {
            None
        })
    }
}
