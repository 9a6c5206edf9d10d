//! RSI valleys and peaks.
//!
//! Looks back for the most recent RSI extreme:
//! - last extreme was a valley (RSI < low) → Long, hold until a peak
//! - last extreme was a peak (RSI > high) → Flat, stay out until a valley
//! - no extreme yet → inconclusive

use serde::{Deserialize, Serialize};

use super::{ensure_not_empty, require_window, Strategy};
use crate::domain::{Candle, Stance};
use crate::error::{ConfigError, StrategyError};
use crate::indicators::{Indicator, Rsi};

const NAME: &str = "rsi_threshold";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiThresholdParams {
    pub low: f64,
    pub high: f64,
    pub period: usize,
}

impl Default for RsiThresholdParams {
    fn default() -> Self {
        Self {
            low: 30.0,
            high: 70.0,
            period: 14,
        }
    }
}

impl RsiThresholdParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_window(NAME, "period", self.period)?;
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.low) || !in_range(self.high) || self.low >= self.high {
            return Err(ConfigError::InvalidStrategyParam {
                strategy: NAME,
                param: "low",
                reason: format!(
                    "thresholds must satisfy 0 <= low < high <= 100, got low={} high={}",
                    self.low, self.high
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RsiThreshold {
    params: RsiThresholdParams,
    rsi: Rsi,
}

impl RsiThreshold {
    pub fn new(params: RsiThresholdParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            rsi: Rsi::wilder(params.period),
            params,
        })
    }
}

impl Strategy for RsiThreshold {
    fn name(&self) -> &str {
        NAME
    }

    fn warmup_candles(&self) -> usize {
        2
    }

    fn evaluate(&self, candles: &[Candle]) -> Result<Option<Stance>, StrategyError> {
        ensure_not_empty(NAME, candles)?;
        // The recursive average starts at the first candle, so the whole
        // prefix is needed.
        let rsi = self.rsi.compute(candles);

        let last_extreme = rsi.iter().rev().find_map(|&v| {
            if v < self.params.low {
                Some(Stance::Long)
            } else if v > self.params.high {
                Some(Stance::Flat)
            } else {
                None
            }
        });
        Ok(last_extreme)
    }
}
