//! ATR trailing stop ("UT bot alerts").
//!
//! A stop trails the close at `atr_multiplier × ATR`. It ratchets in the
//! direction of the trend and flips sides when price crosses it. The
//! position state is:
//! - Long after price crosses above the stop
//! - Flat after price crosses below the stop (or before any cross)
//!
//! The stop is path dependent, so every evaluation replays the whole prefix.

use serde::{Deserialize, Serialize};

use super::{ensure_not_empty, require_positive, require_window, Strategy};
use crate::domain::{Candle, Stance};
use crate::error::{ConfigError, StrategyError};
use crate::indicators::{Atr, Indicator};

const NAME: &str = "atr_trailing_stop";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtrTrailingStopParams {
    pub atr_period: usize,
    pub atr_multiplier: f64,
}

impl Default for AtrTrailingStopParams {
    fn default() -> Self {
        Self {
            atr_period: 10,
            atr_multiplier: 2.0,
        }
    }
}

impl AtrTrailingStopParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_window(NAME, "atr_period", self.atr_period)?;
        require_positive(NAME, "atr_multiplier", self.atr_multiplier)
    }
}

#[derive(Debug, Clone)]
pub struct AtrTrailingStop {
    params: AtrTrailingStopParams,
    atr: Atr,
}

impl AtrTrailingStop {
    pub fn new(params: AtrTrailingStopParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            atr: Atr::new(params.atr_period),
            params,
        })
    }

    /// Trailing stop series; `NaN` until the ATR is defined.
    pub fn trailing_stop(&self, candles: &[Candle]) -> Vec<f64> {
        let atr = self.atr.compute(candles);
        let m = self.params.atr_multiplier;
        let mut stop = vec![f64::NAN; candles.len()];

        for i in 0..candles.len() {
            if atr[i].is_nan() {
                continue;
            }
            let close = candles[i].close;
            let below = close - m * atr[i];
            let above = close + m * atr[i];

            let prev_stop = if i > 0 { stop[i - 1] } else { f64::NAN };
            if prev_stop.is_nan() {
                stop[i] = below;
                continue;
            }
            let prev_close = candles[i - 1].close;

            stop[i] = if close > prev_stop && prev_close > prev_stop {
                prev_stop.max(below)
            } else if close < prev_stop && prev_close < prev_stop {
                prev_stop.min(above)
            } else if close > prev_stop {
                below
            } else {
                above
            };
        }

        stop
    }
}

impl Strategy for AtrTrailingStop {
    fn name(&self) -> &str {
        NAME
    }

    fn warmup_candles(&self) -> usize {
        self.params.atr_period + 1
    }

    fn evaluate(&self, candles: &[Candle]) -> Result<Option<Stance>, StrategyError> {
        ensure_not_empty(NAME, candles)?;
        let stop = self.trailing_stop(candles);
        if stop.last().map_or(true, |s| s.is_nan()) {
            return Ok(None);
        }

        let mut long = false;
        for i in 1..candles.len() {
            if stop[i - 1].is_nan() {
                continue;
            }
            let prev_close = candles[i - 1].close;
            let close = candles[i].close;
            if prev_close < stop[i - 1] && close > stop[i] {
                long = true;
            } else if prev_close > stop[i - 1] && close < stop[i] {
                long = false;
            }
        }

        Ok(Some(if long { Stance::Long } else { Stance::Flat }))
    }
}
