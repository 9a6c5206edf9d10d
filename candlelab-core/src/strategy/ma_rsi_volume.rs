//! Moving average trend confirmed by RSI and volume.
//!
//! RSI here averages gains and losses with plain rolling means over
//! `rsi_period` changes, not Wilder smoothing.
//!
//! Buy: fast SMA > slow SMA, RSI above the oversold band and volume above
//! `volume_multiplier ×` its `slow_window` average.
//! Sell: fast SMA < slow SMA, or RSI above the overbought band.
//! Buy wins when both hold.

use serde::{Deserialize, Serialize};

use super::{ensure_not_empty, require_positive, require_window, tail, Strategy};
use crate::domain::{Candle, Stance};
use crate::error::{ConfigError, StrategyError};
use crate::indicators::{last_valid, rolling_mean, Indicator, Rsi, Sma};

const NAME: &str = "ma_rsi_volume";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaRsiVolumeParams {
    pub fast_window: usize,
    pub slow_window: usize,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub volume_multiplier: f64,
}

impl Default for MaRsiVolumeParams {
    fn default() -> Self {
        Self {
            fast_window: 7,
            slow_window: 40,
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            volume_multiplier: 1.5,
        }
    }
}

impl MaRsiVolumeParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_window(NAME, "fast_window", self.fast_window)?;
        require_window(NAME, "rsi_period", self.rsi_period)?;
        require_positive(NAME, "volume_multiplier", self.volume_multiplier)?;
        if self.slow_window <= self.fast_window {
            return Err(ConfigError::InvalidStrategyParam {
                strategy: NAME,
                param: "slow_window",
                reason: format!("must exceed fast_window ({})", self.fast_window),
            });
        }
        if !(0.0..=100.0).contains(&self.rsi_oversold)
            || !(0.0..=100.0).contains(&self.rsi_overbought)
            || self.rsi_oversold >= self.rsi_overbought
        {
            return Err(ConfigError::InvalidStrategyParam {
                strategy: NAME,
                param: "rsi_oversold",
                reason: format!(
                    "bands must satisfy 0 <= oversold < overbought <= 100, got {} / {}",
                    self.rsi_oversold, self.rsi_overbought
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MaRsiVolume {
    params: MaRsiVolumeParams,
    fast: Sma,
    slow: Sma,
    rsi: Rsi,
}

impl MaRsiVolume {
    pub fn new(params: MaRsiVolumeParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            fast: Sma::new(params.fast_window),
            slow: Sma::new(params.slow_window),
            rsi: Rsi::simple(params.rsi_period),
            params,
        })
    }
}

impl Strategy for MaRsiVolume {
    fn name(&self) -> &str {
        NAME
    }

    fn warmup_candles(&self) -> usize {
        self.params.slow_window.max(self.params.rsi_period)
    }

    fn evaluate(&self, candles: &[Candle]) -> Result<Option<Stance>, StrategyError> {
        ensure_not_empty(NAME, candles)?;
        let p = &self.params;
        let window = tail(candles, p.slow_window);
        let volumes: Vec<f64> = window.iter().map(|c| c.volume).collect();

        let (Some(fast), Some(slow), Some(rsi), Some(volume_avg)) = (
            last_valid(&self.fast.compute(window)),
            last_valid(&self.slow.compute(window)),
            last_valid(&self.rsi.compute(tail(candles, p.rsi_period + 1))),
            last_valid(&rolling_mean(&volumes, p.slow_window)),
        ) else {
            return Ok(None);
        };
        let volume = candles[candles.len() - 1].volume;

        let buy = fast > slow && rsi > p.rsi_oversold && volume > p.volume_multiplier * volume_avg;
        let sell = fast < slow || rsi > p.rsi_overbought;

        Ok(if buy {
            Some(Stance::Long)
        } else if sell {
            Some(Stance::Flat)
        } else {
            None
        })
    }
}
