//! Vortex indicator strategy: Long while VI+ > VI-, Flat while VI+ < VI-.

use serde::{Deserialize, Serialize};

use super::{ensure_not_empty, require_window, tail, Strategy};
use crate::domain::{Candle, Stance};
use crate::error::{ConfigError, StrategyError};
use crate::indicators::{last_valid, Indicator, Vortex, VortexLine};

const NAME: &str = "vortex";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VortexParams {
    pub period: usize,
}

impl Default for VortexParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl VortexParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_window(NAME, "period", self.period)
    }
}

#[derive(Debug, Clone)]
pub struct VortexCross {
    params: VortexParams,
    plus: Vortex,
    minus: Vortex,
}

impl VortexCross {
    pub fn new(params: VortexParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            plus: Vortex::new(params.period, VortexLine::Positive),
            minus: Vortex::new(params.period, VortexLine::Negative),
            params,
        })
    }
}

impl Strategy for VortexCross {
    fn name(&self) -> &str {
        NAME
    }

    fn warmup_candles(&self) -> usize {
        self.params.period + 1
    }

    fn evaluate(&self, candles: &[Candle]) -> Result<Option<Stance>, StrategyError> {
        ensure_not_empty(NAME, candles)?;
        let window = tail(candles, self.warmup_candles());

        let (Some(plus), Some(minus)) = (
            last_valid(&self.plus.compute(window)),
            last_valid(&self.minus.compute(window)),
        ) else {
            return Ok(None);
        };

        Ok(if plus > minus {
            Some(Stance::Long)
        } else if plus < minus {
            Some(Stance::Flat)
        } else {
            None
        })
    }
}
