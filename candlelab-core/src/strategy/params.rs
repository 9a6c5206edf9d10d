//! Typed strategy selection.
//!
//! Each shipped strategy has its own parameter struct with defaults; this
//! enum is the serde-facing union used by run configs (`type = "..."`).

use serde::{Deserialize, Serialize};

use super::{
    AtrTrailingStop, AtrTrailingStopParams, MaRsiVolume, MaRsiVolumeParams,
    MovingAverageAnticipation, MovingAverageAnticipationParams, MovingAverageCross,
    MovingAverageCrossParams, RsiThreshold, RsiThresholdParams, Strategy, VortexCross,
    VortexParams,
};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyParams {
    MovingAverageCross(MovingAverageCrossParams),
    MovingAverageAnticipation(MovingAverageAnticipationParams),
    RsiThreshold(RsiThresholdParams),
    MaRsiVolume(MaRsiVolumeParams),
    Vortex(VortexParams),
    AtrTrailingStop(AtrTrailingStopParams),
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams::MovingAverageCross(MovingAverageCrossParams::default())
    }
}

impl StrategyParams {
    /// Every shipped strategy, with default parameters.
    pub fn all_defaults() -> Vec<StrategyParams> {
        vec![
            StrategyParams::MovingAverageCross(Default::default()),
            StrategyParams::MovingAverageAnticipation(Default::default()),
            StrategyParams::RsiThreshold(Default::default()),
            StrategyParams::MaRsiVolume(Default::default()),
            StrategyParams::Vortex(Default::default()),
            StrategyParams::AtrTrailingStop(Default::default()),
        ]
    }

    /// Default parameters for a strategy identified by name.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::all_defaults()
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| ConfigError::UnknownStrategy(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyParams::MovingAverageCross(_) => "moving_average_cross",
            StrategyParams::MovingAverageAnticipation(_) => "moving_average_anticipation",
            StrategyParams::RsiThreshold(_) => "rsi_threshold",
            StrategyParams::MaRsiVolume(_) => "ma_rsi_volume",
            StrategyParams::Vortex(_) => "vortex",
            StrategyParams::AtrTrailingStop(_) => "atr_trailing_stop",
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            StrategyParams::MovingAverageCross(p) => p.validate(),
            StrategyParams::MovingAverageAnticipation(p) => p.validate(),
            StrategyParams::RsiThreshold(p) => p.validate(),
            StrategyParams::MaRsiVolume(p) => p.validate(),
            StrategyParams::Vortex(p) => p.validate(),
            StrategyParams::AtrTrailingStop(p) => p.validate(),
        }
    }

    /// Validate and construct the strategy.
    pub fn build(&self) -> Result<Box<dyn Strategy>, ConfigError> {
        Ok(match self {
            StrategyParams::MovingAverageCross(p) => Box::new(MovingAverageCross::new(p.clone())?),
            StrategyParams::MovingAverageAnticipation(p) => {
                Box::new(MovingAverageAnticipation::new(p.clone())?)
            }
            StrategyParams::RsiThreshold(p) => Box::new(RsiThreshold::new(p.clone())?),
            StrategyParams::MaRsiVolume(p) => Box::new(MaRsiVolume::new(p.clone())?),
            StrategyParams::Vortex(p) => Box::new(VortexCross::new(p.clone())?),
            StrategyParams::AtrTrailingStop(p) => Box::new(AtrTrailingStop::new(p.clone())?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_name() {
        for params in StrategyParams::all_defaults() {
            let again = StrategyParams::from_name(params.name()).unwrap();
            assert_eq!(again, params);
        }
    }

    #[test]
    fn built_strategy_reports_same_name() {
        for params in StrategyParams::all_defaults() {
            let strategy = params.build().unwrap();
            assert_eq!(strategy.name(), params.name());
        }
    }

    #[test]
    fn unknown_name_is_config_error() {
        assert_eq!(
            StrategyParams::from_name("martingale"),
            Err(ConfigError::UnknownStrategy("martingale".into()))
        );
    }

    #[test]
    fn tagged_json_fills_defaults() {
        let json = r#"{"type":"rsi_threshold","low":25.0}"#;
        let params: StrategyParams = serde_json::from_str(json).unwrap();
        assert_eq!(
            params,
            StrategyParams::RsiThreshold(RsiThresholdParams {
                low: 25.0,
                high: 70.0,
                period: 14,
            })
        );
    }

    #[test]
    fn invalid_params_fail_to_build() {
        let params = StrategyParams::Vortex(VortexParams { period: 0 });
        assert!(params.build().is_err());
    }
}
