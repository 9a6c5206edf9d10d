//! Serializable run configuration, loaded from TOML.
//!
//! A run file names one strategy (plus an optional fallback), the simulation
//! settings and, optionally, the candle interval and an evaluation window:
//!
//! ```toml
//! symbol = "BTCUSDT"
//! interval = "1h"
//! periods = 168
//!
//! [strategy]
//! type = "rsi_threshold"
//! low = 25.0
//!
//! [simulation]
//! initial_balance = 100.0
//! sizing = { percent_of_cash = 100.0 }
//! costs = { commission_rate = 0.001, slippage_rate = 0.0005 }
//! exit_rules = { stop_loss = 0.10, take_profit = 0.20 }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use candlelab_core::engine::SimulationConfig;
use candlelab_core::strategy::StrategyParams;
use candlelab_core::ConfigError;

/// Content-addressable identifier of a run (hex BLAKE3 digest).
pub type RunId = String;

/// Errors from reading a run file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse run config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Bar width of the candle series.
///
/// Only used to annualize risk ratios; the simulator itself never looks at
/// wall-clock spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
}

impl CandleInterval {
    pub const ALL: [CandleInterval; 8] = [
        CandleInterval::OneMinute,
        CandleInterval::FiveMinutes,
        CandleInterval::FifteenMinutes,
        CandleInterval::ThirtyMinutes,
        CandleInterval::OneHour,
        CandleInterval::FourHours,
        CandleInterval::OneDay,
        CandleInterval::OneWeek,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::OneMinute => "1m",
            CandleInterval::FiveMinutes => "5m",
            CandleInterval::FifteenMinutes => "15m",
            CandleInterval::ThirtyMinutes => "30m",
            CandleInterval::OneHour => "1h",
            CandleInterval::FourHours => "4h",
            CandleInterval::OneDay => "1d",
            CandleInterval::OneWeek => "1w",
        }
    }

    pub fn minutes(&self) -> i64 {
        match self {
            CandleInterval::OneMinute => 1,
            CandleInterval::FiveMinutes => 5,
            CandleInterval::FifteenMinutes => 15,
            CandleInterval::ThirtyMinutes => 30,
            CandleInterval::OneHour => 60,
            CandleInterval::FourHours => 240,
            CandleInterval::OneDay => 1_440,
            CandleInterval::OneWeek => 10_080,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.minutes())
    }

    /// Bars per year on a 365-day, round-the-clock calendar.
    pub fn periods_per_year(&self) -> f64 {
        365.0 * 24.0 * 60.0 / self.minutes() as f64
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandleInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CandleInterval::ALL
            .into_iter()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = CandleInterval::ALL.iter().map(|i| i.as_str()).collect();
                format!("unknown interval '{s}' (expected one of {})", known.join(", "))
            })
    }
}

/// Everything needed to reproduce one backtest, apart from the candles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Instrument label carried into results and artifact names.
    #[serde(default = "default_symbol")]
    pub symbol: String,

    #[serde(default)]
    pub strategy: StrategyParams,

    /// Consulted whenever the main strategy is inconclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<StrategyParams>,

    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Enables annualized Sharpe/Sortino when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<CandleInterval>,

    /// Evaluate only the most recent N candles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periods: Option<usize>,
}

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            strategy: StrategyParams::default(),
            fallback: None,
            simulation: SimulationConfig::default(),
            interval: None,
            periods: None,
        }
    }
}

impl RunConfig {
    /// Parse and validate a TOML run description.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigFileError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML run file.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.strategy.validate()?;
        if let Some(fallback) = &self.fallback {
            fallback.validate()?;
        }
        if self.periods == Some(0) {
            return Err(ConfigError::InvalidPeriods(0));
        }
        Ok(())
    }

    /// Same run, different strategy. Used by comparisons.
    pub fn with_strategy(&self, strategy: StrategyParams) -> Self {
        Self {
            strategy,
            ..self.clone()
        }
    }

    /// Label used in results: the strategy name, or `main+fallback`.
    pub fn strategy_label(&self) -> String {
        match &self.fallback {
            Some(fallback) => format!("{}+{}", self.strategy.name(), fallback.name()),
            None => self.strategy.name().to_string(),
        }
    }

    /// Deterministic id over this config and the candle data it runs on.
    ///
    /// Identical config + dataset always yields the same id.
    pub fn run_id(&self, dataset_hash: &str) -> Result<RunId, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(&json);
        hasher.update(dataset_hash.as_bytes());
        Ok(hasher.finalize().to_hex().to_string())
    }
}
