//! Error taxonomy for a backtest run.
//!
//! Every variant is fatal for the run that raised it. Metric edge cases
//! (zero trades, zero variance) are not errors and never appear here.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Invalid run configuration or strategy parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("initial balance must be positive and finite, got {0}")]
    NonPositiveBalance(f64),

    #[error("traded quantity must be positive and finite, got {0}")]
    InvalidQuantity(f64),

    #[error("traded percentage must be in (0, 100], got {0}")]
    InvalidPercentage(f64),

    #[error("{name} must be in [0, 1), got {value}")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("{name} must be positive and finite, got {value}")]
    InvalidExitLevel { name: &'static str, value: f64 },

    #[error("invalid parameter '{param}' for strategy '{strategy}': {reason}")]
    InvalidStrategyParam {
        strategy: &'static str,
        param: &'static str,
        reason: String,
    },

    #[error("evaluation window must cover at least one candle, got {0}")]
    InvalidPeriods(usize),

    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),
}

/// The candle series cannot be replayed as given.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataIntegrityError {
    #[error("candle series is empty")]
    Empty,

    #[error("candle {index} contains a non-finite value")]
    NonFinite { index: usize },

    #[error("candle {index} has high {high} and low {low} that do not bracket open and close")]
    InconsistentRange { index: usize, high: f64, low: f64 },

    #[error("candle {index} has non-positive price {price}")]
    NonPositivePrice { index: usize, price: f64 },

    #[error("candle {index} repeats timestamp {timestamp}")]
    DuplicateTimestamp {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("candle {index} at {timestamp} is earlier than its predecessor at {previous}")]
    OutOfOrder {
        index: usize,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },
}

/// A strategy failed to produce a decision.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("strategy '{strategy}' failed: {reason}")]
pub struct StrategyError {
    pub strategy: String,
    pub reason: String,
}

impl StrategyError {
    pub fn new(strategy: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the position simulator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("data integrity error: {0}")]
    DataIntegrity(#[from] DataIntegrityError),

    #[error("strategy error at candle {index}: {source}")]
    Strategy {
        index: usize,
        #[source]
        source: StrategyError,
    },
}
