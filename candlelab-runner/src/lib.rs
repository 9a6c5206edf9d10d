//! CandleLab Runner: backtest orchestration on top of `candlelab-core`.
//!
//! This crate provides:
//! - TOML run configuration and run fingerprinting
//! - Candle loading from CSV, Parquet, or a seeded synthetic walk
//! - Performance metrics and the owned `BacktestResult`
//! - Parallel strategy comparison
//! - JSON / CSV artifact export

pub mod compare;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod result;
pub mod runner;

pub use compare::{compare_strategies, comparison_rows, ComparisonRow};
pub use config::{CandleInterval, ConfigFileError, RunConfig, RunId};
pub use data_loader::{
    generate_synthetic, load_candles, load_synthetic, CandleSource, LoadError, LoadedCandles,
};
pub use metrics::Metrics;
pub use result::{BacktestResult, SCHEMA_VERSION};
pub use runner::{build_adapter, run_backtest, run_from_path, RunError};
