//! Backtest runner: wires config, candles, adapter, simulator and metrics.
//!
//! Two entry points:
//! - `run_backtest()`: takes pre-loaded candles. No I/O.
//! - `run_from_path()`: loads a candle file first. Used by the CLI.

use std::path::Path;

use thiserror::Error;
use tracing::info;

use candlelab_core::domain::Candle;
use candlelab_core::engine::run;
use candlelab_core::strategy::{FallbackAdapter, SignalAdapter, StrategyAdapter};
use candlelab_core::{BacktestError, ConfigError};

use crate::config::RunConfig;
use crate::data_loader::{dataset_hash, load_candles, select_periods, LoadError};
use crate::result::{BacktestResult, RunContext};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] LoadError),

    #[error(transparent)]
    Backtest(#[from] BacktestError),

    #[error("failed to fingerprint run: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Build the adapter a config describes: the main strategy, wrapped with
/// its fallback when one is configured.
pub fn build_adapter(config: &RunConfig) -> Result<Box<dyn StrategyAdapter>, ConfigError> {
    let main = config.strategy.build()?;
    let adapter: Box<dyn StrategyAdapter> = match &config.fallback {
        Some(fallback) => Box::new(FallbackAdapter::new(main, fallback.build()?)),
        None => Box::new(SignalAdapter::new(main)),
    };
    Ok(adapter)
}

/// Run one backtest over pre-loaded candles.
///
/// Applies the config's `periods` window, replays the candles and assembles
/// the result. A strategy failure aborts the run with no partial result.
pub fn run_backtest(candles: &[Candle], config: &RunConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let adapter = build_adapter(config)?;
    let window = select_periods(candles, config.periods);

    let dataset_hash = dataset_hash(window);
    let run_id = config.run_id(&dataset_hash)?;

    info!(
        strategy = %config.strategy_label(),
        symbol = %config.symbol,
        candles = window.len(),
        run_id = %run_id,
        "backtest started"
    );

    let simulation = run(window, adapter.as_ref(), &config.simulation)?;
    let result = BacktestResult::assemble(
        simulation,
        RunContext {
            config,
            run_id,
            dataset_hash,
            candle_count: window.len(),
        },
    );

    info!(
        strategy = %result.strategy,
        final_balance = result.metrics.final_balance,
        trades = result.metrics.total_trades,
        win_rate = result.metrics.win_rate,
        max_drawdown = result.metrics.max_drawdown,
        "backtest finished"
    );
    Ok(result)
}

/// Load candles from `path` and run one backtest over them.
pub fn run_from_path(path: &Path, config: &RunConfig) -> Result<BacktestResult, RunError> {
    let loaded = load_candles(path)?;
    run_backtest(&loaded.candles, config)
}
