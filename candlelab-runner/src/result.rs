//! Backtest result: simulation output + metrics + provenance.

use serde::{Deserialize, Serialize};

use candlelab_core::domain::{EquityPoint, Position, TradeRecord};
use candlelab_core::engine::Simulation;

use crate::config::{RunConfig, RunId};
use crate::metrics::Metrics;

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete, owned result of one backtest run.
///
/// Holds no wall-clock fields, and every map inside is ordered, so the
/// same inputs always serialize to the same bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    /// Strategy name, or `main+fallback`.
    pub strategy: String,
    pub symbol: String,
    pub dataset_hash: String,
    /// Candles actually replayed (after the periods window).
    pub candle_count: usize,
    pub initial_balance: f64,

    #[serde(flatten)]
    pub metrics: Metrics,

    pub equity_curve: Vec<EquityPoint>,
    pub trades_history: Vec<TradeRecord>,
    /// Position left open by a mark-to-market run.
    pub open_position: Option<Position>,
    pub skipped_entries: usize,

    pub config: RunConfig,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Provenance of a run, everything except the simulation itself.
#[derive(Debug, Clone)]
pub struct RunContext<'a> {
    pub config: &'a RunConfig,
    pub run_id: RunId,
    pub dataset_hash: String,
    pub candle_count: usize,
}

impl BacktestResult {
    /// Take ownership of the simulation output and derive metrics from it.
    pub fn assemble(simulation: Simulation, context: RunContext<'_>) -> Self {
        let config = context.config;
        let initial_balance = config.simulation.initial_balance;
        let metrics = Metrics::compute(
            &simulation.equity_curve,
            &simulation.trades_history,
            initial_balance,
            config.interval.map(|i| i.periods_per_year()),
        );

        Self {
            schema_version: SCHEMA_VERSION,
            run_id: context.run_id,
            strategy: config.strategy_label(),
            symbol: config.symbol.clone(),
            dataset_hash: context.dataset_hash,
            candle_count: context.candle_count,
            initial_balance,
            metrics,
            equity_curve: simulation.equity_curve,
            trades_history: simulation.trades_history,
            open_position: simulation.open_position,
            skipped_entries: simulation.skipped_entries,
            config: config.clone(),
        }
    }

    pub fn final_balance(&self) -> f64 {
        self.metrics.final_balance
    }
}
