//! Side-by-side comparison of several strategies on the same candles.
//!
//! Each strategy gets its own independent run (own account, own adapter).
//! Runs fan out over the rayon pool; results come back in input order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use candlelab_core::domain::Candle;
use candlelab_core::strategy::StrategyParams;

use crate::config::RunConfig;
use crate::result::BacktestResult;
use crate::runner::{run_backtest, RunError};

/// Run `base` once per strategy in `strategies`, in parallel.
///
/// Everything except the strategy comes from `base`; its fallback, if any,
/// applies to every run. The first failing run aborts the comparison.
pub fn compare_strategies(
    candles: &[Candle],
    base: &RunConfig,
    strategies: &[StrategyParams],
) -> Result<Vec<BacktestResult>, RunError> {
    strategies
        .par_iter()
        .map(|params| run_backtest(candles, &base.with_strategy(params.clone())))
        .collect()
}

/// One line of the comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub strategy: String,
    pub final_balance: f64,
    pub profit_percentage: f64,
    pub total_trades: usize,
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
}

impl From<&BacktestResult> for ComparisonRow {
    fn from(result: &BacktestResult) -> Self {
        let m = &result.metrics;
        Self {
            strategy: result.strategy.clone(),
            final_balance: m.final_balance,
            profit_percentage: m.profit_percentage,
            total_trades: m.total_trades,
            win_rate: m.win_rate,
            max_drawdown: m.max_drawdown,
            sharpe_ratio: m.sharpe_ratio,
            sortino_ratio: m.sortino_ratio,
        }
    }
}

pub fn comparison_rows(results: &[BacktestResult]) -> Vec<ComparisonRow> {
    results.iter().map(ComparisonRow::from).collect()
}

/// Index of the result with the highest final balance.
pub fn best_by_final_balance(results: &[BacktestResult]) -> Option<usize> {
    results
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.final_balance().total_cmp(&b.final_balance()))
        .map(|(i, _)| i)
}
