//! Performance metrics: pure functions over an equity curve and trade list.
//!
//! Ratios are per candle: returns are taken between consecutive equity
//! points and nothing is annualized unless the candle interval is known.
//! Degenerate inputs (no trades, flat equity, no losing periods) yield the
//! 0.0 sentinel instead of an error or NaN.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use candlelab_core::domain::{EquityPoint, TradeOutcome, TradeRecord};

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub final_balance: f64,
    pub profit_amount: f64,
    /// profit_amount / initial_balance (0.20 = +20%).
    pub profit_percentage: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub win_rate: f64,
    /// Largest peak-to-trough decline as a positive fraction in [0, 1].
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub annualized_sharpe: Option<f64>,
    pub annualized_sortino: Option<f64>,
    /// Gross profit / gross loss; `None` when no trade lost money.
    pub profit_factor: Option<f64>,
    pub avg_win: f64,
    pub avg_loss: f64,
    /// Closed trades per exit reason.
    pub exit_reasons: BTreeMap<String, usize>,
}

impl Metrics {
    /// Compute all metrics.
    ///
    /// `periods_per_year` enables the annualized ratios.
    pub fn compute(
        equity_curve: &[EquityPoint],
        trades: &[TradeRecord],
        initial_balance: f64,
        periods_per_year: Option<f64>,
    ) -> Self {
        let balances: Vec<f64> = equity_curve.iter().map(|p| p.balance).collect();
        let final_balance = balances.last().copied().unwrap_or(initial_balance);
        let profit_amount = final_balance - initial_balance;
        let sharpe = sharpe_ratio(&balances);
        let sortino = sortino_ratio(&balances);

        Self {
            final_balance,
            profit_amount,
            profit_percentage: if initial_balance > 0.0 {
                profit_amount / initial_balance
            } else {
                0.0
            },
            total_trades: trades.len(),
            winning_trades: count_outcome(trades, TradeOutcome::Win),
            losing_trades: count_outcome(trades, TradeOutcome::Loss),
            breakeven_trades: count_outcome(trades, TradeOutcome::Breakeven),
            win_rate: win_rate(trades),
            max_drawdown: max_drawdown(&balances),
            sharpe_ratio: sharpe,
            sortino_ratio: sortino,
            annualized_sharpe: periods_per_year.map(|p| annualize(sharpe, p)),
            annualized_sortino: periods_per_year.map(|p| annualize(sortino, p)),
            profit_factor: profit_factor(trades),
            avg_win: average_profit(trades, TradeOutcome::Win),
            avg_loss: average_profit(trades, TradeOutcome::Loss),
            exit_reasons: exit_reason_counts(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Fraction of trades that were winners; 0.0 with no trades.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    count_outcome(trades, TradeOutcome::Win) as f64 / trades.len() as f64
}

/// Maximum drawdown as a positive fraction of the running peak.
///
/// Single forward pass. Returns 0.0 for fewer than two points or a curve
/// that never falls below its peak.
pub fn max_drawdown(balances: &[f64]) -> f64 {
    if balances.len() < 2 {
        return 0.0;
    }
    let mut peak = balances[0];
    let mut max_dd = 0.0_f64;

    for &balance in balances {
        if balance > peak {
            peak = balance;
        }
        if peak > 0.0 {
            let dd = (peak - balance) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd.clamp(0.0, 1.0)
}

/// mean(r) / stdev(r) over per-candle returns, population stdev.
///
/// Sentinel 0.0 when there are fewer than two equity points or the returns
/// have zero variance.
pub fn sharpe_ratio(balances: &[f64]) -> f64 {
    let returns = period_returns(balances);
    if returns.is_empty() {
        return 0.0;
    }
    let std = population_std(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&returns) / std
}

/// mean(r) / stdev(r | r < 0), population stdev of the negative subset.
///
/// Sentinel 0.0 when no return is negative or the negative returns have
/// zero variance.
pub fn sortino_ratio(balances: &[f64]) -> f64 {
    let returns = period_returns(balances);
    let downside: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    if downside.is_empty() {
        return 0.0;
    }
    let downside_std = population_std(&downside);
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean_f64(&returns) / downside_std
}

/// Scale a per-candle ratio by sqrt(periods per year).
pub fn annualize(ratio: f64, periods_per_year: f64) -> f64 {
    ratio * periods_per_year.sqrt()
}

/// Gross profit / gross loss; `None` when there are no losing trades.
pub fn profit_factor(trades: &[TradeRecord]) -> Option<f64> {
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.profit_amount > 0.0)
        .map(|t| t.profit_amount)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.profit_amount < 0.0)
        .map(|t| t.profit_amount.abs())
        .sum();

    if gross_loss > 0.0 {
        Some(gross_profit / gross_loss)
    } else {
        None
    }
}

pub fn exit_reason_counts(trades: &[TradeRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for trade in trades {
        *counts
            .entry(trade.exit_reason.as_str().to_string())
            .or_insert(0) += 1;
    }
    counts
}

// ─── Helpers ────────────────────────────────────────────────────────

/// r_k = (b_k - b_{k-1}) / b_{k-1}, 0.0 where the previous balance is not positive.
pub fn period_returns(balances: &[f64]) -> Vec<f64> {
    if balances.len() < 2 {
        return Vec::new();
    }
    balances
        .windows(2)
        .map(|w| {
            if w[0] > 0.0 {
                (w[1] - w[0]) / w[0]
            } else {
                0.0
            }
        })
        .collect()
}

fn count_outcome(trades: &[TradeRecord], outcome: TradeOutcome) -> usize {
    trades.iter().filter(|t| t.outcome == outcome).count()
}

fn average_profit(trades: &[TradeRecord], outcome: TradeOutcome) -> f64 {
    let amounts: Vec<f64> = trades
        .iter()
        .filter(|t| t.outcome == outcome)
        .map(|t| t.profit_amount)
        .collect();
    mean_f64(&amounts)
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
