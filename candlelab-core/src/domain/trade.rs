//! TradeRecord: a completed round-trip long trade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sign of a closed trade's profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TradeOutcome {
    Win,
    Loss,
    Breakeven,
}

impl TradeOutcome {
    pub fn from_profit(profit_amount: f64) -> Self {
        if profit_amount > 0.0 {
            TradeOutcome::Win
        } else if profit_amount < 0.0 {
            TradeOutcome::Loss
        } else {
            TradeOutcome::Breakeven
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeOutcome::Win => "win",
            TradeOutcome::Loss => "loss",
            TradeOutcome::Breakeven => "breakeven",
        }
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExitReason {
    /// The strategy issued an exit decision.
    Signal,
    StopLoss,
    TakeProfit,
    /// Closed at the final candle by the force-close end-of-run policy.
    EndOfData,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Signal => "signal",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::EndOfData => "end_of_data",
        }
    }
}

/// Immutable record of a closed position, appended in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Entry ──
    pub entry_index: usize,
    pub entry_timestamp: DateTime<Utc>,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_index: usize,
    pub exit_timestamp: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    // ── Size ──
    pub quantity: f64,

    // ── PnL ──
    /// Entry plus exit commission.
    pub commission: f64,
    /// (exit_price - entry_price) × quantity - commission.
    pub profit_amount: f64,
    /// profit_amount / (entry_price × quantity).
    pub profit_percentage: f64,
    pub outcome: TradeOutcome,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.outcome == TradeOutcome::Win
    }

    pub fn is_loser(&self) -> bool {
        self.outcome == TradeOutcome::Loss
    }

    pub fn candles_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}
