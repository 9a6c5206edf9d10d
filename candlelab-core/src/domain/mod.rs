//! Domain types for CandleLab

pub mod candle;
pub mod decision;
pub mod position;
pub mod trade;

pub use candle::{validate_series, Candle};
pub use decision::{Decision, Stance};
pub use position::Position;
pub use trade::{ExitReason, TradeOutcome, TradeRecord};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mark-to-market portfolio value after a candle was processed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub balance: f64,
}
