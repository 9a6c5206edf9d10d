use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single open long position held by the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub entry_index: usize,
    pub entry_timestamp: DateTime<Utc>,
    pub entry_price: f64,
    pub quantity: f64,
    /// Commission paid when the position was opened.
    pub entry_commission: f64,
}

impl Position {
    /// Entry notional (price × quantity), excluding commission.
    pub fn cost_basis(&self) -> f64 {
        self.entry_price * self.quantity
    }

    pub fn market_value(&self, current_price: f64) -> f64 {
        self.quantity * current_price
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.quantity * (current_price - self.entry_price)
    }
}
