//! Cash and position bookkeeping for a single long-only instrument.

use super::config::CostModel;
use crate::domain::{Candle, ExitReason, Position, TradeOutcome, TradeRecord};

/// Tolerance when comparing an entry's total cost with available cash.
const CASH_EPSILON: f64 = 1e-9;

/// Why an entry was not executed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryRejection {
    /// Sizing produced zero (or a non-finite) quantity.
    ZeroQuantity,
    /// Notional plus commission exceeds available cash.
    InsufficientCash { required: f64, available: f64 },
}

#[derive(Debug, Clone)]
pub struct Account {
    cash: f64,
    position: Option<Position>,
}

impl Account {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            position: None,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// Open a long position at the candle's close (plus buy slippage).
    pub fn open(
        &mut self,
        index: usize,
        candle: &Candle,
        quantity: f64,
        costs: &CostModel,
    ) -> Result<&Position, EntryRejection> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(EntryRejection::ZeroQuantity);
        }

        let price = costs.buy_price(candle.close);
        let notional = price * quantity;
        let commission = costs.commission(notional);
        let required = notional + commission;
        if required > self.cash * (1.0 + CASH_EPSILON) {
            return Err(EntryRejection::InsufficientCash {
                required,
                available: self.cash,
            });
        }

        self.cash = (self.cash - required).max(0.0);
        let position = self.position.insert(Position {
            entry_index: index,
            entry_timestamp: candle.timestamp,
            entry_price: price,
            quantity,
            entry_commission: commission,
        });
        Ok(&*position)
    }

    /// Close the open position at the candle's close (minus sell slippage).
    /// Returns `None` when already flat.
    pub fn close(
        &mut self,
        index: usize,
        candle: &Candle,
        reason: ExitReason,
        costs: &CostModel,
    ) -> Option<TradeRecord> {
        let position = self.position.take()?;

        let price = costs.sell_price(candle.close);
        let notional = price * position.quantity;
        let exit_commission = costs.commission(notional);
        self.cash += notional - exit_commission;

        let commission = position.entry_commission + exit_commission;
        let profit_amount = (price - position.entry_price) * position.quantity - commission;
        let profit_percentage = profit_amount / position.cost_basis();

        Some(TradeRecord {
            entry_index: position.entry_index,
            entry_timestamp: position.entry_timestamp,
            entry_price: position.entry_price,
            exit_index: index,
            exit_timestamp: candle.timestamp,
            exit_price: price,
            exit_reason: reason,
            quantity: position.quantity,
            commission,
            profit_amount,
            profit_percentage,
            outcome: TradeOutcome::from_profit(profit_amount),
        })
    }

    /// Cash plus the open position valued at `close`.
    pub fn equity(&self, close: f64) -> f64 {
        self.cash + self.position.as_ref().map_or(0.0, |p| p.market_value(close))
    }

    pub fn into_position(self) -> Option<Position> {
        self.position
    }
}
