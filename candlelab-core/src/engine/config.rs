//! Simulation settings: balance, sizing, costs, exit rules, end-of-run policy.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How many units an entry buys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSizing {
    /// A fixed number of units per entry.
    FixedQuantity(f64),
    /// A percentage (0, 100] of available cash, converted at the fill price
    /// with entry commission included.
    PercentOfCash(f64),
}

impl Default for PositionSizing {
    fn default() -> Self {
        PositionSizing::PercentOfCash(100.0)
    }
}

impl PositionSizing {
    /// Units to buy at `fill_price` with `cash` available.
    pub fn quantity(&self, cash: f64, fill_price: f64, commission_rate: f64) -> f64 {
        match *self {
            PositionSizing::FixedQuantity(units) => units,
            PositionSizing::PercentOfCash(pct) => {
                let budget = cash * pct / 100.0;
                budget / (fill_price * (1.0 + commission_rate))
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            PositionSizing::FixedQuantity(q) if !q.is_finite() || q <= 0.0 => {
                Err(ConfigError::InvalidQuantity(q))
            }
            PositionSizing::PercentOfCash(p) if !p.is_finite() || p <= 0.0 || p > 100.0 => {
                Err(ConfigError::InvalidPercentage(p))
            }
            _ => Ok(()),
        }
    }
}

/// Proportional trading costs, applied per side.
///
/// Buys fill at `close × (1 + slippage_rate)`, sells at
/// `close × (1 - slippage_rate)`. Commission is `commission_rate ×` the
/// filled notional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    pub commission_rate: f64,
    pub slippage_rate: f64,
}

impl CostModel {
    pub fn new(commission_rate: f64, slippage_rate: f64) -> Self {
        Self {
            commission_rate,
            slippage_rate,
        }
    }

    pub fn frictionless() -> Self {
        Self::default()
    }

    pub fn buy_price(&self, close: f64) -> f64 {
        close * (1.0 + self.slippage_rate)
    }

    pub fn sell_price(&self, close: f64) -> f64 {
        close * (1.0 - self.slippage_rate)
    }

    pub fn commission(&self, notional: f64) -> f64 {
        notional * self.commission_rate
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("commission_rate", self.commission_rate),
            ("slippage_rate", self.slippage_rate),
        ] {
            if !value.is_finite() || !(0.0..1.0).contains(&value) {
                return Err(ConfigError::InvalidRate { name, value });
            }
        }
        Ok(())
    }
}

/// Protective exits evaluated on every candle close while a position is
/// open. Levels are fractions of the entry price (0.10 = 10%) and are fixed
/// when the position opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitRules {
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl ExitRules {
    pub fn is_empty(&self) -> bool {
        self.stop_loss.is_none() && self.take_profit.is_none()
    }

    pub fn stop_price(&self, entry_price: f64) -> Option<f64> {
        self.stop_loss.map(|f| entry_price * (1.0 - f))
    }

    pub fn target_price(&self, entry_price: f64) -> Option<f64> {
        self.take_profit.map(|f| entry_price * (1.0 + f))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(value) = self.stop_loss {
            if !value.is_finite() || value <= 0.0 || value >= 1.0 {
                return Err(ConfigError::InvalidExitLevel {
                    name: "stop_loss",
                    value,
                });
            }
        }
        if let Some(value) = self.take_profit {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidExitLevel {
                    name: "take_profit",
                    value,
                });
            }
        }
        Ok(())
    }
}

/// What happens to a position still open after the last candle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndOfRunPolicy {
    /// Leave it open; the final equity point values it at the last close.
    #[default]
    MarkToMarket,
    /// Close it at the last close with reason `EndOfData`. Entries on the
    /// final candle are refused.
    ForceClose,
}

/// Everything the simulator needs besides candles and an adapter.
///
/// Missing fields deserialize to their defaults: 100.0 initial balance,
/// all-in sizing, no costs, no protective exits, mark-to-market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub initial_balance: f64,
    pub sizing: PositionSizing,
    pub costs: CostModel,
    pub exit_rules: ExitRules,
    pub end_of_run: EndOfRunPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_balance: 100.0,
            sizing: PositionSizing::default(),
            costs: CostModel::default(),
            exit_rules: ExitRules::default(),
            end_of_run: EndOfRunPolicy::default(),
        }
    }
}

impl SimulationConfig {
    pub fn new(initial_balance: f64, sizing: PositionSizing) -> Self {
        Self {
            initial_balance,
            sizing,
            ..Default::default()
        }
    }

    pub fn with_costs(mut self, costs: CostModel) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_exit_rules(mut self, exit_rules: ExitRules) -> Self {
        self.exit_rules = exit_rules;
        self
    }

    pub fn with_end_of_run(mut self, end_of_run: EndOfRunPolicy) -> Self {
        self.end_of_run = end_of_run;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_balance.is_finite() || self.initial_balance <= 0.0 {
            return Err(ConfigError::NonPositiveBalance(self.initial_balance));
        }
        self.sizing.validate()?;
        self.costs.validate()?;
        self.exit_rules.validate()
    }
}
