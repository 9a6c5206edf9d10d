use std::collections::BTreeMap;

use super::StrategyAdapter;
use crate::domain::{Candle, Decision};
use crate::error::StrategyError;

/// Scripted decisions keyed by candle index. Unlisted indices hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionSchedule {
    decisions: BTreeMap<usize, Decision>,
}

impl DecisionSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the decision at `index`.
    pub fn at(mut self, index: usize, decision: Decision) -> Self {
        self.decisions.insert(index, decision);
        self
    }

    /// One decision per candle, in order.
    pub fn from_decisions(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            decisions: decisions.into_iter().enumerate().collect(),
        }
    }
}

impl StrategyAdapter for DecisionSchedule {
    fn decide(&self, candles: &[Candle]) -> Result<Decision, StrategyError> {
        let Some(index) = candles.len().checked_sub(1) else {
            return Err(StrategyError::new("schedule", "empty candle prefix"));
        };
        Ok(self.decisions.get(&index).copied().unwrap_or(Decision::Hold))
    }

    fn label(&self) -> String {
        "schedule".to_string()
    }
}
