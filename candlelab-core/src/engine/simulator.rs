//! Candle-by-candle position simulator.
//!
//! Per candle `i`, strictly in order:
//! 1. Protective exits: stop-loss, then take-profit, against the close
//! 2. Ask the adapter for a decision on `candles[..=i]`
//! 3. Apply it: enter only when flat, exit only when long
//! 4. Record one mark-to-market equity point
//!
//! Everything the run needs lives on the stack of [`run`]; nothing is
//! shared between runs.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::account::{Account, EntryRejection};
use super::config::{EndOfRunPolicy, ExitRules, SimulationConfig};
use crate::domain::{validate_series, Candle, Decision, EquityPoint, ExitReason, Position, TradeRecord};
use crate::error::BacktestError;
use crate::strategy::StrategyAdapter;

/// Raw output of a simulation, before metrics are derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    /// One point per processed candle.
    pub equity_curve: Vec<EquityPoint>,
    /// Closed trades in chronological order.
    pub trades_history: Vec<TradeRecord>,
    /// Position still open after the last candle (mark-to-market policy only).
    pub open_position: Option<Position>,
    /// Entries that were requested but could not be executed.
    pub skipped_entries: usize,
}

impl Simulation {
    /// Balance of the last equity point.
    pub fn final_balance(&self) -> Option<f64> {
        self.equity_curve.last().map(|p| p.balance)
    }
}

/// Replay `candles` through `adapter` under `config`.
///
/// Configuration and data are validated before the first candle. A strategy
/// error aborts the run and no partial result is returned.
pub fn run(
    candles: &[Candle],
    adapter: &dyn StrategyAdapter,
    config: &SimulationConfig,
) -> Result<Simulation, BacktestError> {
    config.validate()?;
    validate_series(candles)?;

    let costs = &config.costs;
    let last = candles.len() - 1;
    let force_close = config.end_of_run == EndOfRunPolicy::ForceClose;

    let mut account = Account::new(config.initial_balance);
    let mut equity_curve = Vec::with_capacity(candles.len());
    let mut trades_history = Vec::new();
    let mut skipped_entries = 0usize;

    for (i, candle) in candles.iter().enumerate() {
        // ─── Protective exits ───
        if let Some(reason) = protective_exit(&account, candle, &config.exit_rules) {
            if let Some(trade) = account.close(i, candle, reason, costs) {
                log_close(&trade);
                trades_history.push(trade);
            }
        }

        // ─── Strategy decision ───
        let decision = adapter
            .decide(&candles[..=i])
            .map_err(|source| BacktestError::Strategy { index: i, source })?;

        match decision {
            Decision::EnterLong if account.is_flat() => {
                if force_close && i == last {
                    debug!(index = i, "entry on final candle refused under force-close");
                } else {
                    let fill = costs.buy_price(candle.close);
                    let quantity = config
                        .sizing
                        .quantity(account.cash(), fill, costs.commission_rate);
                    match account.open(i, candle, quantity, costs) {
                        Ok(position) => debug!(
                            index = i,
                            price = position.entry_price,
                            quantity = position.quantity,
                            "position opened"
                        ),
                        Err(rejection) => {
                            skipped_entries += 1;
                            match rejection {
                                EntryRejection::ZeroQuantity => {
                                    warn!(index = i, quantity, "entry skipped: zero quantity")
                                }
                                EntryRejection::InsufficientCash { required, available } => warn!(
                                    index = i,
                                    required,
                                    available,
                                    "entry skipped: insufficient cash"
                                ),
                            }
                        }
                    }
                }
            }
            Decision::ExitLong => {
                if let Some(trade) = account.close(i, candle, ExitReason::Signal, costs) {
                    log_close(&trade);
                    trades_history.push(trade);
                }
            }
            // Entry while long, or hold.
            _ => {}
        }

        // ─── End of data ───
        if force_close && i == last {
            if let Some(trade) = account.close(i, candle, ExitReason::EndOfData, costs) {
                log_close(&trade);
                trades_history.push(trade);
            }
        }

        equity_curve.push(EquityPoint {
            timestamp: candle.timestamp,
            balance: account.equity(candle.close),
        });
    }

    Ok(Simulation {
        equity_curve,
        trades_history,
        open_position: account.into_position(),
        skipped_entries,
    })
}

/// Stop-loss is checked before take-profit.
fn protective_exit(account: &Account, candle: &Candle, rules: &ExitRules) -> Option<ExitReason> {
    let position = account.position()?;
    if rules
        .stop_price(position.entry_price)
        .is_some_and(|stop| candle.close <= stop)
    {
        return Some(ExitReason::StopLoss);
    }
    if rules
        .target_price(position.entry_price)
        .is_some_and(|target| candle.close >= target)
    {
        return Some(ExitReason::TakeProfit);
    }
    None
}

fn log_close(trade: &TradeRecord) {
    debug!(
        entry_index = trade.entry_index,
        exit_index = trade.exit_index,
        price = trade.exit_price,
        profit = trade.profit_amount,
        reason = trade.exit_reason.as_str(),
        "position closed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::make_candles;
    use crate::engine::config::{CostModel, PositionSizing};
    use crate::error::{ConfigError, DataIntegrityError, StrategyError};
    use crate::strategy::DecisionSchedule;

    fn full_cash(balance: f64) -> SimulationConfig {
        SimulationConfig::new(balance, PositionSizing::PercentOfCash(100.0))
    }

    #[test]
    fn enter_and_exit_on_schedule() {
        let candles = make_candles(&[100.0, 110.0, 105.0, 120.0]);
        let schedule = DecisionSchedule::new()
            .at(0, Decision::EnterLong)
            .at(3, Decision::ExitLong);
        let sim = run(&candles, &schedule, &full_cash(100.0)).unwrap();

        assert_eq!(sim.trades_history.len(), 1);
        assert_eq!(sim.equity_curve.len(), 4);
        assert_eq!(sim.equity_curve[1].balance, 110.0);
        assert_eq!(sim.final_balance(), Some(120.0));
        assert!(sim.open_position.is_none());
    }

    #[test]
    fn redundant_decisions_are_noops() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 103.0]);
        let schedule = DecisionSchedule::from_decisions([
            Decision::ExitLong,
            Decision::EnterLong,
            Decision::EnterLong,
            Decision::ExitLong,
        ]);
        let sim = run(&candles, &schedule, &full_cash(100.0)).unwrap();
        assert_eq!(sim.trades_history.len(), 1);
        assert_eq!(sim.trades_history[0].entry_index, 1);
    }

    #[test]
    fn open_position_is_marked_to_market() {
        let candles = make_candles(&[100.0, 110.0, 130.0]);
        let schedule = DecisionSchedule::new().at(0, Decision::EnterLong);
        let sim = run(&candles, &schedule, &full_cash(100.0)).unwrap();

        assert!(sim.trades_history.is_empty());
        assert_eq!(sim.final_balance(), Some(130.0));
        let position = sim.open_position.unwrap();
        assert_eq!(position.entry_index, 0);
    }

    #[test]
    fn force_close_closes_at_last_candle() {
        let candles = make_candles(&[100.0, 110.0, 130.0]);
        let schedule = DecisionSchedule::new().at(0, Decision::EnterLong);
        let config = full_cash(100.0).with_end_of_run(EndOfRunPolicy::ForceClose);
        let sim = run(&candles, &schedule, &config).unwrap();

        assert_eq!(sim.trades_history.len(), 1);
        assert_eq!(sim.trades_history[0].exit_reason, ExitReason::EndOfData);
        assert_eq!(sim.trades_history[0].exit_index, 2);
        assert!(sim.open_position.is_none());
    }

    #[test]
    fn force_close_refuses_entry_on_final_candle() {
        let candles = make_candles(&[100.0, 110.0]);
        let schedule = DecisionSchedule::new().at(1, Decision::EnterLong);
        let config = full_cash(100.0).with_end_of_run(EndOfRunPolicy::ForceClose);
        let sim = run(&candles, &schedule, &config).unwrap();
        assert!(sim.trades_history.is_empty());
        assert_eq!(sim.final_balance(), Some(100.0));
    }

    #[test]
    fn stop_loss_precedes_strategy() {
        let candles = make_candles(&[100.0, 95.0, 85.0, 90.0]);
        let schedule = DecisionSchedule::new().at(0, Decision::EnterLong);
        let config = full_cash(100.0).with_exit_rules(ExitRules {
            stop_loss: Some(0.10),
            take_profit: None,
        });
        let sim = run(&candles, &schedule, &config).unwrap();

        assert_eq!(sim.trades_history.len(), 1);
        let trade = &sim.trades_history[0];
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert_eq!(trade.exit_index, 2);
        assert_eq!(sim.final_balance(), Some(85.0));
    }

    #[test]
    fn take_profit_triggers() {
        let candles = make_candles(&[100.0, 110.0, 125.0, 130.0]);
        let schedule = DecisionSchedule::new().at(0, Decision::EnterLong);
        let config = full_cash(100.0).with_exit_rules(ExitRules {
            stop_loss: Some(0.10),
            take_profit: Some(0.20),
        });
        let sim = run(&candles, &schedule, &config).unwrap();
        assert_eq!(sim.trades_history[0].exit_reason, ExitReason::TakeProfit);
        assert_eq!(sim.trades_history[0].exit_index, 2);
    }

    #[test]
    fn unaffordable_fixed_entry_is_skipped() {
        let candles = make_candles(&[100.0, 101.0]);
        let schedule = DecisionSchedule::new().at(0, Decision::EnterLong);
        let config = SimulationConfig::new(50.0, PositionSizing::FixedQuantity(1.0));
        let sim = run(&candles, &schedule, &config).unwrap();
        assert_eq!(sim.skipped_entries, 1);
        assert!(sim.open_position.is_none());
        assert!(sim.equity_curve.iter().all(|p| p.balance == 50.0));
    }

    #[test]
    fn costs_are_charged_on_both_sides() {
        let candles = make_candles(&[100.0, 100.0]);
        let schedule = DecisionSchedule::from_decisions([Decision::EnterLong, Decision::ExitLong]);
        let config = full_cash(100.0).with_costs(CostModel::new(0.001, 0.0005));
        let sim = run(&candles, &schedule, &config).unwrap();

        let trade = &sim.trades_history[0];
        assert!(trade.profit_amount < 0.0);
        let final_balance = sim.final_balance().unwrap();
        assert!((final_balance - (100.0 + trade.profit_amount)).abs() < 1e-9);
    }

    #[test]
    fn invalid_config_fails_before_first_candle() {
        let candles = make_candles(&[100.0]);
        let err = run(&candles, &DecisionSchedule::new(), &full_cash(-5.0)).unwrap_err();
        assert_eq!(
            err,
            BacktestError::Configuration(ConfigError::NonPositiveBalance(-5.0))
        );
    }

    #[test]
    fn empty_series_is_rejected() {
        let err = run(&[], &DecisionSchedule::new(), &full_cash(100.0)).unwrap_err();
        assert_eq!(err, BacktestError::DataIntegrity(DataIntegrityError::Empty));
    }

    #[test]
    fn strategy_error_aborts_run() {
        struct Broken;
        impl StrategyAdapter for Broken {
            fn decide(&self, candles: &[Candle]) -> Result<Decision, StrategyError> {
                if candles.len() == 2 {
                    Err(StrategyError::new("broken", "bad input"))
                } else {
                    Ok(Decision::Hold)
                }
            }
        }

        let candles = make_candles(&[100.0, 101.0, 102.0]);
        let err = run(&candles, &Broken, &full_cash(100.0)).unwrap_err();
        assert!(matches!(err, BacktestError::Strategy { index: 1, .. }));
    }
}
