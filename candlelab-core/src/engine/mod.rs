//! Backtest engine: configuration, account bookkeeping and the candle loop.
//!
//! The simulator consumes a validated candle series and a
//! [`StrategyAdapter`](crate::strategy::StrategyAdapter), and produces a
//! [`Simulation`]: the equity curve, closed trades and any position left open.

pub mod account;
pub mod config;
pub mod simulator;

pub use account::{Account, EntryRejection};
pub use config::{CostModel, EndOfRunPolicy, ExitRules, PositionSizing, SimulationConfig};
pub use simulator::{run, Simulation};
