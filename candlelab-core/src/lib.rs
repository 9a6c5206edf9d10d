//! CandleLab Core: candles, indicators, strategies and the position simulator.
//!
//! This crate has no I/O. It contains:
//! - Domain types (candles, decisions, positions, trade records)
//! - Indicators used by the shipped strategies
//! - The strategy contract and adapters (one decision per candle prefix)
//! - The single-position simulator with costs and protective exits
//! - The error taxonomy shared by every layer above

pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod strategy;

pub use error::{BacktestError, ConfigError, DataIntegrityError, StrategyError};
