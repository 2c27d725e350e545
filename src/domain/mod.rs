//! Core domain types and logic.

pub mod ohlcv;
pub mod rolling_window;
pub mod price_history;
pub mod mad;
pub mod sizing;
pub mod universe;
pub mod schedule;
pub mod portfolio;
pub mod code_data;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
