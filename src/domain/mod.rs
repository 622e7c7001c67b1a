//! Core domain types and logic.

pub mod candle;
pub mod indicator;
pub mod indicator_table;
pub mod signal;
pub mod position;
pub mod trade_state;
pub mod backtest;
pub mod strategy;
pub mod metrics;
pub mod config_validation;
pub mod error;
