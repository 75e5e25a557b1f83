//! Core domain types and logic.

pub mod analysis;
pub mod backtest;
pub mod config_validation;
pub mod diagnostics;
pub mod error;
pub mod label;
pub mod metrics;
pub mod ohlcv;
pub mod pipeline;
pub mod signal;
pub mod split;
