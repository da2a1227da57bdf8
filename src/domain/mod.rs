//! Core domain types and logic.

pub mod price;
pub mod sma;
pub mod signal;
pub mod returns;
pub mod backtest;
pub mod metrics;
pub mod runner;
pub mod lesson;
pub mod config_validation;
pub mod error;
