//! Core domain types and logic.

pub mod bar;
pub mod signal;
pub mod position;
pub mod account;
pub mod execution;
pub mod indicator;
pub mod frame;
pub mod backtest;
pub mod live;
pub mod metrics;
pub mod config_validation;
pub mod error;
