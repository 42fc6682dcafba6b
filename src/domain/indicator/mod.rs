//! Indicator calculations used to prepare the slow-timeframe trend filter.

pub mod ema;

pub use ema::calculate_ema;
