//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::error::BiframeError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_RISK_PER_TRADE: f64 = 0.001;
pub const DEFAULT_REWARD_RISK: f64 = 1.5;
pub const DEFAULT_EMA_PERIOD: i64 = 21;
pub const DEFAULT_SYMBOL: &str = "BTCUSDT";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), BiframeError> {
    validate_initial_capital(config)?;
    validate_data_paths(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BiframeError> {
    validate_symbol(config)?;
    validate_risk_per_trade(config)?;
    validate_reward_risk(config)?;
    validate_ema_period(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> BiframeError {
    BiframeError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), BiframeError> {
    let value = config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL);
    if value <= 0.0 || !value.is_finite() {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_data_paths(config: &dyn ConfigPort) -> Result<(), BiframeError> {
    for key in ["fast_csv", "slow_csv"] {
        match config.get_string("backtest", key) {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(BiframeError::ConfigMissing {
                    section: "backtest".to_string(),
                    key: key.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), BiframeError> {
    match config.get_string("strategy", "symbol") {
        Some(s) if s.trim().is_empty() => {
            Err(invalid("strategy", "symbol", "symbol must not be empty"))
        }
        _ => Ok(()),
    }
}

fn validate_risk_per_trade(config: &dyn ConfigPort) -> Result<(), BiframeError> {
    let value = config.get_double("strategy", "risk_per_trade", DEFAULT_RISK_PER_TRADE);
    if value <= 0.0 || value > 1.0 || value.is_nan() {
        return Err(invalid(
            "strategy",
            "risk_per_trade",
            "risk_per_trade must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_reward_risk(config: &dyn ConfigPort) -> Result<(), BiframeError> {
    let value = config.get_double("strategy", "reward_risk", DEFAULT_REWARD_RISK);
    if value <= 0.0 || !value.is_finite() {
        return Err(invalid(
            "strategy",
            "reward_risk",
            "reward_risk must be positive",
        ));
    }
    Ok(())
}

fn validate_ema_period(config: &dyn ConfigPort) -> Result<(), BiframeError> {
    let value = config.get_int("strategy", "ema_period", DEFAULT_EMA_PERIOD);
    if value < 1 {
        return Err(invalid(
            "strategy",
            "ema_period",
            "ema_period must be at least 1",
        ));
    }
    Ok(())
}
