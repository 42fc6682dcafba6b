//! Backtest engine and event loop.
//!
//! Bars are replayed strictly in order. While a position is open only the
//! exit check runs; signals are evaluated only when flat, and a bar that
//! closed a position never also opens one.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::account::Account;
use super::bar::Bar;
use super::error::BiframeError;
use super::execution::{self, EntryOrder, EntryResult};
use super::position::{ClosedTrade, Position};
use super::signal::{self, Signal, MIN_SIGNAL_BARS};

/// Read-only strategy parameters, supplied once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub symbol: String,
    /// Fraction of the initial capital risked per entry.
    pub risk_per_trade: f64,
    /// Take-profit distance as a multiple of the risk distance.
    pub reward_risk: f64,
    /// Period of the slow-timeframe EMA used by the indicator frame.
    pub ema_period: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            symbol: "BTCUSDT".to_string(),
            risk_per_trade: 0.001,
            reward_risk: 1.5,
            ema_period: 21,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub strategy: StrategyConfig,
}

impl BacktestConfig {
    /// Fixed risk amount per trade, taken from the initial capital.
    pub fn risk_budget(&self) -> f64 {
        self.initial_capital * self.strategy.risk_per_trade
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            strategy: StrategyConfig::default(),
        }
    }
}

/// What happened on a single bar.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    Exited(ClosedTrade),
    Entered,
    Skipped,
    Hold,
    NoSignal,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub account: Account,
    pub bars_processed: usize,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
}

impl BacktestResult {
    pub fn trades(&self) -> &[ClosedTrade] {
        &self.account.ledger
    }

    /// A position still held when the data ran out. It is not force-closed.
    pub fn open_position(&self) -> Option<&Position> {
        self.account.position()
    }
}

/// Reject bars the engine cannot trust: any non-finite value, or timestamps
/// that do not strictly increase.
pub fn validate_bars(bars: &[Bar]) -> Result<(), BiframeError> {
    let mut previous: Option<NaiveDateTime> = None;
    for bar in bars {
        if !bar.is_complete() {
            return Err(BiframeError::MissingIndicatorData {
                timestamp: bar.timestamp,
            });
        }
        if let Some(prev) = previous {
            if bar.timestamp <= prev {
                return Err(BiframeError::UnorderedBars {
                    timestamp: bar.timestamp,
                });
            }
        }
        previous = Some(bar.timestamp);
    }
    Ok(())
}

/// Process bar `index` against the account. `bars[..=index]` is everything
/// known at that point.
pub fn step(
    account: &mut Account,
    bars: &[Bar],
    index: usize,
    config: &BacktestConfig,
) -> StepAction {
    let bar = &bars[index];

    if !account.is_flat() {
        return match execution::step_exit(account, bar) {
            Some(trade) => StepAction::Exited(trade),
            None => StepAction::Hold,
        };
    }

    let window = &bars[..=index];
    let Signal::Entry {
        direction,
        stop_loss,
        take_profit,
    } = signal::evaluate_signal(window, config.strategy.reward_risk)
    else {
        return StepAction::NoSignal;
    };

    debug!(%direction, stop_loss, take_profit, "signal at {}", bar.timestamp);

    let order = EntryOrder {
        symbol: &config.strategy.symbol,
        direction,
        entry_price: bar.close,
        stop_loss,
        take_profit,
        time: bar.timestamp,
    };

    match execution::try_open(account, &order, config.risk_budget()) {
        EntryResult::Entered { .. } => StepAction::Entered,
        EntryResult::InsufficientCapital { .. } => StepAction::Skipped,
        EntryResult::ZeroSize | EntryResult::AlreadyOpen => StepAction::NoSignal,
    }
}

/// Replay `bars` from the first index with enough history.
pub fn run_backtest(bars: &[Bar], config: &BacktestConfig) -> Result<BacktestResult, BiframeError> {
    validate_bars(bars)?;

    let mut account = Account::new(config.initial_capital);
    let start = MIN_SIGNAL_BARS - 1;

    info!(
        bars = bars.len(),
        symbol = %config.strategy.symbol,
        "Starting backtest loop"
    );

    for index in start..bars.len() {
        step(&mut account, bars, index, config);
    }

    if let Some(pos) = account.position() {
        info!(
            "Position still open at end of data: {} from {} at {:.2}",
            pos.direction, pos.entry_time, pos.entry_price
        );
    }

    Ok(BacktestResult {
        account,
        bars_processed: bars.len().saturating_sub(start),
        first_timestamp: bars.first().map(|b| b.timestamp),
        last_timestamp: bars.last().map(|b| b.timestamp),
    })
}
