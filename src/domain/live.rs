//! Live trading session state.
//!
//! An external polling loop feeds ticks and candle closes in; this type owns
//! the account and position and is the only thing that mutates them. All
//! mutation goes through `&mut self`, so a caller that drives it from more
//! than one timer must wrap it in a `Mutex` or funnel events through a single
//! channel consumer.

use chrono::NaiveDateTime;
use tracing::{info, warn};

use super::account::Account;
use super::backtest::StrategyConfig;
use super::bar::Bar;
use super::execution::{self, EntryOrder, EntryResult};
use super::position::{check_exit_at_price, ClosedTrade};
use super::signal::{self, Direction, Signal};

#[derive(Debug, Clone, PartialEq)]
pub enum LiveAction {
    Opened { direction: Direction, size: f64 },
    NoSignal,
    Skipped,
    ShortDisabled,
    InTrade,
}

#[derive(Debug, Clone)]
pub struct LiveSession {
    pub config: StrategyConfig,
    pub allow_short: bool,
    account: Account,
}

impl LiveSession {
    pub fn new(config: StrategyConfig, initial_capital: f64, allow_short: bool) -> Self {
        LiveSession {
            config,
            allow_short,
            account: Account::new(initial_capital),
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    fn risk_budget(&self) -> f64 {
        self.account.initial_capital * self.config.risk_per_trade
    }

    /// Monitor the open position against one observed price.
    pub fn on_price(&mut self, time: NaiveDateTime, price: f64) -> Option<ClosedTrade> {
        let pos = self.account.position()?;
        let reason = check_exit_at_price(pos.direction, pos.stop_loss, pos.take_profit, price)?;
        info!(
            "EXIT SIGNAL: {} at {} (close side {})",
            reason,
            price,
            pos.direction.opposite()
        );
        execution::close_position(&mut self.account, time, reason)
    }

    /// React to a candle close.
    ///
    /// `window` ends with the candle that just opened; the one before it is
    /// the candle that just closed and supplies the entry price.
    pub fn on_candle_close(&mut self, window: &[Bar], time: NaiveDateTime) -> LiveAction {
        if !self.account.is_flat() {
            return LiveAction::InTrade;
        }

        let Signal::Entry {
            direction,
            stop_loss,
            take_profit,
        } = signal::evaluate_signal(window, self.config.reward_risk)
        else {
            info!("No signal");
            return LiveAction::NoSignal;
        };

        if direction == Direction::Sell && !self.allow_short {
            warn!("Skipped SELL signal (long-only mode)");
            return LiveAction::ShortDisabled;
        }

        let entry_price = window[window.len() - 2].close;
        let order = EntryOrder {
            symbol: &self.config.symbol,
            direction,
            entry_price,
            stop_loss,
            take_profit,
            time,
        };

        let risk_budget = self.risk_budget();
        match execution::try_open(&mut self.account, &order, risk_budget) {
            EntryResult::Entered { size, .. } => LiveAction::Opened { direction, size },
            EntryResult::InsufficientCapital { .. } => LiveAction::Skipped,
            EntryResult::ZeroSize => LiveAction::NoSignal,
            EntryResult::AlreadyOpen => LiveAction::InTrade,
        }
    }
}
