//! Position tracking and stop-loss/take-profit exit checks.

use std::fmt;

use chrono::NaiveDateTime;

use super::signal::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "SL"),
            ExitReason::TakeProfit => write!(f, "TP"),
        }
    }
}

/// Check a stop/target pair against a price range.
///
/// `low` and `high` are a bar's range in a backtest, or the same observed
/// price twice when monitoring live. The stop is checked first, so a bar
/// that spans both levels exits at the stop.
pub fn check_exit(
    direction: Direction,
    stop_loss: f64,
    take_profit: f64,
    low: f64,
    high: f64,
) -> Option<ExitReason> {
    match direction {
        Direction::Buy => {
            if low <= stop_loss {
                Some(ExitReason::StopLoss)
            } else if high >= take_profit {
                Some(ExitReason::TakeProfit)
            } else {
                None
            }
        }
        Direction::Sell => {
            if high >= stop_loss {
                Some(ExitReason::StopLoss)
            } else if low <= take_profit {
                Some(ExitReason::TakeProfit)
            } else {
                None
            }
        }
    }
}

/// Degenerate-bar form of [`check_exit`] for a single live price.
pub fn check_exit_at_price(
    direction: Direction,
    stop_loss: f64,
    take_profit: f64,
    price: f64,
) -> Option<ExitReason> {
    check_exit(direction, stop_loss, take_profit, price, price)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_time: NaiveDateTime,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub size: f64,
}

impl Position {
    pub fn cost(&self) -> f64 {
        self.entry_price * self.size
    }

    pub fn check_exit(&self, low: f64, high: f64) -> Option<ExitReason> {
        check_exit(self.direction, self.stop_loss, self.take_profit, low, high)
    }

    /// The fill price for an exit: exactly the stored level, never the bar.
    pub fn exit_price(&self, reason: ExitReason) -> f64 {
        match reason {
            ExitReason::StopLoss => self.stop_loss,
            ExitReason::TakeProfit => self.take_profit,
        }
    }

    pub fn realized_pnl(&self, exit_price: f64) -> f64 {
        match self.direction {
            Direction::Buy => (exit_price - self.entry_price) * self.size,
            Direction::Sell => (self.entry_price - exit_price) * self.size,
        }
    }

    /// Mark-to-market pnl if the position were closed at `price`.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.realized_pnl(price)
    }
}

/// Either no trade is held or exactly one is.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Open(Position),
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            PositionState::Flat => None,
            PositionState::Open(pos) => Some(pos),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub entry_time: NaiveDateTime,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub exit_time: NaiveDateTime,
    pub reason: ExitReason,
    pub pnl: f64,
    pub capital_after: f64,
}
