//! Entry signal generation: slow-timeframe trend filter plus a fast-timeframe
//! engulfing trigger.
//!
//! The window passed in is everything known at the current simulation index.
//! The last element is the bar about to be traded (only its open is used),
//! the two before it are the most recently closed bars that form the pattern.

use std::fmt;

use super::bar::Bar;

/// Minimum bars needed: two closed bars for the pattern plus the current one.
pub const MIN_SIGNAL_BARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Bullish,
    Bearish,
    Flat,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "BULLISH"),
            Trend::Bearish => write!(f, "BEARISH"),
            Trend::Flat => write!(f, "FLAT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    None,
    Entry {
        direction: Direction,
        stop_loss: f64,
        take_profit: f64,
    },
}

impl Signal {
    pub fn is_none(&self) -> bool {
        matches!(self, Signal::None)
    }
}

/// Trend of the last fully closed slow-timeframe observation (`len - 2`).
pub fn trend(window: &[Bar]) -> Trend {
    if window.len() < 2 {
        return Trend::Flat;
    }
    let closed = &window[window.len() - 2];
    if closed.slow_close > closed.slow_ema {
        Trend::Bullish
    } else if closed.slow_close < closed.slow_ema {
        Trend::Bearish
    } else {
        Trend::Flat
    }
}

/// Strict body-engulfing check between two closed bars.
pub fn is_engulfing(prev: &Bar, curr: &Bar, direction: Direction) -> bool {
    match direction {
        Direction::Buy => {
            prev.is_bearish()
                && curr.is_bullish()
                && curr.close > prev.open
                && curr.open <= prev.close
        }
        Direction::Sell => {
            prev.is_bullish()
                && curr.is_bearish()
                && curr.close < prev.open
                && curr.open >= prev.close
        }
    }
}

/// Evaluate the entry signal for the window.
///
/// Returns `Signal::None` for short windows, disagreeing trend and pattern,
/// or setups whose risk distance is not positive.
pub fn evaluate_signal(window: &[Bar], reward_risk: f64) -> Signal {
    if window.len() < MIN_SIGNAL_BARS {
        return Signal::None;
    }

    let direction = match trend(window) {
        Trend::Bullish => Direction::Buy,
        Trend::Bearish => Direction::Sell,
        Trend::Flat => return Signal::None,
    };

    let n = window.len();
    let prev = &window[n - 3];
    let curr = &window[n - 2];
    let entry = window[n - 1].open;

    if !is_engulfing(prev, curr, direction) {
        return Signal::None;
    }

    let (stop_loss, risk) = match direction {
        Direction::Buy => (curr.low, entry - curr.low),
        Direction::Sell => (curr.high, curr.high - entry),
    };
    if risk <= 0.0 {
        return Signal::None;
    }

    let take_profit = match direction {
        Direction::Buy => entry + risk * reward_risk,
        Direction::Sell => entry - risk * reward_risk,
    };

    Signal::Entry {
        direction,
        stop_loss,
        take_profit,
    }
}
