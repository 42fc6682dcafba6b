//! Candle and aligned bar representation.

use chrono::NaiveDateTime;

/// A single OHLC observation for one timeframe, as loaded from a data port.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// One fast-timeframe bar carrying the forward-filled slow-timeframe close
/// and moving average.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub slow_close: f64,
    pub slow_ema: f64,
}

impl Bar {
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// True when every price and indicator field is a finite number.
    pub fn is_complete(&self) -> bool {
        [
            self.open,
            self.high,
            self.low,
            self.close,
            self.slow_close,
            self.slow_ema,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}
