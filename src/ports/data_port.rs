//! Data access port trait.

use std::fmt;

use crate::domain::bar::Candle;
use crate::domain::error::BiframeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    /// Entry timeframe, e.g. 5m.
    Fast,
    /// Trend filter timeframe, e.g. 1h.
    Slow,
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeframe::Fast => write!(f, "fast"),
            Timeframe::Slow => write!(f, "slow"),
        }
    }
}

pub trait DataPort {
    /// Candles for the timeframe, in timestamp order.
    fn fetch_candles(&self, timeframe: Timeframe) -> Result<Vec<Candle>, BiframeError>;
}
