#![allow(dead_code)]

use biframe::domain::bar::{Bar, Candle};
use biframe::domain::error::BiframeError;
use biframe::domain::position::ClosedTrade;
use biframe::ports::data_port::{DataPort, Timeframe};
use biframe::ports::report_port::ReportPort;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

pub struct MockDataPort {
    pub fast: Vec<Candle>,
    pub slow: Vec<Candle>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            fast: Vec::new(),
            slow: Vec::new(),
            error: None,
        }
    }

    pub fn with_fast(mut self, candles: Vec<Candle>) -> Self {
        self.fast = candles;
        self
    }

    pub fn with_slow(mut self, candles: Vec<Candle>) -> Self {
        self.slow = candles;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_candles(&self, timeframe: Timeframe) -> Result<Vec<Candle>, BiframeError> {
        if let Some(reason) = &self.error {
            return Err(BiframeError::DataLoad {
                reason: reason.clone(),
            });
        }
        Ok(match timeframe {
            Timeframe::Fast => self.fast.clone(),
            Timeframe::Slow => self.slow.clone(),
        })
    }
}

pub struct MockReportPort {
    pub calls: RefCell<Vec<(Vec<ClosedTrade>, PathBuf)>>,
}

impl MockReportPort {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for MockReportPort {
    fn write_ledger(&self, trades: &[ClosedTrade], path: &Path) -> Result<usize, BiframeError> {
        self.calls
            .borrow_mut()
            .push((trades.to_vec(), path.to_path_buf()));
        Ok(trades.len())
    }
}

pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Timestamp of the `i`-th five-minute bar.
pub fn ts(i: i64) -> NaiveDateTime {
    t0() + Duration::minutes(5 * i)
}

pub fn candle(timestamp: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        timestamp,
        open,
        high,
        low,
        close,
    }
}

/// A frame bar in a bullish (`slow > 100`) or bearish (`slow < 100`) regime.
pub fn make_bar(i: i64, open: f64, high: f64, low: f64, close: f64, slow_close: f64) -> Bar {
    Bar {
        timestamp: ts(i),
        open,
        high,
        low,
        close,
        slow_close,
        slow_ema: 100.0,
    }
}

/// Flat candle that neither signals nor moves far.
pub fn doji(i: i64, price: f64) -> Bar {
    make_bar(i, price, price + 0.5, price - 0.5, price, 105.0)
}

/// Bars 0..=3 form a bullish engulfing setup; bar 3 enters at close 52 with
/// stop 46 and target 61.
pub fn bullish_setup() -> Vec<Bar> {
    vec![
        doji(0, 50.0),
        make_bar(1, 50.0, 51.0, 47.5, 48.0, 105.0),
        make_bar(2, 47.0, 53.0, 46.0, 52.0, 105.0),
        make_bar(3, 52.0, 52.5, 51.5, 52.0, 105.0),
    ]
}

/// Fast and slow candles that align into the [`bullish_setup`] pattern
/// followed by a take-profit bar, under an EMA period of 2.
///
/// Slow candles close at 100 and 110, so the first defined EMA is 105 and the
/// trend is bullish from the second slow candle onwards.
pub fn trending_candles() -> (Vec<Candle>, Vec<Candle>) {
    let hour = 12;
    let mut fast: Vec<Candle> = (0..hour)
        .map(|i| candle(ts(i), 50.0, 50.5, 49.5, 50.0))
        .collect();
    fast.extend([
        candle(ts(hour), 50.0, 50.5, 49.5, 50.0),
        candle(ts(hour + 1), 50.0, 51.0, 47.5, 48.0),
        candle(ts(hour + 2), 47.0, 53.0, 46.0, 52.0),
        candle(ts(hour + 3), 52.0, 52.5, 51.5, 52.0),
        candle(ts(hour + 4), 52.0, 62.0, 51.0, 60.0),
    ]);
    fast.extend((hour + 5..2 * hour).map(|i| candle(ts(i), 60.0, 60.5, 59.5, 60.0)));

    let slow = vec![
        candle(ts(0), 95.0, 101.0, 94.0, 100.0),
        candle(ts(hour), 100.0, 111.0, 99.0, 110.0),
    ];
    (fast, slow)
}
