//! CSV file data adapter.
//!
//! One file per timeframe. Columns are located by header name, ignoring case,
//! so both `open` and `Open` styles load; extra columns are ignored.

use crate::domain::bar::Candle;
use crate::domain::error::BiframeError;
use crate::ports::data_port::{DataPort, Timeframe};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::PathBuf;
use tracing::info;

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

pub struct CsvAdapter {
    fast_path: PathBuf,
    slow_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(fast_path: PathBuf, slow_path: PathBuf) -> Self {
        Self {
            fast_path,
            slow_path,
        }
    }

    fn path_for(&self, timeframe: Timeframe) -> &PathBuf {
        match timeframe {
            Timeframe::Fast => &self.fast_path,
            Timeframe::Slow => &self.slow_path,
        }
    }
}

/// Parse a timestamp cell: datetime text, a bare date, or epoch milliseconds.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.naive_utc())
}

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize, BiframeError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| BiframeError::DataLoad {
            reason: format!("missing {} column", name),
        })
}

fn parse_price(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, BiframeError> {
    let raw = record.get(idx).ok_or_else(|| BiframeError::DataLoad {
        reason: format!("missing {} value", name),
    })?;
    raw.trim().parse().map_err(|e| BiframeError::DataLoad {
        reason: format!("invalid {} value {:?}: {}", name, raw, e),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_candles(&self, timeframe: Timeframe) -> Result<Vec<Candle>, BiframeError> {
        let path = self.path_for(timeframe);
        let mut rdr = csv::Reader::from_path(path).map_err(|e| BiframeError::DataLoad {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let headers = rdr.headers()?.clone();
        let ts_col = column(&headers, "timestamp")?;
        let open_col = column(&headers, "open")?;
        let high_col = column(&headers, "high")?;
        let low_col = column(&headers, "low")?;
        let close_col = column(&headers, "close")?;

        let mut candles = Vec::new();
        for result in rdr.records() {
            let record = result?;

            let raw_ts = record.get(ts_col).unwrap_or_default();
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| BiframeError::DataLoad {
                reason: format!("invalid timestamp {:?}", raw_ts),
            })?;

            candles.push(Candle {
                timestamp,
                open: parse_price(&record, open_col, "open")?,
                high: parse_price(&record, high_col, "high")?,
                low: parse_price(&record, low_col, "low")?,
                close: parse_price(&record, close_col, "close")?,
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        info!(
            "Loaded {} {} candles from {}",
            candles.len(),
            timeframe,
            path.display()
        );
        Ok(candles)
    }
}
