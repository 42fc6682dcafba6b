//! Indicator frame: aligns the slow-timeframe close and EMA onto every
//! fast-timeframe candle.
//!
//! A slow candle's values land on the fast candle sharing its timestamp and
//! are carried forward until the next slow candle. Fast candles before the
//! slow series has a defined EMA are dropped, so every returned bar is
//! complete.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::bar::{Bar, Candle};
use super::indicator::calculate_ema;

pub fn build_frame(fast: &[Candle], slow: &[Candle], ema_period: usize) -> Vec<Bar> {
    let mut fast = fast.to_vec();
    fast.sort_by_key(|c| c.timestamp);
    let mut slow = slow.to_vec();
    slow.sort_by_key(|c| c.timestamp);

    let slow_closes: Vec<f64> = slow.iter().map(|c| c.close).collect();
    let emas = calculate_ema(&slow_closes, ema_period);

    let slow_by_time: HashMap<NaiveDateTime, (f64, Option<f64>)> = slow
        .iter()
        .zip(emas)
        .map(|(c, ema)| (c.timestamp, (c.close, ema)))
        .collect();

    let mut carried: Option<(f64, Option<f64>)> = None;
    let mut bars = Vec::with_capacity(fast.len());

    for candle in &fast {
        if let Some(&(close, ema)) = slow_by_time.get(&candle.timestamp) {
            // forward fill keeps the last defined EMA if this one is undefined
            let ema = ema.or(carried.and_then(|(_, e)| e));
            carried = Some((close, ema));
        }
        let Some((slow_close, Some(slow_ema))) = carried else {
            continue;
        };
        bars.push(Bar {
            timestamp: candle.timestamp,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            slow_close,
            slow_ema,
        });
    }

    bars
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn candle(ts: NaiveDateTime, close: f64) -> Candle {
        Candle {
            timestamp: ts,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
        }
    }

    fn fast_candles(count: i64) -> Vec<Candle> {
        (0..count)
            .map(|i| candle(t0() + Duration::minutes(30 * i), 100.0 + i as f64))
            .collect()
    }

    fn slow_candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| candle(t0() + Duration::hours(i as i64), c))
            .collect()
    }

    #[test]
    fn forward_fills_slow_values() {
        // 30m fast bars, 1h slow bars, ema period 1 so every slow bar is defined
        let bars = build_frame(&fast_candles(4), &slow_candles(&[10.0, 20.0]), 1);

        assert_eq!(bars.len(), 4);
        assert_eq!(bars[0].slow_close, 10.0);
        assert_eq!(bars[1].slow_close, 10.0);
        assert_eq!(bars[2].slow_close, 20.0);
        assert_eq!(bars[3].slow_close, 20.0);
        assert_eq!(bars[3].slow_ema, 20.0);
        assert_eq!(bars[1].close, 101.0);
    }

    #[test]
    fn drops_rows_before_ema_warmup() {
        // period 2: first slow bar has no EMA, second is the SMA seed 15
        let bars = build_frame(&fast_candles(6), &slow_candles(&[10.0, 20.0, 30.0]), 2);

        assert_eq!(bars.len(), 4);
        assert_eq!(bars[0].timestamp, t0() + Duration::hours(1));
        assert!((bars[0].slow_ema - 15.0).abs() < f64::EPSILON);
        assert!(bars.iter().all(|b| b.is_complete()));
    }

    #[test]
    fn drops_fast_rows_before_first_slow_candle() {
        let mut slow = slow_candles(&[10.0, 20.0]);
        for c in &mut slow {
            c.timestamp += Duration::hours(1);
        }
        let bars = build_frame(&fast_candles(4), &slow, 1);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, t0() + Duration::hours(1));
    }

    #[test]
    fn sorts_unsorted_inputs() {
        let mut fast = fast_candles(4);
        fast.reverse();
        let bars = build_frame(&fast, &slow_candles(&[10.0, 20.0]), 1);
        assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn empty_slow_series_yields_nothing() {
        assert!(build_frame(&fast_candles(4), &[], 21).is_empty());
    }
}
