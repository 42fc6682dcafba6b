//! CSV trade ledger writer.
//!
//! One row per closed trade. Prices keep full precision; pnl and capital are
//! rounded to two decimals.

use crate::domain::error::BiframeError;
use crate::domain::position::ClosedTrade;
use crate::ports::report_port::ReportPort;
use std::path::Path;
use tracing::{info, warn};

pub const LEDGER_HEADER: [&str; 7] = [
    "timestamp",
    "symbol",
    "direction",
    "entry_price",
    "exit_price",
    "pnl",
    "capital_after",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvLedgerAdapter;

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

impl ReportPort for CsvLedgerAdapter {
    fn write_ledger(&self, trades: &[ClosedTrade], path: &Path) -> Result<usize, BiframeError> {
        if trades.is_empty() {
            warn!("No trades executed, ledger not written");
            return Ok(0);
        }

        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(LEDGER_HEADER)?;
        for trade in trades {
            wtr.write_record([
                trade.entry_time.format(TIMESTAMP_FORMAT).to_string(),
                trade.symbol.clone(),
                trade.direction.to_string(),
                trade.entry_price.to_string(),
                trade.exit_price.to_string(),
                money(trade.pnl),
                money(trade.capital_after),
            ])?;
        }
        wtr.flush()?;

        info!("Wrote {} trades to {}", trades.len(), path.display());
        Ok(trades.len())
    }
}
