//! Ledger export port trait.

use std::path::Path;

use crate::domain::error::BiframeError;
use crate::domain::position::ClosedTrade;

/// Port for persisting the closed-trade ledger.
pub trait ReportPort {
    /// Write the ledger. Returns the number of rows written.
    fn write_ledger(&self, trades: &[ClosedTrade], path: &Path) -> Result<usize, BiframeError>;
}
