//! Account state: running capital, the single optional position and the
//! closed-trade ledger.

use super::position::{ClosedTrade, Position, PositionState};

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub initial_capital: f64,
    pub capital: f64,
    pub skipped_trades: usize,
    pub state: PositionState,
    pub ledger: Vec<ClosedTrade>,
}

impl Account {
    pub fn new(initial_capital: f64) -> Self {
        Account {
            initial_capital,
            capital: initial_capital,
            skipped_trades: 0,
            state: PositionState::Flat,
            ledger: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.state.is_flat()
    }

    pub fn position(&self) -> Option<&Position> {
        self.state.position()
    }

    pub fn trade_count(&self) -> usize {
        self.ledger.len()
    }

    pub fn net_profit(&self) -> f64 {
        self.capital - self.initial_capital
    }

    /// Sum of every realized pnl in the ledger.
    pub fn realized_pnl(&self) -> f64 {
        self.ledger.iter().map(|t| t.pnl).sum()
    }

    pub(crate) fn record_skip(&mut self) {
        self.skipped_trades += 1;
    }

    /// Replace the state with `Flat`, handing back whatever was held.
    pub(crate) fn take_position(&mut self) -> Option<Position> {
        match std::mem::take(&mut self.state) {
            PositionState::Flat => None,
            PositionState::Open(pos) => Some(pos),
        }
    }

    pub(crate) fn record_trade(&mut self, trade: ClosedTrade) {
        self.ledger.push(trade);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::ExitReason;
    use crate::domain::signal::Direction;
    use chrono::NaiveDate;

    fn sample_position() -> Position {
        Position {
            entry_time: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            symbol: "BTCUSDT".into(),
            direction: Direction::Buy,
            entry_price: 100.0,
            stop_loss: 90.0,
            take_profit: 115.0,
            size: 1.0,
        }
    }

    #[test]
    fn new_account() {
        let account = Account::new(10_000.0);
        assert!((account.capital - 10_000.0).abs() < f64::EPSILON);
        assert!((account.initial_capital - 10_000.0).abs() < f64::EPSILON);
        assert_eq!(account.skipped_trades, 0);
        assert!(account.is_flat());
        assert!(account.ledger.is_empty());
        assert_eq!(account.net_profit(), 0.0);
    }

    #[test]
    fn take_position_leaves_flat() {
        let mut account = Account::new(10_000.0);
        account.state = PositionState::Open(sample_position());
        assert!(!account.is_flat());

        let taken = account.take_position();
        assert!(taken.is_some());
        assert!(account.is_flat());
        assert!(account.take_position().is_none());
    }

    #[test]
    fn record_skip_counts() {
        let mut account = Account::new(10_000.0);
        account.record_skip();
        account.record_skip();
        assert_eq!(account.skipped_trades, 2);
    }

    #[test]
    fn realized_pnl_sums_ledger() {
        let mut account = Account::new(10_000.0);
        let pos = sample_position();
        for pnl in [15.0, -10.0, 15.0] {
            account.record_trade(ClosedTrade {
                entry_time: pos.entry_time,
                symbol: pos.symbol.clone(),
                direction: pos.direction,
                entry_price: pos.entry_price,
                exit_price: pos.entry_price + pnl,
                exit_time: pos.entry_time,
                reason: ExitReason::TakeProfit,
                pnl,
                capital_after: 0.0,
            });
        }
        assert_eq!(account.trade_count(), 3);
        assert!((account.realized_pnl() - 20.0).abs() < f64::EPSILON);
    }
}
