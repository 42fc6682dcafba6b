//! Trade execution: position sizing, entry with a cash-sufficiency check, and
//! exits at the stored stop-loss or take-profit level.

use chrono::NaiveDateTime;
use tracing::{info, warn};

use super::account::Account;
use super::bar::Bar;
use super::position::{ClosedTrade, ExitReason, Position, PositionState};
use super::signal::Direction;

/// Quantity such that being stopped out loses exactly `risk_budget`.
///
/// Returns 0.0 when entry and stop coincide; callers treat that as
/// "do not open".
pub fn position_size(entry_price: f64, stop_price: f64, risk_budget: f64) -> f64 {
    let distance = (entry_price - stop_price).abs();
    if distance == 0.0 {
        return 0.0;
    }
    risk_budget / distance
}

/// A validated entry request: what the signal engine decided plus where and
/// when the fill happens.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryOrder<'a> {
    pub symbol: &'a str,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub time: NaiveDateTime,
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered { size: f64, cost: f64 },
    ZeroSize,
    InsufficientCapital { cost: f64, capital: f64 },
    AlreadyOpen,
}

/// Try to open a position.
///
/// 1. Refuse if a position is already held
/// 2. Size from the risk budget and stop distance; zero size is not opened
/// 3. Spot cost = entry × size; if it exceeds capital, count a skip
/// 4. Otherwise store the position. Capital is untouched until the close.
pub fn try_open(account: &mut Account, order: &EntryOrder<'_>, risk_budget: f64) -> EntryResult {
    if !account.is_flat() {
        return EntryResult::AlreadyOpen;
    }

    let size = position_size(order.entry_price, order.stop_loss, risk_budget);
    if size <= 0.0 {
        return EntryResult::ZeroSize;
    }

    let position = Position {
        entry_time: order.time,
        symbol: order.symbol.to_string(),
        direction: order.direction,
        entry_price: order.entry_price,
        stop_loss: order.stop_loss,
        take_profit: order.take_profit,
        size,
    };
    let cost = position.cost();
    if cost > account.capital {
        account.record_skip();
        warn!(
            direction = %order.direction,
            "SKIPPED {}: insufficient capital, need {:.2}, have {:.2}",
            order.direction, cost, account.capital
        );
        return EntryResult::InsufficientCapital {
            cost,
            capital: account.capital,
        };
    }

    account.state = PositionState::Open(position);
    info!(
        "Open {} at {:.2} (risk: {:.2}, cost: {:.2})",
        order.direction, order.entry_price, risk_budget, cost
    );

    EntryResult::Entered { size, cost }
}

/// Close the held position at its stop or target.
///
/// The exit price is the stored level for `reason`. Realized pnl is applied
/// to capital and a ledger record appended. Returns `None` when flat.
pub fn close_position(
    account: &mut Account,
    exit_time: NaiveDateTime,
    reason: ExitReason,
) -> Option<ClosedTrade> {
    let position = account.take_position()?;

    let exit_price = position.exit_price(reason);
    let pnl = position.realized_pnl(exit_price);
    account.capital += pnl;

    let trade = ClosedTrade {
        entry_time: position.entry_time,
        symbol: position.symbol,
        direction: position.direction,
        entry_price: position.entry_price,
        exit_price,
        exit_time,
        reason,
        pnl,
        capital_after: account.capital,
    };
    info!(
        "Closed {} ({}) PnL: {:.2}",
        trade.direction, trade.reason, trade.pnl
    );

    account.record_trade(trade.clone());
    Some(trade)
}

/// Check the held position against a bar's range and close it if hit.
pub fn step_exit(account: &mut Account, bar: &Bar) -> Option<ClosedTrade> {
    let reason = account.position()?.check_exit(bar.low, bar.high)?;
    close_position(account, bar.timestamp, reason)
}
