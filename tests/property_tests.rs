//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. At most one position at a time, no re-entry on an exit bar
//! 2. Exits fill exactly at the held stop or target
//! 3. Capital equals initial capital plus realized pnl
//! 4. Sizing risks exactly the budget
//! 5. Target sits reward_risk stop distances beyond the anticipated entry

mod common;

use approx::assert_relative_eq;
use biframe::domain::account::Account;
use biframe::domain::backtest::{run_backtest, step, BacktestConfig, StepAction};
use biframe::domain::bar::Bar;
use biframe::domain::execution::position_size;
use biframe::domain::position::ExitReason;
use biframe::domain::signal::{evaluate_signal, Direction, Signal};
use common::ts;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (40.0..60.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_bar_parts() -> impl Strategy<Value = (f64, f64, f64, f64, bool)> {
    (arb_price(), arb_price(), 0.0..5.0_f64, 0.0..5.0_f64, any::<bool>())
}

fn build_bars(parts: &[(f64, f64, f64, f64, bool)]) -> Vec<Bar> {
    parts
        .iter()
        .enumerate()
        .map(|(i, &(open, close, up, down, bullish))| Bar {
            timestamp: ts(i as i64),
            open,
            high: open.max(close) + up,
            low: open.min(close) - down,
            close,
            slow_close: if bullish { 105.0 } else { 95.0 },
            slow_ema: 100.0,
        })
        .collect()
}

fn arb_bars() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec(arb_bar_parts(), 3..120).prop_map(|parts| build_bars(&parts))
}

// ── 1-3. Lifecycle ───────────────────────────────────────────────────

proptest! {
    /// Entries only happen while flat, and an exit bar never re-enters.
    /// Every exit fills at the stored level for its reason.
    #[test]
    fn single_position_and_exact_exit_prices(bars in arb_bars()) {
        let config = BacktestConfig::default();
        let mut account = Account::new(config.initial_capital);

        for index in 2..bars.len() {
            let held = account.position().cloned();
            let action = step(&mut account, &bars, index, &config);
            match action {
                StepAction::Entered => {
                    prop_assert!(held.is_none());
                    prop_assert!(account.position().is_some());
                }
                StepAction::Exited(trade) => {
                    let pos = held.expect("exit without a held position");
                    let expected = match trade.reason {
                        ExitReason::StopLoss => pos.stop_loss,
                        ExitReason::TakeProfit => pos.take_profit,
                    };
                    prop_assert_eq!(trade.exit_price, expected);
                    prop_assert!(account.is_flat());
                }
                StepAction::Hold => {
                    prop_assert!(held.is_some());
                }
                StepAction::Skipped | StepAction::NoSignal => {
                    prop_assert!(held.is_none());
                    prop_assert!(account.is_flat());
                }
            }
        }
    }

    /// Closed trades never overlap in time.
    #[test]
    fn trades_do_not_overlap(bars in arb_bars()) {
        let result = run_backtest(&bars, &BacktestConfig::default()).unwrap();
        let trades = result.trades();
        for pair in trades.windows(2) {
            prop_assert!(pair[0].exit_time < pair[1].entry_time);
        }
        for trade in trades {
            prop_assert!(trade.entry_time < trade.exit_time);
        }
        if let (Some(last), Some(open)) = (trades.last(), result.open_position()) {
            prop_assert!(last.exit_time < open.entry_time);
        }
    }

    /// Capital after N trades is the initial capital plus their pnl.
    #[test]
    fn capital_tracks_realized_pnl(bars in arb_bars()) {
        let result = run_backtest(&bars, &BacktestConfig::default()).unwrap();
        let account = &result.account;
        let expected = account.initial_capital + account.realized_pnl();
        prop_assert!((account.capital - expected).abs() < 1e-6);
        if let Some(last) = account.ledger.last() {
            prop_assert_eq!(last.capital_after, account.capital);
        }
    }
}

// ── 4-5. Sizing and geometry ─────────────────────────────────────────

proptest! {
    #[test]
    fn size_times_distance_is_budget(
        entry in arb_price(),
        stop in arb_price(),
        budget in 0.01..1000.0_f64,
    ) {
        let size = position_size(entry, stop, budget);
        let distance = (entry - stop).abs();
        if distance == 0.0 {
            prop_assert_eq!(size, 0.0);
        } else {
            assert_relative_eq!(size * distance, budget, max_relative = 1e-9);
        }
    }

    #[test]
    fn target_geometry(
        parts in prop::collection::vec(arb_bar_parts(), 3),
        reward_risk in 0.5..5.0_f64,
    ) {
        let window = build_bars(&parts);
        if let Signal::Entry { direction, stop_loss, take_profit } =
            evaluate_signal(&window, reward_risk)
        {
            let entry = window[2].open;
            match direction {
                Direction::Buy => {
                    prop_assert!(take_profit > entry && entry > stop_loss);
                    let gap = (take_profit - entry) - reward_risk * (entry - stop_loss);
                    prop_assert!(gap.abs() < 1e-9);
                }
                Direction::Sell => {
                    prop_assert!(take_profit < entry && entry < stop_loss);
                    let gap = (entry - take_profit) - reward_risk * (stop_loss - entry);
                    prop_assert!(gap.abs() < 1e-9);
                }
            }
        }
    }
}
