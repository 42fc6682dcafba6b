//! Performance metrics over the closed-trade ledger.
//!
//! Trade pnl is bucketed into calendar days by exit time, the daily series is
//! turned into an equity curve, and Sharpe/Sortino are annualized from the
//! daily percentage returns with a 365-day factor.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use super::backtest::BacktestResult;
use super::position::ClosedTrade;

pub const ANNUAL_FACTOR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Realized pnl per calendar day across the whole backtest span.
///
/// The span runs from the first to the last day of `index`, widened to cover
/// any exit outside it. Days without exits are 0.0.
pub fn daily_pnl(trades: &[ClosedTrade], index: &[NaiveDateTime]) -> Vec<(NaiveDate, f64)> {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for trade in trades {
        *buckets.entry(trade.exit_time.date()).or_insert(0.0) += trade.pnl;
    }

    let bounds = index
        .iter()
        .map(|t| t.date())
        .chain(buckets.keys().copied());
    let (first, last) = match bounds.fold(None, |acc: Option<(NaiveDate, NaiveDate)>, d| {
        Some(match acc {
            None => (d, d),
            Some((lo, hi)) => (lo.min(d), hi.max(d)),
        })
    }) {
        Some(span) => span,
        None => return Vec::new(),
    };

    first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|d| (d, buckets.get(&d).copied().unwrap_or(0.0)))
        .collect()
}

/// initial_capital + running cumulative sum of the daily pnl.
pub fn equity_curve(initial_capital: f64, daily: &[(NaiveDate, f64)]) -> Vec<EquityPoint> {
    let mut equity = initial_capital;
    daily
        .iter()
        .map(|&(date, pnl)| {
            equity += pnl;
            EquityPoint { date, equity }
        })
        .collect()
}

/// Period-over-period relative change; the first observation has none.
///
/// A period starting at zero or negative equity has no meaningful return
/// and counts as 0.0.
pub fn daily_returns(curve: &[EquityPoint]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| {
            if w[0].equity <= 0.0 {
                0.0
            } else {
                (w[1].equity - w[0].equity) / w[0].equity
            }
        })
        .collect()
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1). Undefined below two observations.
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Annualized mean return over annualized volatility; 0 when volatility is
/// zero or undefined.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    let (Some(m), Some(std)) = (mean(returns), sample_std(returns)) else {
        return 0.0;
    };
    let volatility = std * ANNUAL_FACTOR.sqrt();
    if volatility == 0.0 {
        return 0.0;
    }
    finite_or_zero(m * ANNUAL_FACTOR / volatility)
}

/// Like [`sharpe_ratio`] but the volatility comes only from strictly
/// negative returns.
pub fn sortino_ratio(returns: &[f64]) -> f64 {
    let Some(m) = mean(returns) else {
        return 0.0;
    };
    let negative: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let Some(downside_std) = sample_std(&negative) else {
        return 0.0;
    };
    let downside = downside_std * ANNUAL_FACTOR.sqrt();
    if downside == 0.0 {
        return 0.0;
    }
    finite_or_zero(m * ANNUAL_FACTOR / downside)
}

/// Largest peak-to-trough decline of the curve, as a fraction of the peak.
pub fn max_drawdown(curve: &[EquityPoint]) -> f64 {
    let Some(first) = curve.first() else {
        return 0.0;
    };
    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    for point in curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
        }
    }
    max_dd
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub total_trades: usize,
    pub skipped_trades: usize,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub net_profit: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
}

impl PerformanceReport {
    /// Build the report from a finished run and the bar timestamps it covered.
    pub fn compute(result: &BacktestResult, index: &[NaiveDateTime]) -> Self {
        let account = &result.account;
        let trades = &account.ledger;

        let daily = daily_pnl(trades, index);
        let curve = equity_curve(account.initial_capital, &daily);
        let returns = daily_returns(&curve);

        let (sharpe, sortino) = if trades.is_empty() {
            (0.0, 0.0)
        } else {
            (sharpe_ratio(&returns), sortino_ratio(&returns))
        };

        let trades_won = trades.iter().filter(|t| t.pnl > 0.0).count();
        let trades_lost = trades.iter().filter(|t| t.pnl < 0.0).count();
        let win_rate = if trades.is_empty() {
            0.0
        } else {
            trades_won as f64 / trades.len() as f64
        };

        PerformanceReport {
            total_trades: account.trade_count(),
            skipped_trades: account.skipped_trades,
            initial_capital: account.initial_capital,
            final_capital: account.capital,
            net_profit: account.net_profit(),
            sharpe_ratio: sharpe,
            sortino_ratio: sortino,
            max_drawdown: max_drawdown(&curve),
            trades_won,
            trades_lost,
            win_rate,
        }
    }
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(40);
        writeln!(f, "{rule}")?;
        writeln!(f, "BACKTEST PERFORMANCE METRICS")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Total Trades:      {}", self.total_trades)?;
        writeln!(
            f,
            "Skipped Trades:    {} (Insufficient Capital)",
            self.skipped_trades
        )?;
        writeln!(f, "Final Balance:     ${:.2}", self.final_capital)?;
        writeln!(f, "Net Profit:        ${:.2}", self.net_profit)?;
        writeln!(f, "Win Rate:          {:.1}%", self.win_rate * 100.0)?;
        writeln!(f, "Max Drawdown:      -{:.2}%", self.max_drawdown * 100.0)?;
        writeln!(f, "Sharpe Ratio:      {:.2}", self.sharpe_ratio)?;
        writeln!(f, "Sortino Ratio:     {:.2}", self.sortino_ratio)?;
        write!(f, "{rule}")
    }
}
