//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_ledger_adapter::CsvLedgerAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, StrategyConfig};
use crate::domain::bar::Bar;
use crate::domain::config_validation::{
    validate_backtest_config, validate_initial_capital, validate_strategy_config,
    DEFAULT_EMA_PERIOD, DEFAULT_INITIAL_CAPITAL, DEFAULT_REWARD_RISK, DEFAULT_RISK_PER_TRADE,
    DEFAULT_SYMBOL,
};
use crate::domain::error::BiframeError;
use crate::domain::frame::build_frame;
use crate::domain::metrics::PerformanceReport;
use crate::domain::signal::{self, Signal, MIN_SIGNAL_BARS};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, Timeframe};
use crate::ports::report_port::ReportPort;

pub const DEFAULT_OUTPUT: &str = "backtest_trades.csv";

#[derive(Parser, Debug)]
#[command(name = "biframe", about = "Dual-timeframe engulfing strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over historical CSV data
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Fast-timeframe CSV, overrides [backtest] fast_csv
        #[arg(long)]
        fast: Option<PathBuf>,
        /// Slow-timeframe CSV, overrides [backtest] slow_csv
        #[arg(long)]
        slow: Option<PathBuf>,
        /// Trade ledger CSV, overrides [backtest] output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the trend and signal for the latest bars
    Signal {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        fast: Option<PathBuf>,
        #[arg(long)]
        slow: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            fast,
            slow,
            output,
        } => run_backtest(&config, fast, slow, output),
        Command::Validate { config } => run_validate(&config),
        Command::Signal { config, fast, slow } => run_signal(&config, fast, slow),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(report_error)
}

fn report_error(err: BiframeError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, BiframeError> {
    let ema_period = adapter.get_int("strategy", "ema_period", DEFAULT_EMA_PERIOD);
    let ema_period = usize::try_from(ema_period)
        .ok()
        .filter(|&p| p >= 1)
        .ok_or_else(|| BiframeError::ConfigInvalid {
            section: "strategy".into(),
            key: "ema_period".into(),
            reason: "ema_period must be at least 1".into(),
        })?;

    Ok(StrategyConfig {
        symbol: adapter
            .get_string("strategy", "symbol")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_SYMBOL.to_string()),
        risk_per_trade: adapter.get_double("strategy", "risk_per_trade", DEFAULT_RISK_PER_TRADE),
        reward_risk: adapter.get_double("strategy", "reward_risk", DEFAULT_REWARD_RISK),
        ema_period,
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, BiframeError> {
    Ok(BacktestConfig {
        initial_capital: adapter.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
        strategy: build_strategy_config(adapter)?,
    })
}

/// Data file paths: command-line overrides first, then `[backtest]` keys.
pub fn resolve_data_paths(
    adapter: &dyn ConfigPort,
    fast: Option<PathBuf>,
    slow: Option<PathBuf>,
) -> Result<(PathBuf, PathBuf), BiframeError> {
    let lookup = |value: Option<PathBuf>, key: &str| {
        value
            .or_else(|| {
                adapter
                    .get_string("backtest", key)
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| PathBuf::from(s.trim()))
            })
            .ok_or_else(|| BiframeError::ConfigMissing {
                section: "backtest".into(),
                key: key.into(),
            })
    };
    Ok((lookup(fast, "fast_csv")?, lookup(slow, "slow_csv")?))
}

pub fn resolve_output(adapter: &dyn ConfigPort, output: Option<PathBuf>) -> PathBuf {
    output
        .or_else(|| {
            adapter
                .get_string("backtest", "output")
                .filter(|s| !s.trim().is_empty())
                .map(|s| PathBuf::from(s.trim()))
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
}

/// Fetch both timeframes and align them into complete bars.
pub fn load_bars(data_port: &dyn DataPort, ema_period: usize) -> Result<Vec<Bar>, BiframeError> {
    let fast = data_port.fetch_candles(Timeframe::Fast)?;
    if fast.is_empty() {
        return Err(BiframeError::NoData {
            what: "fast-timeframe candles".into(),
        });
    }
    let slow = data_port.fetch_candles(Timeframe::Slow)?;
    if slow.is_empty() {
        return Err(BiframeError::NoData {
            what: "slow-timeframe candles".into(),
        });
    }

    let bars = build_frame(&fast, &slow, ema_period);
    if bars.is_empty() {
        return Err(BiframeError::NoData {
            what: format!(
                "aligned bars (need {} slow candles on fast timestamps)",
                ema_period
            ),
        });
    }
    Ok(bars)
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    config: &BacktestConfig,
    output: &Path,
) -> Result<PerformanceReport, BiframeError> {
    let bars = load_bars(data_port, config.strategy.ema_period)?;

    eprintln!("Running backtest: {} bars", bars.len());

    let result = backtest_engine::run_backtest(&bars, config)?;
    if let (Some(first), Some(last)) = (result.first_timestamp, result.last_timestamp) {
        eprintln!(
            "Processed {} bars from {} to {}",
            result.bars_processed, first, last
        );
    }
    let index: Vec<_> = bars.iter().map(|b| b.timestamp).collect();
    let report = PerformanceReport::compute(&result, &index);

    eprintln!("\n{report}");
    if let (Some(pos), Some(last_bar)) = (result.open_position(), bars.last()) {
        eprintln!(
            "Open position at end of data: {} {} @ {:.2}, unrealized {:.2} (not closed)",
            pos.direction,
            pos.symbol,
            pos.entry_price,
            pos.unrealized_pnl(last_bar.close)
        );
    }

    let written = report_port.write_ledger(result.trades(), output)?;
    if written > 0 {
        eprintln!("\nTrade ledger written to: {}", output.display());
    }

    Ok(report)
}

fn run_backtest(
    config_path: &Path,
    fast: Option<PathBuf>,
    slow: Option<PathBuf>,
    output: Option<PathBuf>,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate
    let validated =
        validate_initial_capital(&adapter).and_then(|()| validate_strategy_config(&adapter));
    if let Err(e) = validated {
        return report_error(e);
    }

    // Stage 3: Build config and resolve files
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return report_error(e),
    };
    let (fast_path, slow_path) = match resolve_data_paths(&adapter, fast, slow) {
        Ok(paths) => paths,
        Err(e) => return report_error(e),
    };
    let output = resolve_output(&adapter, output);

    eprintln!(
        "Loading {} data: fast {}, slow {}",
        bt_config.strategy.symbol,
        fast_path.display(),
        slow_path.display()
    );
    let data_port = CsvAdapter::new(fast_path, slow_path);

    // Stage 4: Run
    match run_backtest_pipeline(&data_port, &CsvLedgerAdapter, &bt_config, &output) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => report_error(e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let validated =
        validate_backtest_config(&adapter).and_then(|()| validate_strategy_config(&adapter));
    if let Err(e) = validated {
        return report_error(e);
    }

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return report_error(e),
    };

    let strategy = &bt_config.strategy;
    eprintln!("\nSymbol:           {}", strategy.symbol);
    eprintln!("Initial Capital:  {:.2}", bt_config.initial_capital);
    eprintln!(
        "Risk Per Trade:   {:.4} ({:.2} per trade)",
        strategy.risk_per_trade,
        bt_config.risk_budget()
    );
    eprintln!("Reward/Risk:      {}", strategy.reward_risk);
    eprintln!("Slow EMA Period:  {}", strategy.ema_period);
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_signal(config_path: &Path, fast: Option<PathBuf>, slow: Option<PathBuf>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_strategy_config(&adapter) {
        return report_error(e);
    }
    let strategy = match build_strategy_config(&adapter) {
        Ok(s) => s,
        Err(e) => return report_error(e),
    };
    let (fast_path, slow_path) = match resolve_data_paths(&adapter, fast, slow) {
        Ok(paths) => paths,
        Err(e) => return report_error(e),
    };

    let data_port = CsvAdapter::new(fast_path, slow_path);
    let bars = match load_bars(&data_port, strategy.ema_period) {
        Ok(b) => b,
        Err(e) => return report_error(e),
    };
    if bars.len() < MIN_SIGNAL_BARS {
        return report_error(BiframeError::NoData {
            what: format!("need at least {} aligned bars", MIN_SIGNAL_BARS),
        });
    }

    let window = &bars[bars.len() - MIN_SIGNAL_BARS..];
    let latest = &window[MIN_SIGNAL_BARS - 1];
    println!("{} {}", strategy.symbol, latest.timestamp);
    println!("trend: {}", signal::trend(window));
    match signal::evaluate_signal(window, strategy.reward_risk) {
        Signal::None => println!("signal: none"),
        Signal::Entry {
            direction,
            stop_loss,
            take_profit,
        } => println!(
            "signal: {} entry={:.2} sl={:.2} tp={:.2}",
            direction, latest.open, stop_loss, take_profit
        ),
    }
    ExitCode::SUCCESS
}
