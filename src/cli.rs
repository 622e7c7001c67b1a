//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::run_report::RunReportAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, DEFAULT_WARMUP_BARS};
use crate::domain::config_validation::{
    parse_time_bound, validate_backtest_config, validate_strategy_config,
};
use crate::domain::error::DivtraderError;
use crate::domain::signal::SignalRules;
use crate::domain::strategy::Strategy;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Parser, Debug)]
#[command(name = "divtrader", about = "Intraday RSI-divergence strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Candle CSV, overrides [backtest] data
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Parent folder for run folders, overrides [report] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show bar count and time range of a candle file
    Info {
        #[arg(short, long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, data.as_deref())
            } else {
                run_backtest(&config, data.as_deref(), output.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { data } => run_info(&data),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn usize_key(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, DivtraderError> {
    let value = config.get_int(section, key, default as i64);
    usize::try_from(value).map_err(|_| DivtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("{} must be non-negative, got {}", key, value),
    })
}

pub fn build_strategy(config: &dyn ConfigPort) -> Result<Strategy, DivtraderError> {
    let defaults = Strategy::default();

    let rules = match config.get_string("strategy", "entry_predicates") {
        Some(list) => {
            SignalRules::parse_list(&list).map_err(|reason| DivtraderError::ConfigInvalid {
                section: "strategy".to_string(),
                key: "entry_predicates".to_string(),
                reason,
            })?
        }
        None => defaults.rules.clone(),
    };

    Ok(Strategy {
        rsi_period: usize_key(config, "rsi", "period", defaults.rsi_period)?,
        rsi_oversold: config.get_double("rsi", "oversold", defaults.rsi_oversold),
        rsi_overbought: config.get_double("rsi", "overbought", defaults.rsi_overbought),
        macd_fast: usize_key(config, "macd", "fast", defaults.macd_fast)?,
        macd_slow: usize_key(config, "macd", "slow", defaults.macd_slow)?,
        macd_signal: usize_key(config, "macd", "signal", defaults.macd_signal)?,
        dmi_period: usize_key(config, "dmi", "period", defaults.dmi_period)?,
        min_adx_strength: config.get_double(
            "strategy",
            "min_adx_strength",
            defaults.min_adx_strength,
        ),
        stop_loss_percent: config.get_double(
            "strategy",
            "stop_loss_percent",
            defaults.stop_loss_percent,
        ),
        rules,
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, DivtraderError> {
    let defaults = BacktestConfig::default();
    Ok(BacktestConfig {
        total_capital: config.get_double("capital", "total_capital", defaults.total_capital),
        capital_per_trade: config.get_double("capital", "per_trade", defaults.capital_per_trade),
        start_time: parse_time_bound(config, "start_time")?,
        end_time: parse_time_bound(config, "end_time")?,
        warmup_bars: usize_key(config, "backtest", "warmup_bars", DEFAULT_WARMUP_BARS)?,
    })
}

pub fn resolve_data_path(
    data_override: Option<&Path>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, DivtraderError> {
    if let Some(path) = data_override {
        return Ok(path.to_path_buf());
    }
    config
        .get_string("backtest", "data")
        .filter(|s| !s.trim().is_empty())
        .map(|s| PathBuf::from(s.trim()))
        .ok_or_else(|| DivtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "data".to_string(),
        })
}

pub fn resolve_output_dir(output_override: Option<&Path>, config: &dyn ConfigPort) -> PathBuf {
    match output_override {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(
            config
                .get_string("report", "output_dir")
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
        ),
    }
}

/// Load, validate and build everything a run needs from one config file.
fn prepare(
    adapter: &FileConfigAdapter,
) -> Result<(Strategy, BacktestConfig), DivtraderError> {
    validate_strategy_config(adapter)?;
    validate_backtest_config(adapter)?;
    Ok((build_strategy(adapter)?, build_backtest_config(adapter)?))
}

fn run_backtest(config_path: &Path, data: Option<&Path>, output: Option<&Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let (strategy, bt_config) = match prepare(&adapter) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_path = match resolve_data_path(data, &adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Loading candles from {}", data_path.display());

    let data_port = CsvAdapter::new(data_path);
    let report_port = RunReportAdapter::new(resolve_output_dir(output, &adapter));
    let run_timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();

    run_backtest_pipeline(
        &data_port,
        &report_port,
        &strategy,
        &bt_config,
        &run_timestamp,
    )
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    strategy: &Strategy,
    bt_config: &BacktestConfig,
    run_timestamp: &str,
) -> ExitCode {
    let candles = match data_port.fetch_candles(bt_config.start_time, bt_config.end_time) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Running backtest: {} candles, entry predicates [{}]",
        candles.len(),
        strategy.rules
    );

    let result = match backtest_engine::run_backtest(candles, strategy, bt_config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let s = &result.summary;
    eprintln!("\n=== Strategy Performance ===");
    eprintln!("Total Trades:     {}", s.total_trades);
    eprintln!("Wins / Losses:    {} / {}", s.wins, s.losses);
    eprintln!("Win Rate:         {:.2}%", s.win_rate_percent);
    eprintln!("Total Profit:     {:.2}", s.total_profit);
    eprintln!("Avg Profit:       {:.2}", s.avg_profit);
    eprintln!("Max Drawdown:     {:.2}%", s.max_drawdown_percent);
    eprintln!("Sharpe Ratio:     {:.2}", s.sharpe_ratio);
    if !result.state.skipped.is_empty() {
        eprintln!("Skipped Entries:  {}", result.state.skipped.len());
    }

    match report_port.write(&result, &bt_config.capital(), run_timestamp) {
        Ok(dir) => {
            eprintln!("\nReport written to: {}", dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write report: {e}");
            (&e).into()
        }
    }
}

pub fn run_dry_run(config_path: &Path, data: Option<&Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let (strategy, bt_config) = match prepare(&adapter) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Config validated successfully");

    eprintln!("\nIndicators:");
    eprintln!(
        "  RSI({}) oversold {} / overbought {}",
        strategy.rsi_period, strategy.rsi_oversold, strategy.rsi_overbought
    );
    eprintln!(
        "  MACD({}, {}, {})",
        strategy.macd_fast, strategy.macd_slow, strategy.macd_signal
    );
    eprintln!(
        "  DMI({}) min ADX {}",
        strategy.dmi_period, strategy.min_adx_strength
    );

    eprintln!("\nStrategy:");
    eprintln!("  entry predicates: {}", strategy.rules);
    eprintln!("  trailing stop:    {:.2}%", strategy.stop_loss_percent * 100.0);

    eprintln!("\nBacktest:");
    eprintln!(
        "  capital:     {:.2} total, {:.2} per trade",
        bt_config.total_capital, bt_config.capital_per_trade
    );
    eprintln!("  warmup bars: {}", bt_config.warmup_bars);
    let bound = |t: Option<chrono::NaiveDateTime>| {
        t.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())
    };
    eprintln!(
        "  window:      {} to {}",
        bound(bt_config.start_time),
        bound(bt_config.end_time)
    );

    match resolve_data_path(data, &adapter) {
        Ok(p) => eprintln!("  data:        {}", p.display()),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match prepare(&adapter) {
        Ok((strategy, _)) => {
            eprintln!("  entry predicates: {}", strategy.rules);
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_info(data_path: &Path) -> ExitCode {
    let adapter = CsvAdapter::new(data_path.to_path_buf());
    match adapter.data_range() {
        Ok(Some((first, last, count))) => {
            println!(
                "{}: {} bars, {} to {}",
                data_path.display(),
                count,
                first,
                last
            );
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", data_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
