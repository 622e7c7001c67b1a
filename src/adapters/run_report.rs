//! Run-folder report writer.
//!
//! Creates `<output_dir>/backtest_run_<YYYYMMDD_HHMMSS>/` holding:
//! - `calculated_indicators.csv`: every bar with its indicators and stop
//! - `executed_trades.csv`: completed trades with the entry snapshot
//! - `trade_log.txt`: one readable line per completed trade
//! - `incomplete_trades.txt`: skipped entries and a still-open trade, only
//!   written when there is something to list
//! - `performance_summary.json`: metrics, run timestamp and capital settings

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::backtest::{BacktestResult, CapitalConfig, EnrichedBar};
use crate::domain::error::DivtraderError;
use crate::domain::metrics::{round2, PerformanceSummary};
use crate::domain::position::TradeRecord;
use crate::domain::trade_state::SkippedEntry;
use crate::ports::report_port::ReportPort;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const INDICATORS_FILE: &str = "calculated_indicators.csv";
pub const TRADES_FILE: &str = "executed_trades.csv";
pub const TRADE_LOG_FILE: &str = "trade_log.txt";
pub const INCOMPLETE_FILE: &str = "incomplete_trades.txt";
pub const SUMMARY_FILE: &str = "performance_summary.json";

#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub summary_metrics: &'a PerformanceSummary,
    pub run_timestamp: &'a str,
    pub capital_used: &'a CapitalConfig,
}

#[derive(Serialize)]
struct IndicatorCsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    rsi: Option<f64>,
    ema_fast: Option<f64>,
    ema_slow: Option<f64>,
    macd: Option<f64>,
    signal: Option<f64>,
    histogram: Option<f64>,
    #[serde(rename = "+DI")]
    plus_di: Option<f64>,
    #[serde(rename = "-DI")]
    minus_di: Option<f64>,
    adx: Option<f64>,
    divergence: Option<String>,
    stop_loss: Option<f64>,
}

impl From<&EnrichedBar> for IndicatorCsvRow {
    fn from(bar: &EnrichedBar) -> Self {
        let c = &bar.candle;
        let ind = &bar.indicators;
        IndicatorCsvRow {
            timestamp: c.timestamp.format(TIME_FORMAT).to_string(),
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
            rsi: ind.rsi,
            ema_fast: ind.ema_fast,
            ema_slow: ind.ema_slow,
            macd: ind.macd,
            signal: ind.signal,
            histogram: ind.histogram,
            plus_di: ind.plus_di,
            minus_di: ind.minus_di,
            adx: ind.adx,
            divergence: ind.divergence.map(|d| d.to_string()),
            stop_loss: bar.stop_loss,
        }
    }
}

#[derive(Serialize)]
struct TradeCsvRow {
    entry_time: String,
    exit_time: String,
    direction: String,
    entry_price: f64,
    exit_price: f64,
    position_size: f64,
    rsi: Option<f64>,
    macd: Option<f64>,
    signal_line: Option<f64>,
    #[serde(rename = "+DI")]
    plus_di: Option<f64>,
    #[serde(rename = "-DI")]
    minus_di: Option<f64>,
    adx: Option<f64>,
    divergence: Option<String>,
    entry_reason: String,
    profit: f64,
    return_pct: f64,
    capital_left: f64,
    entry_sl: f64,
}

impl TradeCsvRow {
    fn from_record(trade: &TradeRecord) -> Option<Self> {
        let exit = trade.exit.as_ref()?;
        let snap = &trade.snapshot;
        Some(TradeCsvRow {
            entry_time: trade.entry_time.format(TIME_FORMAT).to_string(),
            exit_time: exit.exit_time.format(TIME_FORMAT).to_string(),
            direction: trade.direction.to_string(),
            entry_price: round2(trade.entry_price),
            exit_price: round2(exit.exit_price),
            position_size: trade.position_size,
            rsi: snap.rsi,
            macd: snap.macd,
            signal_line: snap.signal_line,
            plus_di: snap.plus_di,
            minus_di: snap.minus_di,
            adx: snap.adx,
            divergence: snap.divergence.map(|d| d.to_string()),
            entry_reason: snap.rationale.clone(),
            profit: round2(exit.profit),
            return_pct: round2(exit.return_pct),
            capital_left: round2(exit.capital_left),
            entry_sl: round2(snap.initial_stop),
        })
    }
}

fn trade_log_line(trade: &TradeRecord) -> Option<String> {
    let exit = trade.exit.as_ref()?;
    Some(format!(
        "{} -> {} | {} | Entry: {:.2} | Exit: {:.2} | PnL: {:.2} | Return: {:.2}% | Capital Left: {:.2}",
        trade.entry_time.format(TIME_FORMAT),
        exit.exit_time.format(TIME_FORMAT),
        trade.direction.to_string().to_uppercase(),
        trade.entry_price,
        exit.exit_price,
        exit.profit,
        exit.return_pct,
        exit.capital_left
    ))
}

fn skipped_line(skip: &SkippedEntry) -> String {
    format!(
        "{} | {} | Skipped: insufficient capital ({:.2} available)",
        skip.time.format(TIME_FORMAT),
        skip.direction.to_string().to_uppercase(),
        skip.available_capital
    )
}

fn open_trade_line(trade: &TradeRecord) -> String {
    format!(
        "{} | {} | Entry: {:.2} | Open at end of data",
        trade.entry_time.format(TIME_FORMAT),
        trade.direction.to_string().to_uppercase(),
        trade.entry_price
    )
}

pub struct RunReportAdapter {
    output_dir: PathBuf,
}

impl RunReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn run_folder(&self, run_timestamp: &str) -> PathBuf {
        self.output_dir
            .join(format!("backtest_run_{}", run_timestamp))
    }

    fn write_indicators(dir: &Path, bars: &[EnrichedBar]) -> Result<(), DivtraderError> {
        let mut wtr = csv::Writer::from_path(dir.join(INDICATORS_FILE))?;
        for bar in bars {
            wtr.serialize(IndicatorCsvRow::from(bar))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_trades(dir: &Path, trades: &[TradeRecord]) -> Result<(), DivtraderError> {
        let mut wtr = csv::Writer::from_path(dir.join(TRADES_FILE))?;
        let rows: Vec<TradeCsvRow> = trades.iter().filter_map(TradeCsvRow::from_record).collect();
        if rows.is_empty() {
            // serialize() only emits headers alongside the first row
            wtr.write_record([
                "entry_time",
                "exit_time",
                "direction",
                "entry_price",
                "exit_price",
                "position_size",
                "rsi",
                "macd",
                "signal_line",
                "+DI",
                "-DI",
                "adx",
                "divergence",
                "entry_reason",
                "profit",
                "return_pct",
                "capital_left",
                "entry_sl",
            ])?;
        }
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_trade_log(dir: &Path, trades: &[TradeRecord]) -> Result<(), DivtraderError> {
        let mut out = BufWriter::new(File::create(dir.join(TRADE_LOG_FILE))?);
        writeln!(out, "--- TRADE LOG ---")?;
        for line in trades.iter().filter_map(trade_log_line) {
            writeln!(out, "{}", line)?;
        }
        out.flush()?;
        Ok(())
    }

    fn write_incomplete(
        dir: &Path,
        skipped: &[SkippedEntry],
        open: Option<&TradeRecord>,
    ) -> Result<(), DivtraderError> {
        if skipped.is_empty() && open.is_none() {
            return Ok(());
        }

        let mut events: Vec<(NaiveDateTime, String)> = skipped
            .iter()
            .map(|skip| (skip.time, skipped_line(skip)))
            .chain(open.map(|trade| (trade.entry_time, open_trade_line(trade))))
            .collect();
        events.sort_by_key(|(time, _)| *time);

        let mut out = BufWriter::new(File::create(dir.join(INCOMPLETE_FILE))?);
        writeln!(out, "--- INCOMPLETE TRADES ---")?;
        for (_, line) in events {
            writeln!(out, "{}", line)?;
        }
        out.flush()?;
        Ok(())
    }

    fn write_summary(
        dir: &Path,
        summary: &PerformanceSummary,
        capital: &CapitalConfig,
        run_timestamp: &str,
    ) -> Result<(), DivtraderError> {
        let run = RunSummary {
            summary_metrics: summary,
            run_timestamp,
            capital_used: capital,
        };
        let json = serde_json::to_string_pretty(&run)?;
        fs::write(dir.join(SUMMARY_FILE), json)?;
        Ok(())
    }
}

impl ReportPort for RunReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        capital: &CapitalConfig,
        run_timestamp: &str,
    ) -> Result<PathBuf, DivtraderError> {
        let dir = self.run_folder(run_timestamp);
        fs::create_dir_all(&dir)?;

        Self::write_indicators(&dir, &result.bars)?;
        Self::write_trades(&dir, &result.state.trades)?;
        Self::write_trade_log(&dir, &result.state.trades)?;
        Self::write_incomplete(&dir, &result.state.skipped, result.state.open_trade())?;
        Self::write_summary(&dir, &result.summary, capital, run_timestamp)?;

        tracing::info!("report written to {}", dir.display());
        Ok(dir)
    }
}
