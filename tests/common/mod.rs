#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use divtrader::domain::backtest::{BacktestConfig, BacktestResult, CapitalConfig};
use divtrader::domain::candle::{filter_window, Candle};
use divtrader::domain::error::DivtraderError;
use divtrader::domain::signal::{Predicate, SignalRules};
use divtrader::domain::strategy::Strategy;
use divtrader::ports::data_port::DataPort;
use divtrader::ports::report_port::ReportPort;
use std::io::Write;
use std::path::PathBuf;

pub struct MockDataPort {
    pub candles: Vec<Candle>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            candles: Vec::new(),
            error: None,
        }
    }

    pub fn with_candles(mut self, candles: Vec<Candle>) -> Self {
        self.candles = candles;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_candles(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Vec<Candle>, DivtraderError> {
        if let Some(reason) = &self.error {
            return Err(DivtraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(filter_window(self.candles.clone(), start, end))
    }

    fn data_range(&self) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, DivtraderError> {
        Ok(match (self.candles.first(), self.candles.last()) {
            (Some(f), Some(l)) => Some((f.timestamp, l.timestamp, self.candles.len())),
            _ => None,
        })
    }
}

/// Session open for the synthetic series: 2024-01-02 09:15.
pub fn session_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap()
}

pub fn bar_time(i: usize) -> NaiveDateTime {
    session_start() + chrono::Duration::minutes(5 * i as i64)
}

/// 5-minute candles with a one-point range around each close.
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            timestamp: bar_time(i),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Flat base, a rally, then a collapse through the trailing stop.
pub fn rally_then_collapse() -> Vec<f64> {
    let mut closes = vec![100.0; 8];
    closes.extend([102.0, 104.0, 106.0, 108.0, 110.0, 90.0, 90.0]);
    closes
}

pub fn small_strategy(predicates: &[Predicate]) -> Strategy {
    Strategy {
        rsi_period: 3,
        macd_fast: 2,
        macd_slow: 4,
        macd_signal: 2,
        dmi_period: 2,
        rules: SignalRules::new(predicates.iter().copied()),
        ..Strategy::default()
    }
}

pub fn sample_config(warmup_bars: usize) -> BacktestConfig {
    BacktestConfig {
        warmup_bars,
        ..BacktestConfig::default()
    }
}

pub fn candles_csv(candles: &[Candle]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for c in candles {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            c.timestamp.format("%Y-%m-%d %H:%M:%S"),
            c.open,
            c.high,
            c.low,
            c.close,
            c.volume
        ));
    }
    out
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub const SAMPLE_INI: &str = r#"
[rsi]
period = 3
oversold = 30
overbought = 70

[macd]
fast = 2
slow = 4
signal = 2

[dmi]
period = 2

[strategy]
min_adx_strength = 20
stop_loss_percent = 0.02
entry_predicates = macd

[capital]
total_capital = 50000
per_trade = 5000

[backtest]
warmup_bars = 8
"#;

/// ExitCode has no PartialEq, so compare the Debug renderings.
pub fn assert_exit(code: std::process::ExitCode, expected: u8) {
    let got = format!("{:?}", code);
    let want = format!("{:?}", std::process::ExitCode::from(expected));
    assert_eq!(got, want, "expected exit code {}", expected);
}

/// Report port that always fails to write.
pub struct FailingReportPort;

impl ReportPort for FailingReportPort {
    fn write(
        &self,
        _result: &BacktestResult,
        _capital: &CapitalConfig,
        _run_timestamp: &str,
    ) -> Result<PathBuf, DivtraderError> {
        Err(DivtraderError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only output",
        )))
    }
}
