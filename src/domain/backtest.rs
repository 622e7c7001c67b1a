//! Backtest run driver.
//!
//! Filters the candles to the configured window, validates them, computes the
//! indicator rows over the whole filtered series and then folds the trade
//! state machine over the bars from `warmup_bars` onward.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::candle::{filter_window, validate_candles, Candle};
use super::error::DivtraderError;
use super::indicator_table::{compute_indicator_rows, IndicatorRow};
use super::metrics::PerformanceSummary;
use super::signal::evaluate_signal;
use super::strategy::Strategy;
use super::trade_state::TradeState;

pub const DEFAULT_WARMUP_BARS: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub total_capital: f64,
    pub capital_per_trade: f64,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub warmup_bars: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            total_capital: 50_000.0,
            capital_per_trade: 5_000.0,
            start_time: None,
            end_time: None,
            warmup_bars: DEFAULT_WARMUP_BARS,
        }
    }
}

impl BacktestConfig {
    pub fn capital(&self) -> CapitalConfig {
        CapitalConfig {
            total_capital: self.total_capital,
            per_trade: self.capital_per_trade,
        }
    }
}

/// Capital settings echoed into the run report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapitalConfig {
    pub total_capital: f64,
    pub per_trade: f64,
}

/// A candle with its indicator row and the stop in force after the bar.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedBar {
    pub candle: Candle,
    pub indicators: IndicatorRow,
    pub stop_loss: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub bars: Vec<EnrichedBar>,
    pub state: TradeState,
    pub summary: PerformanceSummary,
}

pub fn run_backtest(
    candles: Vec<Candle>,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, DivtraderError> {
    let candles = filter_window(candles, config.start_time, config.end_time);
    validate_candles(&candles)?;

    let rows = compute_indicator_rows(&candles, strategy);
    Ok(simulate(candles, rows, strategy, config))
}

/// Fold the trade state machine over validated candles and their indicator
/// rows. A row that fails signal evaluation is logged and counts as no signal.
pub fn simulate(
    candles: Vec<Candle>,
    rows: Vec<IndicatorRow>,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> BacktestResult {
    let mut state = TradeState::new(config.total_capital, config.capital_per_trade);

    tracing::info!(
        "Starting backtest: {} bars ({} warmup, {} trading)",
        candles.len(),
        config.warmup_bars.min(candles.len()),
        candles.len().saturating_sub(config.warmup_bars)
    );

    let mut bars = Vec::with_capacity(candles.len());
    for (i, (candle, row)) in candles.into_iter().zip(rows).enumerate() {
        let mut stop_loss = None;

        if i >= config.warmup_bars {
            let signal = if state.is_flat() {
                evaluate_signal(&row, strategy).unwrap_or_else(|err| {
                    tracing::warn!("[{}] signal skipped: {}", candle.timestamp, err);
                    None
                })
            } else {
                None
            };
            state.on_bar(&candle, &row, signal, strategy);
            stop_loss = state.stop_loss();
        }

        bars.push(EnrichedBar {
            candle,
            indicators: row,
            stop_loss,
        });
    }

    let summary = PerformanceSummary::compute(&state.trades, config.total_capital);

    tracing::info!(
        "Backtest finished: {} trades, {} skipped entries, total profit {:.2}",
        summary.total_trades,
        state.skipped.len(),
        summary.total_profit
    );
    if let Some(open) = state.open_trade() {
        tracing::warn!(
            "{} position opened at {} still open at end of data",
            open.direction,
            open.entry_time
        );
    }

    BacktestResult {
        bars,
        state,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;
    use crate::domain::signal::{Direction, SignalRules};

    fn small_strategy(rules: SignalRules) -> Strategy {
        Strategy {
            rsi_period: 3,
            macd_fast: 2,
            macd_slow: 4,
            macd_signal: 2,
            dmi_period: 2,
            rules,
            ..Strategy::default()
        }
    }

    fn config(warmup_bars: usize) -> BacktestConfig {
        BacktestConfig {
            warmup_bars,
            ..BacktestConfig::default()
        }
    }

    #[test]
    fn default_config() {
        let c = BacktestConfig::default();
        assert!((c.total_capital - 50_000.0).abs() < f64::EPSILON);
        assert!((c.capital_per_trade - 5_000.0).abs() < f64::EPSILON);
        assert_eq!(c.warmup_bars, 30);
        assert_eq!(c.start_time, None);
        let capital = c.capital();
        assert!((capital.per_trade - 5_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_series_is_rejected() {
        let err = run_backtest(Vec::new(), &Strategy::default(), &config(0)).unwrap_err();
        assert!(matches!(err, DivtraderError::EmptySeries));
    }

    #[test]
    fn window_that_excludes_everything_is_empty() {
        let bars = make_bars(&[100.0, 101.0]);
        let after = bars[1].timestamp + chrono::Duration::minutes(5);
        let cfg = BacktestConfig {
            start_time: Some(after),
            ..config(0)
        };
        let err = run_backtest(bars, &Strategy::default(), &cfg).unwrap_err();
        assert!(matches!(err, DivtraderError::EmptySeries));
    }

    #[test]
    fn unsorted_series_is_rejected() {
        let mut bars = make_bars(&[100.0, 101.0, 102.0]);
        bars.swap(1, 2);
        let err = run_backtest(bars, &Strategy::default(), &config(0)).unwrap_err();
        assert!(matches!(err, DivtraderError::UnsortedSeries { index: 2, .. }));
    }

    #[test]
    fn warmup_bars_never_trade() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let result = run_backtest(
            make_bars(&closes),
            &small_strategy(SignalRules::default()),
            &config(20),
        )
        .unwrap();

        assert_eq!(result.bars.len(), 20);
        assert!(result.state.trades.is_empty());
        assert!(result.bars.iter().all(|b| b.stop_loss.is_none()));
    }

    #[test]
    fn macd_crossover_trade_round_trip() {
        // rally then collapse: MACD crosses above its signal on the rally,
        // the collapse hits the trailing stop
        let closes = [
            100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 102.0, 104.0, 106.0, 108.0, 110.0, 90.0,
            90.0,
        ];
        let strategy = small_strategy(SignalRules::new([
            crate::domain::signal::Predicate::MacdCrossover,
        ]));
        let result = run_backtest(make_bars(&closes), &strategy, &config(6)).unwrap();

        let first = &result.state.trades[0];
        assert_eq!(first.direction, Direction::Buy);
        assert!((first.entry_price - 102.0).abs() < f64::EPSILON);

        let exit = first.exit.as_ref().unwrap();
        assert!((exit.exit_price - 90.0).abs() < f64::EPSILON);
        assert!(result.summary.total_trades >= 1);

        // stop column: set from entry, cleared on the exit bar
        assert!(result.bars[5].stop_loss.is_none());
        assert!((result.bars[6].stop_loss.unwrap() - 102.0 * 0.98).abs() < 1e-9);
        assert!((result.bars[10].stop_loss.unwrap() - 110.0 * 0.98).abs() < 1e-9);
        assert!(result.bars[11].stop_loss.is_none());
    }

    #[test]
    fn zero_close_is_rejected_before_trading() {
        let closes = [100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 0.0, 1.0, 2.0];
        let strategy = small_strategy(SignalRules::new([
            crate::domain::signal::Predicate::MacdCrossover,
        ]));
        let err = run_backtest(make_bars(&closes), &strategy, &config(6)).unwrap_err();
        assert!(matches!(err, DivtraderError::MalformedCandle { index: 6, .. }));
    }

    #[test]
    fn faulty_row_is_no_signal_and_run_continues() {
        let closes = [
            100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 102.0, 104.0, 106.0, 108.0, 110.0, 90.0,
            90.0,
        ];
        let candles = make_bars(&closes);
        let strategy = small_strategy(SignalRules::new([
            crate::domain::signal::Predicate::MacdCrossover,
        ]));
        let mut rows = compute_indicator_rows(&candles, &strategy);
        rows[6].rsi = Some(f64::NAN);

        let result = simulate(candles, rows, &strategy, &config(6));

        assert_eq!(result.bars.len(), closes.len());
        assert!(result.bars[6].stop_loss.is_none());
        let first = &result.state.trades[0];
        assert_eq!(first.entry_time, result.bars[7].candle.timestamp);
        assert!((first.entry_price - 104.0).abs() < f64::EPSILON);
        assert!(first.is_complete());
    }

    #[test]
    fn bars_keep_indicator_rows() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + (i % 3) as f64).collect();
        let result = run_backtest(
            make_bars(&closes),
            &small_strategy(SignalRules::default()),
            &config(30),
        )
        .unwrap();

        assert_eq!(result.bars[0].indicators.rsi, None);
        assert!(result.bars[9].indicators.rsi.is_some());
        assert_eq!(result.summary, PerformanceSummary::default());
    }
}
