//! Performance summary over completed trades.
//!
//! The capital curve starts at the configured total capital and appends each
//! trade's post-exit `capital_left`. Drawdown and Sharpe are taken from that
//! curve; every reported figure is rounded to two decimals.

use serde::Serialize;

use crate::domain::position::TradeRecord;

const PERIODS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate_percent: f64,
    pub total_profit: f64,
    pub avg_profit: f64,
    pub max_drawdown_percent: f64,
    pub sharpe_ratio: f64,
}

impl PerformanceSummary {
    /// Summarise `trades`; open (incomplete) records are ignored.
    pub fn compute(trades: &[TradeRecord], total_capital: f64) -> Self {
        let profits: Vec<f64> = trades.iter().filter_map(|t| t.profit()).collect();
        if profits.is_empty() {
            return PerformanceSummary::default();
        }

        let total_trades = profits.len();
        let wins = profits.iter().filter(|&&p| p > 0.0).count();
        let total_profit: f64 = profits.iter().sum();

        let curve = capital_curve(trades, total_capital);

        PerformanceSummary {
            total_trades,
            wins,
            losses: total_trades - wins,
            win_rate_percent: round2(wins as f64 / total_trades as f64 * 100.0),
            total_profit: round2(total_profit),
            avg_profit: round2(total_profit / total_trades as f64),
            max_drawdown_percent: round2(max_drawdown(&curve) * 100.0),
            sharpe_ratio: round2(sharpe_ratio(&curve)),
        }
    }
}

pub fn capital_curve(trades: &[TradeRecord], total_capital: f64) -> Vec<f64> {
    std::iter::once(total_capital)
        .chain(
            trades
                .iter()
                .filter_map(|t| t.exit.as_ref().map(|e| e.capital_left)),
        )
        .collect()
}

/// Largest peak-to-trough decline as a fraction of the running peak.
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let Some(&first) = curve.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &value in curve {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - value) / peak);
        }
    }
    max_dd
}

/// Annualised mean/stddev of the curve's step changes (population stddev).
/// Zero with fewer than two steps or no variance.
pub fn sharpe_ratio(curve: &[f64]) -> f64 {
    let deltas: Vec<f64> = curve.windows(2).map(|w| w[1] - w[0]).collect();
    if deltas.len() < 2 {
        return 0.0;
    }

    let n = deltas.len() as f64;
    let mean = deltas.iter().sum::<f64>() / n;
    let variance = deltas.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * PERIODS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
