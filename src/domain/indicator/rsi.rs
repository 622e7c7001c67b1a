//! RSI (Relative Strength Index) indicator implementation.
//!
//! Average gain/loss is a simple rolling mean over `period` bars (not Wilder's
//! smoothing):
//! - gain[i] = max(C[i] - C[i-1], 0), loss[i] = max(C[i-1] - C[i], 0), both 0 at bar 0
//! - RS = avg_gain / (avg_loss + 1e-10)
//! - RSI = 100 - 100 / (1 + RS)
//!
//! Warmup: first `period - 1` bars are invalid.

use crate::domain::candle::Candle;
use crate::domain::indicator::{
    IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue, RATIO_EPSILON,
};

pub const DEFAULT_PERIOD: usize = 14;

pub fn rsi_values(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        let change = if i == 0 { 0.0 } else { closes[i] - closes[i - 1] };
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let mut values = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if i + 1 < period {
            values.push(None);
            continue;
        }

        let window = i + 1 - period..=i;
        let avg_gain = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[window].iter().sum::<f64>() / period as f64;

        let rs = avg_gain / (avg_loss + RATIO_EPSILON);
        values.push(Some(100.0 - 100.0 / (1.0 + rs)));
    }

    values
}

pub fn calculate_rsi(candles: &[Candle], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let values = rsi_values(&closes, period)
        .into_iter()
        .zip(candles)
        .map(|(rsi, candle)| IndicatorPoint {
            timestamp: candle.timestamp,
            valid: rsi.is_some(),
            value: IndicatorValue::Simple(rsi.unwrap_or(0.0)),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}
