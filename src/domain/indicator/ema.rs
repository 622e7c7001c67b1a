//! Exponential Moving Average indicator.
//!
//! alpha = 2/(s+1), EMA[0] = P[0], then EMA[i] = P[i]*alpha + EMA[i-1]*(1-alpha).
//! No warmup: every point is valid.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

/// Recursive EMA over a raw value sequence. Empty input or a zero span yields
/// an empty vector.
pub fn ema_values(prices: &[f64], span: usize) -> Vec<f64> {
    if span == 0 || prices.is_empty() {
        return Vec::new();
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut values = Vec::with_capacity(prices.len());
    let mut ema = prices[0];
    values.push(ema);

    for &price in &prices[1..] {
        ema = alpha * price + (1.0 - alpha) * ema;
        values.push(ema);
    }

    values
}

pub fn calculate_ema(candles: &[Candle], span: usize) -> IndicatorSeries {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let values = ema_values(&closes, span)
        .into_iter()
        .zip(candles)
        .map(|(ema, candle)| IndicatorPoint {
            timestamp: candle.timestamp,
            valid: true,
            value: IndicatorValue::Simple(ema),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(span),
        values,
    }
}
