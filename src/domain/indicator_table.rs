//! Per-bar indicator rows assembled from the full-series engines.
//!
//! Every engine runs once over the whole candle slice; the rows are then the
//! column-wise view the signal evaluator and the simulator consume bar by bar.

use serde::Serialize;
use std::collections::HashMap;

use crate::domain::candle::Candle;
use crate::domain::indicator::{
    calculate_dmi, calculate_ema, calculate_macd, calculate_rsi, detect_divergence, Divergence,
    IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::strategy::Strategy;

/// Indicator values for one bar; `None` marks an engine still warming up.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub rsi: Option<f64>,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
    pub plus_di: Option<f64>,
    pub minus_di: Option<f64>,
    pub adx: Option<f64>,
    pub divergence: Option<Divergence>,
}

/// Run every engine the strategy needs, keyed by indicator type.
pub fn compute_indicators(
    candles: &[Candle],
    strategy: &Strategy,
) -> HashMap<IndicatorType, IndicatorSeries> {
    let series = [
        calculate_rsi(candles, strategy.rsi_period),
        calculate_ema(candles, strategy.macd_fast),
        calculate_ema(candles, strategy.macd_slow),
        calculate_macd(
            candles,
            strategy.macd_fast,
            strategy.macd_slow,
            strategy.macd_signal,
        ),
        calculate_dmi(candles, strategy.dmi_period),
    ];

    series
        .into_iter()
        .map(|s| (s.indicator_type.clone(), s))
        .collect()
}

pub fn build_rows(
    candles: &[Candle],
    strategy: &Strategy,
    indicators: &HashMap<IndicatorType, IndicatorSeries>,
) -> Vec<IndicatorRow> {
    let simple = |indicator_type: IndicatorType, i: usize| {
        indicators
            .get(&indicator_type)
            .and_then(|s| s.simple_at(i))
    };
    let macd_series = indicators.get(&IndicatorType::Macd {
        fast: strategy.macd_fast,
        slow: strategy.macd_slow,
        signal: strategy.macd_signal,
    });
    let dmi_series = indicators.get(&IndicatorType::Dmi(strategy.dmi_period));

    let rsi: Vec<Option<f64>> = (0..candles.len())
        .map(|i| simple(IndicatorType::Rsi(strategy.rsi_period), i))
        .collect();
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let divergence = detect_divergence(&closes, &rsi);

    (0..candles.len())
        .map(|i| {
            let mut row = IndicatorRow {
                rsi: rsi[i],
                ema_fast: simple(IndicatorType::Ema(strategy.macd_fast), i),
                ema_slow: simple(IndicatorType::Ema(strategy.macd_slow), i),
                divergence: divergence[i],
                ..IndicatorRow::default()
            };

            if let Some(IndicatorValue::Macd {
                line,
                signal,
                histogram,
            }) = macd_series.and_then(|s| s.value_at(i))
            {
                row.macd = Some(*line);
                row.signal = Some(*signal);
                row.histogram = Some(*histogram);
            }

            if let Some(IndicatorValue::Dmi {
                plus_di,
                minus_di,
                adx,
            }) = dmi_series.and_then(|s| s.value_at(i))
            {
                row.plus_di = Some(*plus_di);
                row.minus_di = Some(*minus_di);
                row.adx = *adx;
            }

            row
        })
        .collect()
}

pub fn compute_indicator_rows(candles: &[Candle], strategy: &Strategy) -> Vec<IndicatorRow> {
    let indicators = compute_indicators(candles, strategy);
    build_rows(candles, strategy, &indicators)
}
