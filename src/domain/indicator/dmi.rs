//! DMI / ADX (Directional Movement Index, Average Directional Index).
//!
//! For each bar after the first:
//! - up = H[i] - H[i-1], down = L[i-1] - L[i]
//! - +DM = up if up > down and up > 0, else 0; -DM symmetric
//! - TR = max(H - L, |H - prevC|, |L - prevC|)
//!
//! +DM, -DM and TR are smoothed with a rolling **sum** over `period` bars:
//! - +DI = 100 * sum(+DM) / (sum(TR) + 1e-10), -DI symmetric
//! - DX = 100 * |+DI - -DI| / (+DI + -DI + 1e-10)
//! - ADX = rolling mean of DX over `period`
//!
//! Warmup: +DI/-DI are invalid for the first `period` bars, ADX for the first
//! `2 * period - 1` bars.

use crate::domain::candle::Candle;
use crate::domain::indicator::{
    IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue, RATIO_EPSILON,
};

pub const DEFAULT_PERIOD: usize = 14;

struct Movement {
    plus_dm: f64,
    minus_dm: f64,
    tr: f64,
}

fn movement(prev: &Candle, curr: &Candle) -> Movement {
    let up = curr.high - prev.high;
    let down = prev.low - curr.low;
    Movement {
        plus_dm: if up > down && up > 0.0 { up } else { 0.0 },
        minus_dm: if down > up && down > 0.0 { down } else { 0.0 },
        tr: curr.true_range(prev.close),
    }
}

pub fn calculate_dmi(candles: &[Candle], period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Dmi(period);

    if period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    // moves[k] describes the step from bar k to bar k+1
    let moves: Vec<Movement> = candles.windows(2).map(|w| movement(&w[0], &w[1])).collect();

    let mut dx: Vec<Option<f64>> = Vec::with_capacity(candles.len());
    let mut values = Vec::with_capacity(candles.len());

    for (i, candle) in candles.iter().enumerate() {
        if i < period {
            dx.push(None);
            values.push(IndicatorPoint {
                timestamp: candle.timestamp,
                valid: false,
                value: IndicatorValue::Dmi {
                    plus_di: 0.0,
                    minus_di: 0.0,
                    adx: None,
                },
            });
            continue;
        }

        let window = &moves[i - period..i];
        let plus_sum: f64 = window.iter().map(|m| m.plus_dm).sum();
        let minus_sum: f64 = window.iter().map(|m| m.minus_dm).sum();
        let tr_sum: f64 = window.iter().map(|m| m.tr).sum();

        let plus_di = 100.0 * plus_sum / (tr_sum + RATIO_EPSILON);
        let minus_di = 100.0 * minus_sum / (tr_sum + RATIO_EPSILON);
        dx.push(Some(
            100.0 * (plus_di - minus_di).abs() / (plus_di + minus_di + RATIO_EPSILON),
        ));

        let adx = if i + 1 >= 2 * period {
            let sum: f64 = dx[i + 1 - period..=i].iter().flatten().sum();
            Some(sum / period as f64)
        } else {
            None
        };

        values.push(IndicatorPoint {
            timestamp: candle.timestamp,
            valid: true,
            value: IndicatorValue::Dmi {
                plus_di,
                minus_di,
                adx,
            },
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}
