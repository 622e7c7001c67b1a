//! Intraday OHLCV candle and series preconditions.

use chrono::NaiveDateTime;

use super::error::DivtraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    fn prices(&self) -> [f64; 4] {
        [self.open, self.high, self.low, self.close]
    }
}

/// Reject series the simulator cannot run on: empty input, non-increasing
/// timestamps, non-finite or non-positive prices, or a high below the low.
pub fn validate_candles(candles: &[Candle]) -> Result<(), DivtraderError> {
    if candles.is_empty() {
        return Err(DivtraderError::EmptySeries);
    }

    for (index, candle) in candles.iter().enumerate() {
        if candle.prices().iter().any(|p| !p.is_finite()) || !candle.volume.is_finite() {
            return Err(DivtraderError::MalformedCandle {
                index,
                reason: "non-finite value".into(),
            });
        }
        if candle.prices().iter().any(|&p| p <= 0.0) {
            return Err(DivtraderError::MalformedCandle {
                index,
                reason: "non-positive price".into(),
            });
        }
        if candle.high < candle.low {
            return Err(DivtraderError::MalformedCandle {
                index,
                reason: format!("high {} below low {}", candle.high, candle.low),
            });
        }
        if index > 0 && candle.timestamp <= candles[index - 1].timestamp {
            return Err(DivtraderError::UnsortedSeries {
                index,
                timestamp: candle.timestamp,
            });
        }
    }

    Ok(())
}

const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse a bar or window timestamp. A trailing UTC offset is dropped; a bare
/// date means midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = chrono::DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_local());
    }
    if let Some(dt) = TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt);
    }

    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Keep only candles inside the inclusive `[start, end]` window.
pub fn filter_window(
    candles: Vec<Candle>,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> Vec<Candle> {
    candles
        .into_iter()
        .filter(|c| start.is_none_or(|s| c.timestamp >= s))
        .filter(|c| end.is_none_or(|e| c.timestamp <= e))
        .collect()
}
