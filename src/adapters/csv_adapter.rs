//! CSV candle file adapter.
//!
//! Expects a header row with `timestamp` (or `datetime`/`date`), `open`,
//! `high`, `low`, `close` and an optional `volume` column, in any order. Rows
//! are returned in file order; ordering is checked by the domain, not here.

use crate::domain::candle::{parse_timestamp, Candle};
use crate::domain::error::DivtraderError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use csv::StringRecord;
use std::path::PathBuf;

const TIMESTAMP_HEADERS: [&str; 3] = ["timestamp", "datetime", "date"];

pub struct CsvAdapter {
    path: PathBuf,
}

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, DivtraderError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| DivtraderError::Data {
                reason: format!("missing {} column", name),
            })
        };

        Ok(Columns {
            timestamp: TIMESTAMP_HEADERS
                .iter()
                .find_map(|&h| find(h))
                .ok_or_else(|| DivtraderError::Data {
                    reason: "missing timestamp column".into(),
                })?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

fn parse_price(
    record: &StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<f64, DivtraderError> {
    let raw = record.get(index).ok_or_else(|| DivtraderError::Data {
        reason: format!("line {}: missing {} value", line, name),
    })?;
    raw.trim().parse().map_err(|e| DivtraderError::Data {
        reason: format!("line {}: invalid {} value '{}': {}", line, name, raw, e),
    })
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_all(&self) -> Result<Vec<Candle>, DivtraderError> {
        let mut rdr = csv::Reader::from_path(&self.path).map_err(|e| DivtraderError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        let columns = Columns::from_headers(rdr.headers()?)?;

        let mut candles = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let raw_ts = record.get(columns.timestamp).unwrap_or_default();
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| DivtraderError::Data {
                reason: format!("line {}: invalid timestamp '{}'", line, raw_ts),
            })?;

            candles.push(Candle {
                timestamp,
                open: parse_price(&record, columns.open, "open", line)?,
                high: parse_price(&record, columns.high, "high", line)?,
                low: parse_price(&record, columns.low, "low", line)?,
                close: parse_price(&record, columns.close, "close", line)?,
                volume: match columns.volume {
                    Some(index) => parse_price(&record, index, "volume", line)?,
                    None => 0.0,
                },
            });
        }

        Ok(candles)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_candles(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Vec<Candle>, DivtraderError> {
        let candles = self.read_all()?;
        Ok(crate::domain::candle::filter_window(candles, start, end))
    }

    fn data_range(&self) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, DivtraderError> {
        let candles = self.read_all()?;
        Ok(match (candles.first(), candles.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp, candles.len())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn write_csv(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nifty50_5minute_data.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    const SAMPLE: &str = "timestamp,open,high,low,close,volume\n\
        2024-01-02 09:15:00,21700.0,21720.5,21690.0,21710.0,120000\n\
        2024-01-02 09:20:00,21710.0,21735.0,21705.0,21730.0,95000\n\
        2024-01-02 09:25:00+05:30,21730.0,21740.0,21700.0,21705.5,88000\n";

    #[test]
    fn fetch_candles_reads_all_rows() {
        let (_dir, path) = write_csv(SAMPLE);
        let candles = CsvAdapter::new(path).fetch_candles(None, None).unwrap();

        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].timestamp, at(9, 15));
        assert_eq!(candles[0].high, 21720.5);
        assert_eq!(candles[0].volume, 120000.0);
        assert_eq!(candles[2].timestamp, at(9, 25));
        assert_eq!(candles[2].close, 21705.5);
    }

    #[test]
    fn fetch_candles_filters_window() {
        let (_dir, path) = write_csv(SAMPLE);
        let candles = CsvAdapter::new(path)
            .fetch_candles(Some(at(9, 20)), Some(at(9, 20)))
            .unwrap();

        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].timestamp, at(9, 20));
    }

    #[test]
    fn columns_in_any_order_without_volume() {
        let (_dir, path) = write_csv(
            "close,low,high,open,date\n\
             101.0,99.0,102.0,100.0,2024-01-02 09:15\n",
        );
        let candles = CsvAdapter::new(path).fetch_candles(None, None).unwrap();

        assert_eq!(candles[0].open, 100.0);
        assert_eq!(candles[0].close, 101.0);
        assert_eq!(candles[0].volume, 0.0);
    }

    #[test]
    fn missing_column_is_data_error() {
        let (_dir, path) = write_csv("timestamp,open,high,close\n2024-01-02 09:15,1,2,1\n");
        let err = CsvAdapter::new(path).fetch_candles(None, None).unwrap_err();
        assert!(matches!(err, DivtraderError::Data { reason } if reason.contains("low")));
    }

    #[test]
    fn bad_price_is_data_error() {
        let (_dir, path) =
            write_csv("timestamp,open,high,low,close\n2024-01-02 09:15,1,2,x,1\n");
        let err = CsvAdapter::new(path).fetch_candles(None, None).unwrap_err();
        assert!(matches!(err, DivtraderError::Data { reason } if reason.contains("low")));
    }

    #[test]
    fn bad_timestamp_is_data_error() {
        let (_dir, path) = write_csv("timestamp,open,high,low,close\nnoon,1,2,1,1\n");
        let err = CsvAdapter::new(path).fetch_candles(None, None).unwrap_err();
        assert!(matches!(err, DivtraderError::Data { reason } if reason.contains("noon")));
    }

    #[test]
    fn missing_file_is_data_error() {
        let adapter = CsvAdapter::new(PathBuf::from("/nonexistent/candles.csv"));
        assert!(matches!(
            adapter.fetch_candles(None, None),
            Err(DivtraderError::Data { .. })
        ));
    }

    #[test]
    fn data_range_reports_bounds_and_count() {
        let (_dir, path) = write_csv(SAMPLE);
        let range = CsvAdapter::new(path).data_range().unwrap();
        assert_eq!(range, Some((at(9, 15), at(9, 25), 3)));
    }

    #[test]
    fn data_range_empty_file() {
        let (_dir, path) = write_csv("timestamp,open,high,low,close,volume\n");
        assert_eq!(CsvAdapter::new(path).data_range().unwrap(), None);
    }
}
