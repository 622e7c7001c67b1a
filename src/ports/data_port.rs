//! Candle data access port trait.

use crate::domain::candle::Candle;
use crate::domain::error::DivtraderError;
use chrono::NaiveDateTime;

pub trait DataPort {
    /// Candles in source order, restricted to the inclusive bounds when given.
    fn fetch_candles(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Vec<Candle>, DivtraderError>;

    /// First timestamp, last timestamp and bar count; None for an empty source.
    fn data_range(&self) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, DivtraderError>;
}
