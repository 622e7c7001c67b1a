//! Open position, entry snapshot and the trade record built from them.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::indicator::Divergence;
use crate::domain::indicator_table::IndicatorRow;
use crate::domain::signal::Direction;

#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub stop_loss: f64,
    pub quantity: f64,
}

impl OpenPosition {
    /// Opens at `price` with the stop `stop_loss_percent` away on the losing side.
    pub fn open(
        direction: Direction,
        price: f64,
        time: NaiveDateTime,
        allocation: f64,
        stop_loss_percent: f64,
    ) -> Self {
        OpenPosition {
            direction,
            entry_price: price,
            entry_time: time,
            stop_loss: initial_stop(direction, price, stop_loss_percent),
            quantity: allocation / price,
        }
    }

    pub fn should_stop_out(&self, close: f64) -> bool {
        match self.direction {
            Direction::Buy => close <= self.stop_loss,
            Direction::Short => close >= self.stop_loss,
        }
    }

    /// Tighten the stop toward `close`. Returns true if it moved.
    pub fn trail_stop(&mut self, close: f64, stop_loss_percent: f64) -> bool {
        let candidate = initial_stop(self.direction, close, stop_loss_percent);
        let tighter = match self.direction {
            Direction::Buy => candidate > self.stop_loss,
            Direction::Short => candidate < self.stop_loss,
        };
        if tighter {
            self.stop_loss = candidate;
        }
        tighter
    }

    pub fn profit_at(&self, price: f64) -> f64 {
        match self.direction {
            Direction::Buy => (price - self.entry_price) * self.quantity,
            Direction::Short => (self.entry_price - price) * self.quantity,
        }
    }

    pub fn cost_basis(&self) -> f64 {
        self.entry_price * self.quantity
    }
}

fn initial_stop(direction: Direction, price: f64, stop_loss_percent: f64) -> f64 {
    match direction {
        Direction::Buy => price * (1.0 - stop_loss_percent),
        Direction::Short => price * (1.0 + stop_loss_percent),
    }
}

/// Indicator values and rationale captured on the entry bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySnapshot {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal_line: Option<f64>,
    pub plus_di: Option<f64>,
    pub minus_di: Option<f64>,
    pub adx: Option<f64>,
    pub divergence: Option<Divergence>,
    pub rationale: String,
    pub initial_stop: f64,
}

impl EntrySnapshot {
    pub fn capture(row: &IndicatorRow, rationale: String, initial_stop: f64) -> Self {
        EntrySnapshot {
            rsi: row.rsi,
            macd: row.macd,
            signal_line: row.signal,
            plus_di: row.plus_di,
            minus_di: row.minus_di,
            adx: row.adx,
            divergence: row.divergence,
            rationale,
            initial_stop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeExit {
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub profit: f64,
    pub return_pct: f64,
    pub capital_left: f64,
}

/// Written on entry, completed in place on exit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub entry_time: NaiveDateTime,
    pub direction: Direction,
    pub entry_price: f64,
    pub position_size: f64,
    pub snapshot: EntrySnapshot,
    pub exit: Option<TradeExit>,
}

impl TradeRecord {
    pub fn is_complete(&self) -> bool {
        self.exit.is_some()
    }

    pub fn profit(&self) -> Option<f64> {
        self.exit.as_ref().map(|e| e.profit)
    }
}
