//! Single-slot trade simulator: one open position at most, a capital ledger,
//! a trailing stop and the ordered trade log.
//!
//! Per bar, while a position is open the close is checked against the stop
//! first; if it survives, the stop trails. While flat, a signal opens a
//! position when `available_capital >= capital_per_trade`, otherwise the bar
//! is recorded as a skipped entry.
//!
//! The ledger keeps
//! `available + (per_trade if open) == total + realized_profit` on every bar.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::candle::Candle;
use crate::domain::indicator_table::IndicatorRow;
use crate::domain::position::{EntrySnapshot, OpenPosition, TradeExit, TradeRecord};
use crate::domain::signal::{entry_rationale, Direction};
use crate::domain::strategy::Strategy;

/// An entry signal that could not be funded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedEntry {
    pub time: NaiveDateTime,
    pub direction: Direction,
    pub price: f64,
    pub available_capital: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BarOutcome {
    Flat,
    Entered(Direction),
    Skipped(Direction),
    Held { stop_loss: f64, moved: bool },
    Exited { profit: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeState {
    pub position: Option<OpenPosition>,
    pub total_capital: f64,
    pub available_capital: f64,
    pub capital_per_trade: f64,
    pub realized_profit: f64,
    pub trades: Vec<TradeRecord>,
    pub skipped: Vec<SkippedEntry>,
}

impl TradeState {
    pub fn new(total_capital: f64, capital_per_trade: f64) -> Self {
        TradeState {
            position: None,
            total_capital,
            available_capital: total_capital,
            capital_per_trade,
            realized_profit: 0.0,
            trades: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn stop_loss(&self) -> Option<f64> {
        self.position.as_ref().map(|p| p.stop_loss)
    }

    pub fn committed_capital(&self) -> f64 {
        if self.is_flat() {
            0.0
        } else {
            self.capital_per_trade
        }
    }

    pub fn completed_trades(&self) -> Vec<TradeRecord> {
        self.trades
            .iter()
            .filter(|t| t.is_complete())
            .cloned()
            .collect()
    }

    pub fn open_trade(&self) -> Option<&TradeRecord> {
        self.trades.last().filter(|t| !t.is_complete())
    }

    /// Open a position at the candle close. Returns false, and records a
    /// skipped entry, when capital is short.
    pub fn enter(
        &mut self,
        candle: &Candle,
        direction: Direction,
        row: &IndicatorRow,
        strategy: &Strategy,
    ) -> bool {
        if !self.is_flat() {
            return false;
        }

        if self.available_capital < self.capital_per_trade {
            tracing::warn!(
                "[{}] skipped {} entry: available capital {:.2} below {:.2} per trade",
                candle.timestamp,
                direction,
                self.available_capital,
                self.capital_per_trade
            );
            self.skipped.push(SkippedEntry {
                time: candle.timestamp,
                direction,
                price: candle.close,
                available_capital: self.available_capital,
            });
            return false;
        }

        let position = OpenPosition::open(
            direction,
            candle.close,
            candle.timestamp,
            self.capital_per_trade,
            strategy.stop_loss_percent,
        );
        let rationale = entry_rationale(row, direction, strategy);

        tracing::info!(
            "[{}] ENTER {} @ {:.2} | qty {:.4} | stop {:.2} | {}",
            candle.timestamp,
            direction,
            position.entry_price,
            position.quantity,
            position.stop_loss,
            rationale
        );

        self.trades.push(TradeRecord {
            entry_time: position.entry_time,
            direction,
            entry_price: position.entry_price,
            position_size: position.quantity,
            snapshot: EntrySnapshot::capture(row, rationale, position.stop_loss),
            exit: None,
        });
        self.available_capital -= self.capital_per_trade;
        self.position = Some(position);
        true
    }

    /// Close the open position at the candle close and settle the ledger.
    pub fn exit(&mut self, candle: &Candle) -> Option<f64> {
        let position = self.position.take()?;

        let exit_price = candle.close;
        let profit = position.profit_at(exit_price);
        let cost = position.cost_basis();
        let return_pct = if cost > 0.0 {
            profit / cost * 100.0
        } else {
            0.0
        };

        self.available_capital += self.capital_per_trade + profit;
        self.realized_profit += profit;

        tracing::info!(
            "[{}] EXIT {} @ {:.2} | PnL {:.2} | return {:.2}%",
            candle.timestamp,
            position.direction,
            exit_price,
            profit,
            return_pct
        );

        if let Some(record) = self.trades.last_mut().filter(|t| !t.is_complete()) {
            record.exit = Some(TradeExit {
                exit_time: candle.timestamp,
                exit_price,
                profit,
                return_pct,
                capital_left: self.available_capital,
            });
        }

        Some(profit)
    }

    /// Trail the stop toward the candle close; None when flat.
    pub fn trail_stop(&mut self, candle: &Candle, stop_loss_percent: f64) -> Option<bool> {
        let position = self.position.as_mut()?;
        let moved = position.trail_stop(candle.close, stop_loss_percent);
        if moved {
            tracing::debug!(
                "[{}] trailing stop -> {:.2}",
                candle.timestamp,
                position.stop_loss
            );
        }
        Some(moved)
    }

    /// Advance the state machine by one bar.
    pub fn on_bar(
        &mut self,
        candle: &Candle,
        row: &IndicatorRow,
        signal: Option<Direction>,
        strategy: &Strategy,
    ) -> BarOutcome {
        if let Some(position) = &self.position {
            if position.should_stop_out(candle.close) {
                let profit = self.exit(candle).unwrap_or_default();
                return BarOutcome::Exited { profit };
            }
            let moved = self
                .trail_stop(candle, strategy.stop_loss_percent)
                .unwrap_or(false);
            let stop_loss = self.stop_loss().unwrap_or_default();
            return BarOutcome::Held { stop_loss, moved };
        }

        match signal {
            Some(direction) if self.enter(candle, direction, row, strategy) => {
                BarOutcome::Entered(direction)
            }
            Some(direction) => BarOutcome::Skipped(direction),
            None => BarOutcome::Flat,
        }
    }
}
