//! Entry signal evaluation.
//!
//! A signal is the conjunction of the enabled [`Predicate`]s for one direction.
//! The default rule set enables only [`Predicate::Divergence`]; the RSI, MACD,
//! DMI and ADX checks stay available and can be switched on individually.
//!
//! Evaluation returns no signal while RSI, MACD or ADX are still warming up.
//! Non-finite indicator values are reported as [`SignalError`] so the run loop
//! can log the bar and carry on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::indicator::Divergence;
use crate::domain::indicator_table::IndicatorRow;
use crate::domain::strategy::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "buy"),
            Direction::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// RSI below oversold (buy) / above overbought (short).
    RsiThreshold,
    /// MACD line above (buy) / below (short) its signal line.
    MacdCrossover,
    /// +DI above -DI (buy) / -DI above +DI (short).
    DmiDirection,
    /// ADX above `min_adx_strength`, either direction.
    AdxStrength,
    /// Bullish (buy) / bearish (short) price-RSI divergence.
    Divergence,
}

impl Predicate {
    pub const ALL: [Predicate; 5] = [
        Predicate::RsiThreshold,
        Predicate::MacdCrossover,
        Predicate::DmiDirection,
        Predicate::AdxStrength,
        Predicate::Divergence,
    ];

    fn holds(self, direction: Direction, v: &RowValues, strategy: &Strategy) -> bool {
        match (self, direction) {
            (Predicate::RsiThreshold, Direction::Buy) => v.rsi < strategy.rsi_oversold,
            (Predicate::RsiThreshold, Direction::Short) => v.rsi > strategy.rsi_overbought,
            (Predicate::MacdCrossover, Direction::Buy) => v.macd > v.signal,
            (Predicate::MacdCrossover, Direction::Short) => v.macd < v.signal,
            (Predicate::DmiDirection, Direction::Buy) => {
                matches!((v.plus_di, v.minus_di), (Some(p), Some(m)) if p > m)
            }
            (Predicate::DmiDirection, Direction::Short) => {
                matches!((v.plus_di, v.minus_di), (Some(p), Some(m)) if m > p)
            }
            (Predicate::AdxStrength, _) => v.adx > strategy.min_adx_strength,
            (Predicate::Divergence, Direction::Buy) => v.divergence == Some(Divergence::Bullish),
            (Predicate::Divergence, Direction::Short) => {
                v.divergence == Some(Divergence::Bearish)
            }
        }
    }

    fn label(self) -> &'static str {
        match self {
            Predicate::RsiThreshold => "RSI",
            Predicate::MacdCrossover => "MACD",
            Predicate::DmiDirection => "DMI",
            Predicate::AdxStrength => "ADX",
            Predicate::Divergence => "Divergence",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Predicate::RsiThreshold => "rsi",
            Predicate::MacdCrossover => "macd",
            Predicate::DmiDirection => "dmi",
            Predicate::AdxStrength => "adx",
            Predicate::Divergence => "divergence",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Predicate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rsi" => Ok(Predicate::RsiThreshold),
            "macd" => Ok(Predicate::MacdCrossover),
            "dmi" => Ok(Predicate::DmiDirection),
            "adx" => Ok(Predicate::AdxStrength),
            "divergence" => Ok(Predicate::Divergence),
            other => Err(format!("unknown entry predicate '{}'", other)),
        }
    }
}

/// The set of predicates that must all agree before an entry fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalRules {
    predicates: Vec<Predicate>,
}

impl SignalRules {
    pub fn new(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let mut rules = SignalRules {
            predicates: Vec::new(),
        };
        for p in predicates {
            rules.enable(p);
        }
        rules
    }

    /// Every predicate enabled: the full RSI/MACD/DMI/ADX/divergence conjunction.
    pub fn all() -> Self {
        Self::new(Predicate::ALL)
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_enabled(&self, predicate: Predicate) -> bool {
        self.predicates.contains(&predicate)
    }

    pub fn enable(&mut self, predicate: Predicate) {
        if !self.is_enabled(predicate) {
            self.predicates.push(predicate);
        }
    }

    pub fn disable(&mut self, predicate: Predicate) {
        self.predicates.retain(|p| *p != predicate);
    }

    /// Parse a comma-separated list such as `"rsi, macd, divergence"`.
    pub fn parse_list(list: &str) -> Result<Self, String> {
        let predicates = list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(Predicate::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(predicates))
    }
}

impl Default for SignalRules {
    fn default() -> Self {
        Self::new([Predicate::Divergence])
    }
}

impl fmt::Display for SignalRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.predicates.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", names.join(","))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalError {
    #[error("non-finite {field} value {value}")]
    NonFinite { field: &'static str, value: f64 },
}

/// Row values with the warm-up gate already applied.
struct RowValues {
    rsi: f64,
    macd: f64,
    signal: f64,
    adx: f64,
    plus_di: Option<f64>,
    minus_di: Option<f64>,
    divergence: Option<Divergence>,
}

fn finite(field: &'static str, value: f64) -> Result<f64, SignalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SignalError::NonFinite { field, value })
    }
}

fn row_values(row: &IndicatorRow) -> Result<Option<RowValues>, SignalError> {
    let (Some(rsi), Some(macd), Some(signal), Some(adx)) = (row.rsi, row.macd, row.signal, row.adx)
    else {
        return Ok(None);
    };

    Ok(Some(RowValues {
        rsi: finite("rsi", rsi)?,
        macd: finite("macd", macd)?,
        signal: finite("signal", signal)?,
        adx: finite("adx", adx)?,
        plus_di: row.plus_di.map(|v| finite("plus_di", v)).transpose()?,
        minus_di: row.minus_di.map(|v| finite("minus_di", v)).transpose()?,
        divergence: row.divergence,
    }))
}

/// Decide whether this bar opens a trade. Buy is checked before short.
pub fn evaluate_signal(
    row: &IndicatorRow,
    strategy: &Strategy,
) -> Result<Option<Direction>, SignalError> {
    let Some(values) = row_values(row)? else {
        return Ok(None);
    };

    let predicates = strategy.rules.predicates();
    if predicates.is_empty() {
        return Ok(None);
    }

    for direction in [Direction::Buy, Direction::Short] {
        if predicates
            .iter()
            .all(|p| p.holds(direction, &values, strategy))
        {
            return Ok(Some(direction));
        }
    }

    Ok(None)
}

/// Human-readable reason for an entry: every indicator that agreed with the
/// direction, whether or not its predicate was enabled.
pub fn entry_rationale(row: &IndicatorRow, direction: Direction, strategy: &Strategy) -> String {
    let agreeing: Vec<&str> = match row_values(row) {
        Ok(Some(values)) => Predicate::ALL
            .iter()
            .filter(|p| **p != Predicate::AdxStrength || strategy.rules.is_enabled(**p))
            .filter(|p| p.holds(direction, &values, strategy))
            .map(|p| p.label())
            .collect(),
        _ => Vec::new(),
    };

    if agreeing.is_empty() {
        format!("{} signal", direction)
    } else {
        format!("{} signal: {}", direction, agreeing.join(", "))
    }
}
