//! Configuration validation.
//!
//! Checks every strategy, capital and backtest key before a run starts.
//! Absent keys fall back to their defaults and are not errors.

use crate::domain::candle::parse_timestamp;
use crate::domain::error::DivtraderError;
use crate::domain::signal::SignalRules;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDateTime;

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), DivtraderError> {
    validate_period(config, "rsi", "period", 14)?;
    validate_period(config, "macd", "fast", 12)?;
    validate_period(config, "macd", "slow", 26)?;
    validate_period(config, "macd", "signal", 9)?;
    validate_period(config, "dmi", "period", 14)?;
    validate_macd_spans(config)?;
    validate_rsi_thresholds(config)?;
    validate_adx_strength(config)?;
    validate_stop_loss(config)?;
    validate_entry_predicates(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), DivtraderError> {
    validate_capital(config)?;
    validate_time_window(config)?;
    validate_warmup(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> DivtraderError {
    DivtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_period(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<(), DivtraderError> {
    if config.get_int(section, key, default) < 1 {
        return Err(invalid(section, key, format!("{} must be at least 1", key)));
    }
    Ok(())
}

fn validate_macd_spans(config: &dyn ConfigPort) -> Result<(), DivtraderError> {
    let fast = config.get_int("macd", "fast", 12);
    let slow = config.get_int("macd", "slow", 26);
    if fast >= slow {
        return Err(invalid("macd", "fast", "fast span must be shorter than slow span"));
    }
    Ok(())
}

fn validate_rsi_thresholds(config: &dyn ConfigPort) -> Result<(), DivtraderError> {
    let oversold = config.get_double("rsi", "oversold", 30.0);
    let overbought = config.get_double("rsi", "overbought", 70.0);

    for (key, value) in [("oversold", oversold), ("overbought", overbought)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid("rsi", key, format!("{} must be between 0 and 100", key)));
        }
    }
    if oversold >= overbought {
        return Err(invalid(
            "rsi",
            "oversold",
            "oversold must be below overbought",
        ));
    }
    Ok(())
}

fn validate_adx_strength(config: &dyn ConfigPort) -> Result<(), DivtraderError> {
    let value = config.get_double("strategy", "min_adx_strength", 20.0);
    if !(0.0..=100.0).contains(&value) {
        return Err(invalid(
            "strategy",
            "min_adx_strength",
            "min_adx_strength must be between 0 and 100",
        ));
    }
    Ok(())
}

fn validate_stop_loss(config: &dyn ConfigPort) -> Result<(), DivtraderError> {
    let value = config.get_double("strategy", "stop_loss_percent", 0.02);
    if !(value > 0.0 && value < 1.0) {
        return Err(invalid(
            "strategy",
            "stop_loss_percent",
            "stop_loss_percent must be between 0 and 1 (exclusive)",
        ));
    }
    Ok(())
}

fn validate_entry_predicates(config: &dyn ConfigPort) -> Result<(), DivtraderError> {
    if let Some(list) = config.get_string("strategy", "entry_predicates") {
        let rules = SignalRules::parse_list(&list)
            .map_err(|reason| invalid("strategy", "entry_predicates", reason))?;
        if rules.predicates().is_empty() {
            return Err(invalid(
                "strategy",
                "entry_predicates",
                "at least one entry predicate is required",
            ));
        }
    }
    Ok(())
}

fn validate_capital(config: &dyn ConfigPort) -> Result<(), DivtraderError> {
    let total = config.get_double("capital", "total_capital", 50_000.0);
    if !(total > 0.0) {
        return Err(invalid(
            "capital",
            "total_capital",
            "total_capital must be positive",
        ));
    }

    let per_trade = config.get_double("capital", "per_trade", 5_000.0);
    if !(per_trade > 0.0) {
        return Err(invalid("capital", "per_trade", "per_trade must be positive"));
    }
    if per_trade > total {
        return Err(invalid(
            "capital",
            "per_trade",
            "per_trade must not exceed total_capital",
        ));
    }
    Ok(())
}

/// Parse an optional `[backtest]` time bound.
pub fn parse_time_bound(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDateTime>, DivtraderError> {
    match config.get_string("backtest", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s).map(Some).ok_or_else(|| {
            invalid(
                "backtest",
                key,
                format!("invalid {} '{}', expected YYYY-MM-DD HH:MM[:SS]", key, s.trim()),
            )
        }),
    }
}

fn validate_time_window(config: &dyn ConfigPort) -> Result<(), DivtraderError> {
    let start = parse_time_bound(config, "start_time")?;
    let end = parse_time_bound(config, "end_time")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid(
                "backtest",
                "start_time",
                "start_time must not be after end_time",
            ));
        }
    }
    Ok(())
}

fn validate_warmup(config: &dyn ConfigPort) -> Result<(), DivtraderError> {
    if config.get_int("backtest", "warmup_bars", 30) < 0 {
        return Err(invalid(
            "backtest",
            "warmup_bars",
            "warmup_bars must be non-negative",
        ));
    }
    Ok(())
}
