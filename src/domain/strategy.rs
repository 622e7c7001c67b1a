//! Strategy parameters: indicator spans, thresholds, stop-loss and entry rules.

use crate::domain::indicator::{dmi, macd, rsi};
use crate::domain::signal::SignalRules;

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub dmi_period: usize,
    pub min_adx_strength: f64,
    /// Trailing stop distance as a fraction of price (0.02 = 2%).
    pub stop_loss_percent: f64,
    pub rules: SignalRules,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy {
            rsi_period: rsi::DEFAULT_PERIOD,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            dmi_period: dmi::DEFAULT_PERIOD,
            min_adx_strength: 20.0,
            stop_loss_percent: 0.02,
            rules: SignalRules::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Predicate;

    #[test]
    fn default_strategy_fields() {
        let s = Strategy::default();
        assert_eq!(s.rsi_period, 14);
        assert_eq!((s.macd_fast, s.macd_slow, s.macd_signal), (12, 26, 9));
        assert_eq!(s.dmi_period, 14);
        assert!((s.stop_loss_percent - 0.02).abs() < f64::EPSILON);
        assert!((s.min_adx_strength - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_rules_are_divergence_only() {
        let s = Strategy::default();
        assert_eq!(s.rules.predicates(), &[Predicate::Divergence]);
    }

    #[test]
    fn struct_update_keeps_defaults() {
        let s = Strategy {
            stop_loss_percent: 0.05,
            ..Strategy::default()
        };
        assert!((s.stop_loss_percent - 0.05).abs() < f64::EPSILON);
        assert_eq!(s.rsi_period, 14);
    }
}
