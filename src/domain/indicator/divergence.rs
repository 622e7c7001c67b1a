//! Price / RSI divergence detector.
//!
//! Each bar's last two closes (from bar 1) and last three closes (from bar 2)
//! are compared with the matching RSI values:
//! - Bullish: price falls while RSI rises (2-bar), or both move monotonically
//!   in opposite directions over 3 bars
//! - Bearish: the mirror image
//!
//! The bullish check runs first, so a bar never carries both labels. Any
//! comparison touching an undefined RSI value is false.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Divergence {
    Bullish,
    Bearish,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divergence::Bullish => write!(f, "bullish"),
            Divergence::Bearish => write!(f, "bearish"),
        }
    }
}

fn rising(later: Option<f64>, earlier: Option<f64>) -> bool {
    matches!((later, earlier), (Some(a), Some(b)) if a > b)
}

fn falling(later: Option<f64>, earlier: Option<f64>) -> bool {
    matches!((later, earlier), (Some(a), Some(b)) if a < b)
}

/// One label per bar; bar 0 is always `None`.
pub fn detect_divergence(closes: &[f64], rsi: &[Option<f64>]) -> Vec<Option<Divergence>> {
    let len = closes.len().min(rsi.len());
    let mut labels = vec![None; closes.len()];

    for i in 1..len {
        let (c0, c1) = (Some(closes[i]), Some(closes[i - 1]));
        let (r0, r1) = (rsi[i], rsi[i - 1]);
        let (c2, r2) = match i {
            1 => (None, None),
            _ => (Some(closes[i - 2]), rsi[i - 2]),
        };

        let price_down_2 = falling(c0, c1);
        let price_up_2 = rising(c0, c1);
        let rsi_up_2 = rising(r0, r1);
        let rsi_down_2 = falling(r0, r1);

        let price_down_3 = price_down_2 && falling(c1, c2);
        let price_up_3 = price_up_2 && rising(c1, c2);
        let rsi_up_3 = rsi_up_2 && rising(r1, r2);
        let rsi_down_3 = rsi_down_2 && falling(r1, r2);

        if (price_down_2 && rsi_up_2) || (price_down_3 && rsi_up_3) {
            labels[i] = Some(Divergence::Bullish);
        } else if (price_up_2 && rsi_down_2) || (price_up_3 && rsi_down_3) {
            labels[i] = Some(Divergence::Bearish);
        }
    }

    labels
}
