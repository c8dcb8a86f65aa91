use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk below this is a Strong Buy
pub const STRONG_BUY_BELOW: f64 = 0.2;
/// Risk below this (and >= STRONG_BUY_BELOW) is a Buy
pub const BUY_BELOW: f64 = 0.4;
/// Risk below this (and >= BUY_BELOW) is Neutral
pub const NEUTRAL_BELOW: f64 = 0.6;
/// Risk below this (and >= NEUTRAL_BELOW) is a Sell; anything higher is a Strong Sell
pub const SELL_BELOW: f64 = 0.8;

/// Trading signal derived purely from risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    #[serde(rename = "Strong Sell")]
    StrongSell,
}

impl Signal {
    /// Threshold mapping on risk; the coefficient plays no part here
    pub fn from_risk(risk: f64) -> Self {
        if risk < STRONG_BUY_BELOW {
            Signal::StrongBuy
        } else if risk < BUY_BELOW {
            Signal::Buy
        } else if risk < NEUTRAL_BELOW {
            Signal::Neutral
        } else if risk < SELL_BELOW {
            Signal::Sell
        } else {
            Signal::StrongSell
        }
    }

    /// Score before the band coefficient is applied
    pub fn base_score(self) -> f64 {
        match self {
            Signal::StrongBuy => 10.0,
            Signal::Buy => 5.0,
            Signal::Neutral => 0.0,
            Signal::Sell => -5.0,
            Signal::StrongSell => -10.0,
        }
    }

    /// Final score for a band coefficient
    pub fn score(self, coefficient: f64) -> f64 {
        match self {
            Signal::Neutral => 0.0,
            other => other.base_score() * coefficient,
        }
    }

    pub fn is_bullish(self) -> bool {
        matches!(self, Signal::StrongBuy | Signal::Buy)
    }

    pub fn is_bearish(self) -> bool {
        matches!(self, Signal::Sell | Signal::StrongSell)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::StrongBuy => write!(f, "Strong Buy"),
            Signal::Buy => write!(f, "Buy"),
            Signal::Neutral => write!(f, "Neutral"),
            Signal::Sell => write!(f, "Sell"),
            Signal::StrongSell => write!(f, "Strong Sell"),
        }
    }
}
