use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered so that a larger RMS can never map to a smaller label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Momentum {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Volatility::Low => write!(f, "low"),
            Volatility::Medium => write!(f, "medium"),
            Volatility::High => write!(f, "high"),
        }
    }
}

impl fmt::Display for Momentum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Momentum::Bullish => write!(f, "bullish"),
            Momentum::Bearish => write!(f, "bearish"),
            Momentum::Neutral => write!(f, "neutral"),
        }
    }
}

/// One published tick for one market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketUpdate {
    pub market_id: String,
    pub yes_odds: f64,
    pub no_odds: f64,
    pub volume_24h: f64,
    pub timestamp: DateTime<Utc>,
    pub volatility: Volatility,
    pub momentum: Momentum,
    /// Rounded to two decimals
    pub price_change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolatilityInfo {
    pub level: Volatility,
    pub momentum: Momentum,
    pub last_change: f64,
}

impl From<&MarketUpdate> for VolatilityInfo {
    fn from(update: &MarketUpdate) -> Self {
        Self {
            level: update.volatility,
            momentum: update.momentum,
            last_change: update.price_change,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OddsPair {
    pub yes: f64,
    pub no: f64,
}

/// Latest view of a single-market feed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleMarketSnapshot {
    pub market_id: String,
    pub current_odds: Option<OddsPair>,
    pub last_update: Option<DateTime<Utc>>,
    pub volatility: Volatility,
    pub momentum: Momentum,
    pub recent_changes: Vec<f64>,
}

impl SingleMarketSnapshot {
    pub fn empty(market_id: &str) -> Self {
        Self {
            market_id: market_id.to_string(),
            current_odds: None,
            last_update: None,
            volatility: Volatility::Medium,
            momentum: Momentum::Neutral,
            recent_changes: Vec::new(),
        }
    }
}

/// Starting volume for a newly tracked market: a number, or a display
/// string such as `"$892K"`
#[derive(Debug, Clone, PartialEq)]
pub enum InitialVolume {
    Amount(f64),
    Display(String),
}

impl From<f64> for InitialVolume {
    fn from(amount: f64) -> Self {
        InitialVolume::Amount(amount)
    }
}

impl From<&str> for InitialVolume {
    fn from(display: &str) -> Self {
        InitialVolume::Display(display.to_string())
    }
}

impl From<String> for InitialVolume {
    fn from(display: String) -> Self {
        InitialVolume::Display(display)
    }
}
