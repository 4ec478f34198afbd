use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::types::time_ago;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Polymarket,
    Kalshi,
    PredictIt,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Polymarket => write!(f, "Polymarket"),
            Platform::Kalshi => write!(f, "Kalshi"),
            Platform::PredictIt => write!(f, "PredictIt"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityStatus {
    Active,
    Fading,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrageOpportunity {
    pub id: u32,
    pub market: String,
    pub platform1: Platform,
    pub platform2: Platform,
    pub odds1: f64,
    pub odds2: f64,
    /// Percent
    pub profit: f64,
    pub capital: f64,
    pub expected_return: f64,
    pub detected_at: DateTime<Utc>,
    pub status: OpportunityStatus,
}

impl ArbitrageOpportunity {
    pub fn net_return(&self) -> f64 {
        self.expected_return - self.capital
    }

    /// Odds gap between the two venues, in points
    pub fn spread(&self) -> f64 {
        (self.odds1 - self.odds2).abs()
    }

    pub fn detected_label(&self, now: DateTime<Utc>) -> String {
        time_ago(self.detected_at, now)
    }
}

/// Venues the user wants to see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformSelection {
    pub polymarket: bool,
    pub kalshi: bool,
    pub predictit: bool,
}

impl Default for PlatformSelection {
    fn default() -> Self {
        Self {
            polymarket: true,
            kalshi: true,
            predictit: true,
        }
    }
}

impl PlatformSelection {
    pub fn contains(&self, platform: Platform) -> bool {
        match platform {
            Platform::Polymarket => self.polymarket,
            Platform::Kalshi => self.kalshi,
            Platform::PredictIt => self.predictit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrageStats {
    pub count: usize,
    pub average_profit: f64,
    pub total_capital: f64,
    pub total_net_return: f64,
}

pub struct ArbitrageScanner {
    opportunities: Vec<ArbitrageOpportunity>,
}

impl ArbitrageScanner {
    pub fn new(opportunities: Vec<ArbitrageOpportunity>) -> Self {
        Self { opportunities }
    }

    pub fn opportunities(&self) -> &[ArbitrageOpportunity] {
        &self.opportunities
    }

    /// Opportunities at or above `min_profit` whose venues are both selected
    pub fn filter(&self, min_profit: f64, platforms: &PlatformSelection) -> Vec<&ArbitrageOpportunity> {
        self.opportunities
            .iter()
            .filter(|o| o.profit >= min_profit)
            .filter(|o| platforms.contains(o.platform1) && platforms.contains(o.platform2))
            .collect()
    }

    pub fn stats(opportunities: &[&ArbitrageOpportunity]) -> ArbitrageStats {
        let count = opportunities.len();
        let average_profit = if count == 0 {
            0.0
        } else {
            opportunities.iter().map(|o| o.profit).sum::<f64>() / count as f64
        };

        ArbitrageStats {
            count,
            average_profit,
            total_capital: opportunities.iter().map(|o| o.capital).sum(),
            total_net_return: opportunities.iter().map(|o| o.net_return()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    fn scanner() -> ArbitrageScanner {
        ArbitrageScanner::new(fixtures::arbitrage_opportunities(Utc::now()))
    }

    #[test]
    fn test_filter_by_min_profit() {
        let scanner = scanner();
        let all = PlatformSelection::default();

        assert_eq!(scanner.filter(0.0, &all).len(), 6);
        let ids: Vec<u32> = scanner.filter(5.0, &all).iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 5, 6]);
        assert!(scanner.filter(10.0, &all).is_empty());
    }

    #[test]
    fn test_filter_requires_both_platforms() {
        let scanner = scanner();
        let no_predictit = PlatformSelection {
            predictit: false,
            ..PlatformSelection::default()
        };

        let ids: Vec<u32> = scanner.filter(0.0, &no_predictit).iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn test_net_return_and_stats() {
        let scanner = scanner();
        let first = &scanner.opportunities()[0];
        assert_eq!(first.net_return(), 83.0);
        assert_eq!(first.spread(), 6.0);

        let picked = scanner.filter(8.0, &PlatformSelection::default());
        let stats = ArbitrageScanner::stats(&picked);
        assert_eq!(stats.count, 2);
        assert!((stats.average_profit - 8.85).abs() < 1e-9);
        assert_eq!(stats.total_capital, 1500.0);
        assert_eq!(stats.total_net_return, 130.0);
    }

    #[test]
    fn test_stats_of_nothing() {
        let stats = ArbitrageScanner::stats(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.average_profit, 0.0);
    }
}
