use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: MarketCategory,
    pub yes_odds: f64,
    pub no_odds: f64,
    pub change_24h: f64,
    pub volume: String,
    pub volume_24h: String,
    pub liquidity: String,
    pub end_date: NaiveDate,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub slug: String,
}

impl Market {
    /// Case-insensitive match on name, category, or description
    pub fn matches(&self, query_lower: &str) -> bool {
        self.name.to_lowercase().contains(query_lower)
            || self.category.as_str().to_lowercase().contains(query_lower)
            || self.description.to_lowercase().contains(query_lower)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketCategory {
    Politics,
    Crypto,
    Sports,
    Economics,
    Tech,
    Entertainment,
    General,
}

impl MarketCategory {
    pub const ALL: [MarketCategory; 7] = [
        MarketCategory::Politics,
        MarketCategory::Crypto,
        MarketCategory::Sports,
        MarketCategory::Economics,
        MarketCategory::Tech,
        MarketCategory::Entertainment,
        MarketCategory::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketCategory::Politics => "Politics",
            MarketCategory::Crypto => "Crypto",
            MarketCategory::Sports => "Sports",
            MarketCategory::Economics => "Economics",
            MarketCategory::Tech => "Tech",
            MarketCategory::Entertainment => "Entertainment",
            MarketCategory::General => "General",
        }
    }
}

impl fmt::Display for MarketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarketCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("Unknown market category: {}", s))
    }
}

/// Category filter used by market browsing: `All` or one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(MarketCategory),
}

impl CategoryFilter {
    pub fn accepts(&self, market: &Market) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => market.category == *category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Yes,
    No,
}

/// Relative label such as `"3 min ago"` or `"1 hour 20 min ago"`
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes().max(0);
    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("{} {}", n, unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };

    match minutes {
        0 => "just now".to_string(),
        1..=59 => format!("{} min ago", minutes),
        60..=1439 => {
            let (hours, rest) = (minutes / 60, minutes % 60);
            if rest == 0 {
                format!("{} ago", plural(hours, "hour"))
            } else {
                format!("{} {} min ago", plural(hours, "hour"), rest)
            }
        }
        _ => format!("{} ago", plural(minutes / 1440, "day")),
    }
}

/// Ticker entry shown on the landing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub text: String,
    pub probability: u8,
    pub change: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickStat {
    pub label: String,
    pub value: String,
    pub change: Option<String>,
    #[serde(default)]
    pub positive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_through_str() {
        assert_eq!("crypto".parse::<MarketCategory>().unwrap(), MarketCategory::Crypto);
        assert_eq!(MarketCategory::Entertainment.to_string(), "Entertainment");
        assert!("Weather".parse::<MarketCategory>().is_err());
    }

    #[test]
    fn test_time_ago() {
        let now = Utc::now();
        assert_eq!(time_ago(now, now), "just now");
        assert_eq!(time_ago(now - chrono::Duration::minutes(3), now), "3 min ago");
        assert_eq!(time_ago(now - chrono::Duration::hours(1), now), "1 hour ago");
        assert_eq!(time_ago(now - chrono::Duration::minutes(80), now), "1 hour 20 min ago");
        assert_eq!(time_ago(now - chrono::Duration::hours(12), now), "12 hours ago");
        assert_eq!(time_ago(now - chrono::Duration::days(5), now), "5 days ago");
        // future timestamps read as now
        assert_eq!(time_ago(now + chrono::Duration::hours(1), now), "just now");
    }

    #[test]
    fn test_category_filter() {
        assert_eq!("All".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "tech".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(MarketCategory::Tech)
        );
    }
}
