use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::data::types::time_ago;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    OddsMovement,
    VolumeSpike,
    Arbitrage,
    NewMarket,
    PriceTarget,
}

impl AlertKind {
    /// Kinds offered when creating an alert
    pub const CREATABLE: [AlertKind; 4] = [
        AlertKind::OddsMovement,
        AlertKind::VolumeSpike,
        AlertKind::Arbitrage,
        AlertKind::NewMarket,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::OddsMovement => "Odds Movement",
            AlertKind::VolumeSpike => "Volume Spike",
            AlertKind::Arbitrage => "Arbitrage Opportunity",
            AlertKind::NewMarket => "New Market",
            AlertKind::PriceTarget => "Price Target",
        }
    }

    /// Short form value used by the create form
    pub fn value(&self) -> &'static str {
        match self {
            AlertKind::OddsMovement => "odds",
            AlertKind::VolumeSpike => "volume",
            AlertKind::Arbitrage => "arbitrage",
            AlertKind::NewMarket => "new",
            AlertKind::PriceTarget => "price",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AlertKind {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            AlertKind::OddsMovement,
            AlertKind::VolumeSpike,
            AlertKind::Arbitrage,
            AlertKind::NewMarket,
            AlertKind::PriceTarget,
        ]
        .into_iter()
        .find(|k| k.value() == s || k.label().eq_ignore_ascii_case(s))
        .ok_or_else(|| AlertError::UnknownKind(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannel {
    Email,
    Push,
}

/// Feed entry on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentAlert {
    pub id: String,
    pub kind: AlertKind,
    pub market: String,
    pub description: String,
    pub raised_at: DateTime<Utc>,
}

impl RecentAlert {
    pub fn time_label(&self, now: DateTime<Utc>) -> String {
        time_ago(self.raised_at, now)
    }
}

/// Alert rule configured by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAlert {
    pub id: u32,
    pub name: String,
    pub kind: AlertKind,
    pub market: String,
    pub condition: String,
    pub delivery: Vec<DeliveryChannel>,
    pub active: bool,
    pub last_triggered: Option<DateTime<Utc>>,
    pub trigger_count: u32,
}

impl UserAlert {
    pub fn last_triggered_label(&self, now: DateTime<Utc>) -> String {
        match self.last_triggered {
            Some(at) => time_ago(at, now),
            None => "Never".to_string(),
        }
    }
}

/// Input of the create-alert form
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub name: String,
    pub kind: AlertKind,
    pub market: String,
    /// Percentage threshold, 1-100
    pub threshold: f64,
}

impl AlertDraft {
    fn condition(&self) -> String {
        let t = self.threshold;
        match self.kind {
            AlertKind::OddsMovement => format!("When odds change by >{}% either direction", t),
            AlertKind::VolumeSpike => format!("When volume increases by >{}% in 1 hour", t),
            AlertKind::Arbitrage => format!("When an arbitrage spread exceeds {}%", t),
            AlertKind::NewMarket => format!("When a new market matching '{}' is created", self.market),
            AlertKind::PriceTarget => format!("When YES odds reach {}%", t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStats {
    pub total: usize,
    pub active: usize,
    pub triggered_today: usize,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AlertError {
    #[error("Alert name is required")]
    EmptyName,

    #[error("Alert market is required")]
    EmptyMarket,

    #[error("Threshold must be between 1 and 100: {0}")]
    InvalidThreshold(f64),

    #[error("Unknown alert type: {0}")]
    UnknownKind(String),
}

/// In-memory alert list backing the alerts page. Not persisted.
#[derive(Debug, Clone, Default)]
pub struct AlertBook {
    alerts: Vec<UserAlert>,
}

impl AlertBook {
    pub fn new(alerts: Vec<UserAlert>) -> Self {
        Self { alerts }
    }

    pub fn alerts(&self) -> &[UserAlert] {
        &self.alerts
    }

    pub fn get(&self, id: u32) -> Option<&UserAlert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    /// Flip the active flag; returns the new state, or None for an unknown id
    pub fn toggle(&mut self, id: u32) -> Option<bool> {
        let alert = self.alerts.iter_mut().find(|a| a.id == id)?;
        alert.active = !alert.active;
        info!("Alert {} {}", id, if alert.active { "enabled" } else { "paused" });
        Some(alert.active)
    }

    pub fn delete(&mut self, id: u32) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|a| a.id != id);
        self.alerts.len() != before
    }

    pub fn create(&mut self, draft: AlertDraft) -> Result<&UserAlert, AlertError> {
        if draft.name.trim().is_empty() {
            return Err(AlertError::EmptyName);
        }
        if draft.market.trim().is_empty() {
            return Err(AlertError::EmptyMarket);
        }
        if !(1.0..=100.0).contains(&draft.threshold) {
            return Err(AlertError::InvalidThreshold(draft.threshold));
        }

        let id = self.alerts.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let alert = UserAlert {
            id,
            condition: draft.condition(),
            name: draft.name.trim().to_string(),
            kind: draft.kind,
            market: draft.market.trim().to_string(),
            delivery: vec![DeliveryChannel::Email],
            active: true,
            last_triggered: None,
            trigger_count: 0,
        };
        info!("Created alert {}: {}", id, alert.name);

        self.alerts.push(alert);
        Ok(&self.alerts[self.alerts.len() - 1])
    }

    pub fn stats(&self, now: DateTime<Utc>) -> AlertStats {
        let day_ago = now - Duration::hours(24);
        AlertStats {
            total: self.alerts.len(),
            active: self.alerts.iter().filter(|a| a.active).count(),
            triggered_today: self
                .alerts
                .iter()
                .filter(|a| a.last_triggered.map_or(false, |t| t > day_ago))
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    fn book() -> (AlertBook, DateTime<Utc>) {
        let now = Utc::now();
        (AlertBook::new(fixtures::user_alerts(now)), now)
    }

    fn draft(kind: AlertKind, threshold: f64) -> AlertDraft {
        AlertDraft {
            name: "BTC swing".to_string(),
            kind,
            market: "Bitcoin to reach $150k".to_string(),
            threshold,
        }
    }

    #[test]
    fn test_toggle_flips_active() {
        let (mut book, _) = book();
        assert_eq!(book.toggle(3), Some(true));
        assert_eq!(book.toggle(3), Some(false));
        assert_eq!(book.toggle(99), None);
    }

    #[test]
    fn test_delete_removes_once() {
        let (mut book, _) = book();
        assert!(book.delete(2));
        assert!(!book.delete(2));
        assert_eq!(book.alerts().len(), 4);
        assert!(book.get(2).is_none());
    }

    #[test]
    fn test_create_assigns_next_id() {
        let (mut book, _) = book();
        book.delete(5);

        let created = book.create(draft(AlertKind::OddsMovement, 10.0)).unwrap();
        assert_eq!(created.id, 5);
        assert!(created.active);
        assert_eq!(created.trigger_count, 0);
        assert_eq!(created.condition, "When odds change by >10% either direction");
    }

    #[test]
    fn test_create_validates_draft() {
        let (mut book, _) = book();
        let mut bad = draft(AlertKind::VolumeSpike, 10.0);
        bad.name = "  ".to_string();
        assert_eq!(book.create(bad).unwrap_err(), AlertError::EmptyName);
        assert_eq!(
            book.create(draft(AlertKind::VolumeSpike, 0.0)).unwrap_err(),
            AlertError::InvalidThreshold(0.0)
        );
    }

    #[test]
    fn test_stats() {
        let (mut book, now) = book();
        let stats = book.stats(now);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.active, 4);
        // 2h, 3h and 6h ago; 1 day and 5 days fall outside
        assert_eq!(stats.triggered_today, 3);

        book.toggle(1);
        assert_eq!(book.stats(now).active, 3);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("odds".parse::<AlertKind>().unwrap(), AlertKind::OddsMovement);
        assert_eq!("Volume Spike".parse::<AlertKind>().unwrap(), AlertKind::VolumeSpike);
        assert!("weather".parse::<AlertKind>().is_err());
    }
}
