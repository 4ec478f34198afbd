use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::feed::types::MarketUpdate;

/// Prometheus view of the simulated feed
pub struct FeedMetrics {
    registry: Registry,
    updates: IntCounterVec,
    price_change: Histogram,
    tracked_markets: IntGauge,
}

impl FeedMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let updates = IntCounterVec::new(
            Opts::new("polypro_feed_updates_total", "Market updates published by the feed"),
            &["volatility"],
        )?;
        let price_change = Histogram::with_opts(
            HistogramOpts::new("polypro_feed_price_change", "Absolute odds change per update")
                .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.0, 4.0]),
        )?;
        let tracked_markets = IntGauge::new("polypro_feed_tracked_markets", "Markets tracked by the feed")?;

        registry.register(Box::new(updates.clone()))?;
        registry.register(Box::new(price_change.clone()))?;
        registry.register(Box::new(tracked_markets.clone()))?;

        Ok(Self {
            registry,
            updates,
            price_change,
            tracked_markets,
        })
    }

    pub fn observe(&self, update: &MarketUpdate) {
        let label = update.volatility.to_string();
        self.updates.with_label_values(&[label.as_str()]).inc();
        self.price_change.observe(update.price_change.abs());
    }

    pub fn set_tracked(&self, count: usize) {
        self.tracked_markets.set(count as i64);
    }

    pub fn updates_total(&self) -> u64 {
        ["low", "medium", "high"]
            .into_iter()
            .map(|label| self.updates.with_label_values(&[label]).get())
            .sum()
    }

    /// Text exposition format
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::{Momentum, Volatility};
    use chrono::Utc;

    fn update(volatility: Volatility, change: f64) -> MarketUpdate {
        MarketUpdate {
            market_id: "1".to_string(),
            yes_odds: 50.0,
            no_odds: 50.0,
            volume_24h: 1000.0,
            timestamp: Utc::now(),
            volatility,
            momentum: Momentum::Neutral,
            price_change: change,
        }
    }

    #[test]
    fn test_counts_updates_by_label() {
        let metrics = FeedMetrics::new().unwrap();
        metrics.observe(&update(Volatility::Low, 0.1));
        metrics.observe(&update(Volatility::High, -1.5));
        metrics.observe(&update(Volatility::High, 2.0));
        metrics.set_tracked(20);

        assert_eq!(metrics.updates_total(), 3);
        let text = metrics.render().unwrap();
        assert!(text.contains("polypro_feed_updates_total{volatility=\"high\"} 2"));
        assert!(text.contains("polypro_feed_tracked_markets 20"));
    }
}
