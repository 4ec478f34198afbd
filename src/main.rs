use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use polypro::alerts::AlertBook;
use polypro::arbitrage::{ArbitrageScanner, PlatformSelection};
use polypro::config::{Config, EnvConfig, FeedConfig};
use polypro::data::{fixtures, FetchParams, Market, MockMarketService};
use polypro::feed::{FeedHandle, MarketFeed, SingleMarketFeed, SingleMarketSnapshot};
use polypro::monitoring::UpdateRecorder;
use polypro::portfolio::Portfolio;
use polypro::storage::{Access, AuthGuard, FeatureAccess, LocalStorage, SessionStore, Watchlist};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("🚀 PolyPro starting...");

    // Load configuration
    let env_config = EnvConfig::load()?;
    let mut config = Config::load_or_default(&env_config.config_path)?;
    config.apply_env(&env_config);

    info!("Storage dir: {}", config.system.storage_dir);
    info!("Feed enabled: {}", config.feed.enabled);
    if let Some(seed) = config.feed.seed {
        info!("Deterministic feed, seed {}", seed);
    }

    // Restore session and watchlist
    let storage = LocalStorage::open(&config.system.storage_dir).context("Failed to open local storage")?;
    let session = SessionStore::new(storage.clone());
    let user = session.current_user();
    match &user {
        Some(user) => info!("Signed in as {} ({:?})", user.name, user.tier),
        None => info!("No session, browsing as guest"),
    }

    let guard = AuthGuard::new(session.clone(), config.system.login_path.clone());
    if let Access::Redirect(to) = guard.check("/portfolio", true)? {
        info!("Portfolio is protected, login at {}", to);
    }

    let watchlist = Watchlist::new(storage.clone());
    let watched = watchlist.load();
    info!("Watchlist: {} markets", watched.len());

    log_dashboard(FeatureAccess::has_arbitrage(user.as_ref()));

    // Fetch markets and seed the feed
    let service = MockMarketService::new(config.service.clone());
    let markets = service.fetch_markets(FetchParams::default()).await?;
    info!("Fetched {} markets", markets.len());

    let feed = MarketFeed::new(&config.feed);
    feed.initialize_markets(&markets);
    for id in watched.iter().filter(|id| !feed.is_tracked(id)) {
        match service.fetch_market_by_id(id).await? {
            Some(market) => {
                feed.initialize_market(&market.id, market.yes_odds, market.volume_24h.as_str());
            }
            None => warn!("Watched market {} no longer exists", id),
        }
    }

    let tracked = tracked_ids(&watched, &markets, &feed, config.feed.track_all_when_empty);
    let mut handle = feed.start(tracked.clone());

    let mut focused = tracked
        .first()
        .map(|id| FocusedFeed::start(id, &feed, &markets, &config.feed));
    let mut snapshots = focused.as_ref().map(|f| f.feed.subscribe());

    let recorder = if config.monitoring.csv_logging {
        let recorder = UpdateRecorder::new(&config.monitoring.csv_log_path)?;
        recorder.record_event("feed started")?;
        info!("Recording updates to {}", recorder.path().display());
        Some(recorder)
    } else {
        None
    };

    #[cfg(feature = "metrics")]
    let metrics = polypro::monitoring::FeedMetrics::new()?;
    #[cfg(feature = "metrics")]
    metrics.set_tracked(tracked.len());

    let mut portfolio = Portfolio::new(fixtures::positions());
    let mut updates = feed.subscribe();
    let mut watchlist_sync = watchlist.sync();

    info!("✅ PolyPro running, Ctrl-C to stop");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                break;
            }
            received = updates.recv() => match received {
                Ok(update) => {
                    debug!(
                        "{} yes={:.2} no={:.2} change={:+.2} {} {}",
                        update.market_id,
                        update.yes_odds,
                        update.no_odds,
                        update.price_change,
                        update.volatility,
                        update.momentum
                    );
                    if let Some(recorder) = &recorder {
                        if let Err(e) = recorder.record(&update) {
                            warn!("Failed to record update: {}", e);
                        }
                    }
                    #[cfg(feature = "metrics")]
                    metrics.observe(&update);

                    if portfolio.reprice(|id| feed.market_update(id)) > 0 {
                        debug!("Unrealized P&L ${:.2}", portfolio.summary().unrealized_pnl);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Update consumer lagged, skipped {} updates", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            Some(snapshot) = next_snapshot(&mut snapshots) => {
                if let Some(odds) = snapshot.current_odds {
                    info!(
                        "[{}] {:.2}/{:.2} {} {}",
                        snapshot.market_id, odds.yes, odds.no, snapshot.volatility, snapshot.momentum
                    );
                }
            }
            Some(ids) = watchlist_sync.changed() => {
                info!("Watchlist changed, restarting feed over {} markets", ids.len());
                let tracked = tracked_ids(&ids, &markets, &feed, config.feed.track_all_when_empty);
                #[cfg(feature = "metrics")]
                metrics.set_tracked(tracked.len());

                match refocus(focused.as_ref().map(|f| f.feed.market_id()), &tracked) {
                    Focus::Keep => {}
                    Focus::Switch(id) => {
                        if let Some(previous) = focused.take() {
                            previous.shutdown().await;
                        }
                        info!("Single-market feed now follows {}", id);
                        let next = FocusedFeed::start(&id, &feed, &markets, &config.feed);
                        snapshots = Some(next.feed.subscribe());
                        focused = Some(next);
                    }
                    Focus::Stop => {
                        if let Some(previous) = focused.take() {
                            previous.shutdown().await;
                        }
                        snapshots = None;
                    }
                }

                handle = feed.restart(handle, tracked).await;
            }
        }
    }

    info!("Shutting down...");
    handle.shutdown().await;
    if let Some(focused) = focused {
        focused.shutdown().await;
    }

    if let Some(recorder) = &recorder {
        recorder.record_event("feed stopped")?;
    }
    #[cfg(feature = "metrics")]
    debug!("Final metrics:\n{}", metrics.render()?);

    let summary = portfolio.summary();
    info!(
        "Portfolio: {} positions, value ${:.2}, unrealized ${:.2}",
        summary.positions, summary.total_value, summary.unrealized_pnl
    );

    Ok(())
}

/// Single-market feed following the first tracked market
struct FocusedFeed {
    feed: SingleMarketFeed,
    handle: Option<FeedHandle>,
}

impl FocusedFeed {
    fn start(market_id: &str, feed: &MarketFeed, markets: &[Market], config: &FeedConfig) -> Self {
        let odds = feed
            .market_update(market_id)
            .map(|u| u.yes_odds)
            .or_else(|| markets.iter().find(|m| m.id == market_id).map(|m| m.yes_odds));

        let single = SingleMarketFeed::new(market_id, odds, config);
        let handle = config.enabled.then(|| single.start(odds));
        Self { feed: single, handle }
    }

    async fn shutdown(self) {
        if let Some(handle) = self.handle {
            handle.shutdown().await;
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Focus {
    Keep,
    Switch(String),
    Stop,
}

/// What the single-market feed should do once the tracked set changes
fn refocus(current: Option<&str>, tracked: &[String]) -> Focus {
    match (current, tracked.first()) {
        (Some(current), Some(first)) if current == first => Focus::Keep,
        (_, Some(first)) => Focus::Switch(first.clone()),
        (Some(_), None) => Focus::Stop,
        (None, None) => Focus::Keep,
    }
}

/// Watched markets the feed knows, or every fetched market when allowed
fn tracked_ids(watched: &[String], markets: &[Market], feed: &MarketFeed, track_all_when_empty: bool) -> Vec<String> {
    if !watched.is_empty() {
        return watched.iter().filter(|id| feed.is_tracked(id)).cloned().collect();
    }
    if track_all_when_empty {
        markets.iter().map(|m| m.id.clone()).collect()
    } else {
        Vec::new()
    }
}

async fn next_snapshot(rx: &mut Option<watch::Receiver<SingleMarketSnapshot>>) -> Option<SingleMarketSnapshot> {
    match rx {
        Some(rx) => {
            rx.changed().await.ok()?;
            let snapshot = rx.borrow_and_update().clone();
            Some(snapshot)
        }
        None => std::future::pending().await,
    }
}

fn log_dashboard(arbitrage_unlocked: bool) {
    let now = Utc::now();

    let alerts = AlertBook::new(fixtures::user_alerts(now));
    let stats = alerts.stats(now);
    info!(
        "Alerts: {} total, {} active, {} triggered today",
        stats.total, stats.active, stats.triggered_today
    );
    for alert in fixtures::recent_alerts(now).iter().take(3) {
        info!("  {} · {} ({})", alert.kind, alert.market, alert.time_label(now));
    }

    if arbitrage_unlocked {
        let scanner = ArbitrageScanner::new(fixtures::arbitrage_opportunities(now));
        let picked = scanner.filter(0.0, &PlatformSelection::default());
        let stats = ArbitrageScanner::stats(&picked);
        info!(
            "Arbitrage: {} opportunities, avg profit {:.1}%, capital ${:.0}",
            stats.count, stats.average_profit, stats.total_capital
        );
    } else {
        info!("Arbitrage scanner requires a Pro plan");
    }
}
