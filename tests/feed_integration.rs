use std::collections::HashSet;
use std::time::Duration;

use polypro::config::{BatchFeedConfig, ServiceConfig};
use polypro::data::{fixtures, FetchParams, MockMarketService};
use polypro::feed::MarketFeed;
use polypro::portfolio::Portfolio;
use polypro::storage::{LocalStorage, Watchlist};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;
use tokio::time::{timeout, Instant};

fn quiet_service(seed: u64) -> MockMarketService {
    let config = ServiceConfig {
        simulate_latency: false,
        ..ServiceConfig::default()
    };
    MockMarketService::with_markets(fixtures::markets(), config, StdRng::seed_from_u64(seed))
}

#[tokio::test(start_paused = true)]
async fn test_watchlist_drives_feed() {
    let dir = TempDir::new().unwrap();
    let watchlist = Watchlist::new(LocalStorage::open(dir.path()).unwrap());
    watchlist.toggle("1").unwrap();
    watchlist.toggle("4").unwrap();

    let service = quiet_service(11);
    let markets = service.fetch_markets(FetchParams::default()).await.unwrap();

    let feed = MarketFeed::with_rng(BatchFeedConfig::default(), true, StdRng::seed_from_u64(11));
    assert_eq!(feed.initialize_markets(&markets), 20);

    let mut updates = feed.subscribe();
    let handle = feed.start(watchlist.load());
    let started = Instant::now();

    let mut seen = HashSet::new();
    while seen.len() < 2 {
        let update = timeout(Duration::from_secs(60), updates.recv())
            .await
            .expect("feed went quiet")
            .unwrap();

        assert!(update.market_id == "1" || update.market_id == "4");
        assert!((8.0..=92.0).contains(&update.yes_odds));
        assert!((update.yes_odds + update.no_odds - 100.0).abs() < 1e-9);
        seen.insert(update.market_id);
    }

    // nothing arrives before the connect delay
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(feed.is_connected());

    handle.shutdown().await;
    assert!(!feed.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_feed_survives_restart_over_new_ids() {
    let service = quiet_service(5);
    let markets = service.fetch_markets(FetchParams::default()).await.unwrap();
    let feed = MarketFeed::with_rng(BatchFeedConfig::default(), true, StdRng::seed_from_u64(5));
    feed.initialize_markets(&markets);

    let handle = feed.start(vec!["2".to_string()]);
    tokio::time::sleep(Duration::from_secs(10)).await;
    let before = feed.market_update("2").expect("market 2 ticked");

    let mut updates = feed.subscribe();
    let handle = feed.restart(handle, vec!["9".to_string()]).await;
    let next = timeout(Duration::from_secs(60), updates.recv()).await.unwrap().unwrap();
    assert_eq!(next.market_id, "9");

    // market 2 keeps its last snapshot but no longer moves
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(feed.market_update("2"), Some(before));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_portfolio_marks_to_feed() {
    let service = quiet_service(3);
    let markets = service.fetch_markets(FetchParams::default()).await.unwrap();
    let feed = MarketFeed::with_rng(BatchFeedConfig::default(), true, StdRng::seed_from_u64(3));
    feed.initialize_markets(&markets);

    let linked = vec!["1".to_string(), "2".to_string(), "4".to_string(), "10".to_string()];
    for id in &linked {
        feed.generate_update(id);
    }

    let mut portfolio = Portfolio::new(fixtures::positions());
    assert_eq!(portfolio.reprice(|id| feed.market_update(id)), 4);

    for position in portfolio.positions() {
        let Some(id) = &position.market_id else { continue };
        let update = feed.market_update(id).unwrap();
        let odds = match position.side {
            polypro::data::Side::Yes => update.yes_odds,
            polypro::data::Side::No => update.no_odds,
        };
        assert!((position.current_price - odds / 100.0).abs() < 1e-9);
    }
}
