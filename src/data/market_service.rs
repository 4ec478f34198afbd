use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::data::cache::{QueryCache, QueryKind, StaleTimes};
use crate::data::fixtures;
use crate::data::types::Market;
use crate::feed::process::round_to;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_SEARCH_RESULTS: usize = 20;
const MIN_QUERY_LEN: usize = 2;

const MARKETS_DELAY_MS: Range<u64> = 300..500;
const MARKET_DELAY_MS: Range<u64> = 200..350;
const SEARCH_DELAY_MS: Range<u64> = 150..250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchParams {
    pub limit: usize,
    pub offset: usize,
    /// Keep only markets with this active flag
    pub active: Option<bool>,
}

impl Default for FetchParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            active: None,
        }
    }
}

impl FetchParams {
    /// A zero limit means the default page
    fn page_size(&self) -> usize {
        if self.limit == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.limit
        }
    }

    fn cache_key(&self) -> String {
        format!("markets:{}:{}:{:?}", self.page_size(), self.offset, self.active)
    }
}

/// Mock market API over the fixture list.
///
/// Every uncached call sleeps for a short randomized delay and nudges odds
/// slightly so repeated fetches look live. The calls never fail; the
/// `Result` is where a real HTTP client would report errors.
pub struct MockMarketService {
    markets: Vec<Market>,
    config: ServiceConfig,
    rng: Mutex<StdRng>,
    list_cache: QueryCache<Vec<Market>>,
    market_cache: QueryCache<Option<Market>>,
}

impl MockMarketService {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_markets(fixtures::markets(), config, StdRng::from_entropy())
    }

    pub fn with_markets(markets: Vec<Market>, config: ServiceConfig, rng: StdRng) -> Self {
        let stale_times = StaleTimes::from(&config);
        Self {
            markets,
            config,
            rng: Mutex::new(rng),
            list_cache: QueryCache::new(stale_times),
            market_cache: QueryCache::new(stale_times),
        }
    }

    pub async fn fetch_markets(&self, params: FetchParams) -> Result<Vec<Market>> {
        let key = params.cache_key();
        if let Some(cached) = self.list_cache.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(cached);
        }

        self.simulate_delay(MARKETS_DELAY_MS).await;

        let markets: Vec<Market> = {
            let mut rng = self.lock_rng();
            self.markets
                .iter()
                .filter(|m| params.active.map_or(true, |active| m.active == active))
                .skip(params.offset)
                .take(params.page_size())
                .map(|m| add_variation(m, &mut *rng))
                .collect()
        };

        debug!("Fetched {} markets", markets.len());
        self.list_cache.insert(key, markets.clone(), QueryKind::Markets);
        Ok(markets)
    }

    pub async fn fetch_market_by_id(&self, id: &str) -> Result<Option<Market>> {
        let key = format!("market:{}", id);
        if let Some(cached) = self.market_cache.get(&key) {
            return Ok(cached);
        }

        self.simulate_delay(MARKET_DELAY_MS).await;

        let market = self
            .markets
            .iter()
            .find(|m| m.id == id)
            .map(|m| add_variation(m, &mut *self.lock_rng()));

        if market.is_none() {
            debug!("Market {} not found", id);
        }
        self.market_cache.insert(key, market.clone(), QueryKind::Market);
        Ok(market)
    }

    /// Case-insensitive search over name, category and description
    pub async fn search_markets(&self, query: &str) -> Result<Vec<Market>> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        let query_lower = query.to_lowercase();
        let key = format!("search:{}", query_lower);
        if let Some(cached) = self.list_cache.get(&key) {
            return Ok(cached);
        }

        self.simulate_delay(SEARCH_DELAY_MS).await;

        let results: Vec<Market> = {
            let mut rng = self.lock_rng();
            self.markets
                .iter()
                .filter(|m| m.matches(&query_lower))
                .take(MAX_SEARCH_RESULTS)
                .map(|m| add_variation(m, &mut *rng))
                .collect()
        };

        debug!("Search '{}' matched {} markets", query, results.len());
        self.list_cache.insert(key, results.clone(), QueryKind::Search);
        Ok(results)
    }

    /// Drop every cached query, forcing the next calls to refetch
    pub fn invalidate(&self) {
        self.list_cache.clear();
        self.market_cache.clear();
    }

    async fn simulate_delay(&self, range: Range<u64>) {
        if !self.config.simulate_latency {
            return;
        }
        let ms = self.lock_rng().gen_range(range);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    fn lock_rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Small random nudge applied to every fetched market
pub fn add_variation<R: Rng + ?Sized>(market: &Market, rng: &mut R) -> Market {
    let yes = (market.yes_odds + rng.gen_range(-1.0..1.0_f64).round()).clamp(1.0, 99.0);
    let change = round_to(market.change_24h + rng.gen_range(-0.25..0.25), 1);

    Market {
        yes_odds: yes,
        no_odds: 100.0 - yes,
        change_24h: change,
        ..market.clone()
    }
}
