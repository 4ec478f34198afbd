use chrono::Utc;
use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::{BatchFeedConfig, FeedConfig};
use crate::data::types::Market;
use crate::feed::handle::{sleep_or_shutdown, FeedHandle};
use crate::feed::process::{round_to, MarketState, ProcessParams, DEFAULT_VOLUME};
use crate::feed::types::{InitialVolume, MarketUpdate, VolatilityInfo};

const UPDATE_CHANNEL_CAPACITY: usize = 1024;

/// Simulated live feed over many markets.
///
/// Cheap to clone; clones share state, snapshots and subscribers.
#[derive(Clone)]
pub struct MarketFeed {
    core: Arc<FeedCore>,
}

struct FeedCore {
    config: BatchFeedConfig,
    enabled: bool,
    params: ProcessParams,
    states: DashMap<String, MarketState>,
    latest: DashMap<String, MarketUpdate>,
    rng: Mutex<StdRng>,
    connected: Arc<AtomicBool>,
    updates_tx: broadcast::Sender<MarketUpdate>,
}

impl MarketFeed {
    pub fn new(config: &FeedConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config.batch.clone(), config.enabled, rng)
    }

    pub fn with_rng(config: BatchFeedConfig, enabled: bool, rng: StdRng) -> Self {
        let (updates_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            core: Arc::new(FeedCore {
                config,
                enabled,
                params: ProcessParams::BATCH,
                states: DashMap::new(),
                latest: DashMap::new(),
                rng: Mutex::new(rng),
                connected: Arc::new(AtomicBool::new(false)),
                updates_tx,
            }),
        }
    }

    /// Start tracking a market. Already-tracked ids keep their state.
    ///
    /// Returns true when the market was newly added.
    pub fn initialize_market(
        &self,
        market_id: &str,
        initial_odds: f64,
        initial_volume: impl Into<InitialVolume>,
    ) -> bool {
        if self.core.states.contains_key(market_id) {
            return false;
        }

        let volume = resolve_volume(&initial_volume.into());
        let state = MarketState::seeded(initial_odds, volume, &mut *self.core.lock_rng());

        let mut inserted = false;
        self.core
            .states
            .entry(market_id.to_string())
            .or_insert_with(|| {
                inserted = true;
                state
            });

        if inserted {
            debug!("Tracking market {} at {:.1}", market_id, initial_odds);
        }
        inserted
    }

    /// Track every market in `markets` from its listed odds and 24h volume
    pub fn initialize_markets(&self, markets: &[Market]) -> usize {
        markets
            .iter()
            .filter(|m| self.initialize_market(&m.id, m.yes_odds, m.volume_24h.as_str()))
            .count()
    }

    pub fn is_tracked(&self, market_id: &str) -> bool {
        self.core.states.contains_key(market_id)
    }

    pub fn tracked_count(&self) -> usize {
        self.core.states.len()
    }

    /// Advance one market by one tick and record the result as its latest update
    pub fn generate_update(&self, market_id: &str) -> MarketUpdate {
        self.core.generate_update(market_id)
    }

    /// Update a random share of `market_ids`, publishing each update
    pub fn tick(&self, market_ids: &[String]) -> Vec<MarketUpdate> {
        self.core.tick(market_ids)
    }

    /// Begin the tick loop over `market_ids`.
    ///
    /// A disabled feed or an empty id list yields an idle handle and leaves
    /// the feed disconnected.
    pub fn start(&self, market_ids: Vec<String>) -> FeedHandle {
        if !self.core.enabled || market_ids.is_empty() {
            self.core.connected.store(false, Ordering::SeqCst);
            return FeedHandle::idle();
        }

        let core = self.core.clone();
        FeedHandle::spawn(Some(self.core.connected.clone()), move |mut shutdown| async move {
            if !sleep_or_shutdown(core.config.connect_delay(), &mut shutdown).await {
                return;
            }
            core.connected.store(true, Ordering::SeqCst);
            info!("Market feed connected ({} markets)", market_ids.len());

            loop {
                core.tick(&market_ids);
                let delay = core.next_interval();
                if !sleep_or_shutdown(delay, &mut shutdown).await {
                    break;
                }
            }

            core.connected.store(false, Ordering::SeqCst);
            info!("Market feed disconnected");
        })
    }

    /// Tear down `handle` and start again over a new id set
    pub async fn restart(&self, handle: FeedHandle, market_ids: Vec<String>) -> FeedHandle {
        handle.shutdown().await;
        self.start(market_ids)
    }

    pub fn is_connected(&self) -> bool {
        self.core.connected.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MarketUpdate> {
        self.core.updates_tx.subscribe()
    }

    pub fn market_update(&self, market_id: &str) -> Option<MarketUpdate> {
        self.core.latest.get(market_id).map(|u| u.clone())
    }

    /// Copy of every latest update
    pub fn updates(&self) -> HashMap<String, MarketUpdate> {
        self.core
            .latest
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Overlay the latest odds onto `markets`
    pub fn apply_updates_to_markets(&self, markets: &[Market]) -> Vec<Market> {
        markets
            .iter()
            .map(|market| match self.core.latest.get(&market.id) {
                Some(update) => Market {
                    yes_odds: update.yes_odds,
                    no_odds: update.no_odds,
                    ..market.clone()
                },
                None => market.clone(),
            })
            .collect()
    }

    pub fn volatility(&self, market_id: &str) -> Option<VolatilityInfo> {
        self.core.latest.get(market_id).map(|u| VolatilityInfo::from(&*u))
    }

    #[cfg(test)]
    pub(crate) fn state(&self, market_id: &str) -> Option<MarketState> {
        self.core.states.get(market_id).map(|s| s.clone())
    }
}

impl FeedCore {
    fn lock_rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn generate_update(&self, market_id: &str) -> MarketUpdate {
        // Step in place under the entry lock; lock order is entry, then rng
        let step = self
            .states
            .entry(market_id.to_string())
            .or_default()
            .step(&self.params, &mut *self.lock_rng());

        let update = MarketUpdate {
            market_id: market_id.to_string(),
            yes_odds: step.yes_odds,
            no_odds: step.no_odds,
            volume_24h: step.volume_24h,
            timestamp: Utc::now(),
            volatility: step.volatility,
            momentum: step.momentum,
            price_change: round_to(step.price_change, 2),
        };
        self.latest.insert(market_id.to_string(), update.clone());
        update
    }

    fn tick(&self, market_ids: &[String]) -> Vec<MarketUpdate> {
        let selected = self.select_active(market_ids);
        let updates: Vec<MarketUpdate> = selected
            .iter()
            .map(|id| self.generate_update(id))
            .collect();

        for update in &updates {
            // no subscribers is fine; snapshots are still readable
            let _ = self.updates_tx.send(update.clone());
        }
        debug!("Tick updated {}/{} markets", updates.len(), market_ids.len());
        updates
    }

    /// Shuffled subset covering a random share of the ids, never empty
    fn select_active(&self, market_ids: &[String]) -> Vec<String> {
        if market_ids.is_empty() {
            return Vec::new();
        }

        let mut rng = self.lock_rng();
        let span = self.config.max_activity - self.config.min_activity;
        let activity = self.config.min_activity + rng.gen::<f64>() * span;
        let count = ((market_ids.len() as f64 * activity).floor() as usize)
            .clamp(1, market_ids.len());

        let mut shuffled = market_ids.to_vec();
        shuffled.shuffle(&mut *rng);
        shuffled.truncate(count);
        shuffled
    }

    fn next_interval(&self) -> Duration {
        let span = self.config.max_interval_ms.saturating_sub(self.config.min_interval_ms) as f64;
        let ms = self.config.min_interval_ms as f64 + self.lock_rng().gen::<f64>() * span;
        Duration::from_millis(ms as u64)
    }
}

fn resolve_volume(volume: &InitialVolume) -> f64 {
    let amount = match volume {
        InitialVolume::Amount(amount) => *amount,
        InitialVolume::Display(display) => parse_display_volume(display).unwrap_or(0.0),
    };
    if amount > 0.0 && amount.is_finite() {
        amount
    } else {
        DEFAULT_VOLUME
    }
}

/// `"$892K"` -> 892000. Suffixes are ignored; every display value is read
/// as thousands.
fn parse_display_volume(display: &str) -> Option<f64> {
    let re = Regex::new(r"[^0-9.]").ok()?;
    let digits = re.replace_all(display, "");
    digits.parse::<f64>().ok().map(|v| v * 1000.0)
}
