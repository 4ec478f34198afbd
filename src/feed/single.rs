use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::{FeedConfig, SingleFeedConfig};
use crate::feed::handle::{sleep_or_shutdown, FeedHandle};
use crate::feed::process::{MarketState, ProcessParams, DEFAULT_VOLUME, EQUILIBRIUM};
use crate::feed::types::{OddsPair, SingleMarketSnapshot};

/// Simulated live feed for one market, as shown on its detail page
#[derive(Clone)]
pub struct SingleMarketFeed {
    core: Arc<SingleCore>,
}

struct SingleCore {
    market_id: String,
    config: SingleFeedConfig,
    params: ProcessParams,
    state: Mutex<MarketState>,
    rng: Mutex<StdRng>,
    snapshot_tx: watch::Sender<SingleMarketSnapshot>,
}

impl SingleMarketFeed {
    pub fn new(market_id: &str, initial_odds: Option<f64>, config: &FeedConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(market_id, initial_odds, config.single.clone(), rng)
    }

    pub fn with_rng(
        market_id: &str,
        initial_odds: Option<f64>,
        config: SingleFeedConfig,
        rng: StdRng,
    ) -> Self {
        let state = MarketState::new(initial_odds.unwrap_or(EQUILIBRIUM), DEFAULT_VOLUME);
        let (snapshot_tx, _) = watch::channel(SingleMarketSnapshot::empty(market_id));

        Self {
            core: Arc::new(SingleCore {
                market_id: market_id.to_string(),
                config,
                params: ProcessParams::SINGLE,
                state: Mutex::new(state),
                rng: Mutex::new(rng),
                snapshot_tx,
            }),
        }
    }

    pub fn market_id(&self) -> &str {
        &self.core.market_id
    }

    /// Begin ticking after the initial delay.
    ///
    /// `initial_odds` resets the current odds only; momentum and the
    /// volatility regime carry over from earlier runs.
    pub fn start(&self, initial_odds: Option<f64>) -> FeedHandle {
        if let Some(odds) = initial_odds {
            self.core.lock_state().set_odds(odds);
            self.core.snapshot_tx.send_modify(|snapshot| {
                snapshot.current_odds = Some(OddsPair { yes: odds, no: 100.0 - odds });
            });
        }

        let core = self.core.clone();
        FeedHandle::spawn(None, move |mut shutdown| async move {
            info!("Single-market feed started for {}", core.market_id);
            let mut delay = core.config.initial_delay();

            while sleep_or_shutdown(delay, &mut shutdown).await {
                core.tick();
                delay = core.next_interval();
            }
            debug!("Single-market feed stopped for {}", core.market_id);
        })
    }

    pub fn tick(&self) -> SingleMarketSnapshot {
        self.core.tick()
    }

    pub fn snapshot(&self) -> SingleMarketSnapshot {
        self.core.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SingleMarketSnapshot> {
        self.core.snapshot_tx.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> MarketState {
        self.core.lock_state().clone()
    }
}

impl SingleCore {
    fn lock_state(&self) -> MutexGuard<'_, MarketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tick(&self) -> SingleMarketSnapshot {
        let (step, recent_changes) = {
            let mut state = self.lock_state();
            let step = state.step(&self.params, &mut *self.lock_rng());
            (step, state.recent_changes().collect::<Vec<_>>())
        };

        let snapshot = SingleMarketSnapshot {
            market_id: self.market_id.clone(),
            current_odds: Some(OddsPair {
                yes: step.yes_odds,
                no: step.no_odds,
            }),
            last_update: Some(Utc::now()),
            volatility: step.volatility,
            momentum: step.momentum,
            recent_changes,
        };
        self.snapshot_tx.send_replace(snapshot.clone());
        snapshot
    }

    fn next_interval(&self) -> Duration {
        let span = self.config.max_interval_ms.saturating_sub(self.config.min_interval_ms) as f64;
        let ms = self.config.min_interval_ms as f64 + self.lock_rng().gen::<f64>() * span;
        Duration::from_millis(ms as u64)
    }
}
