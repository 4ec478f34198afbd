use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::storage::local::{LocalStorage, StorageError};

pub const WATCHLIST_KEY: &str = "polypro-watchlist";

/// Market ids the user follows, stored as a JSON array under [`WATCHLIST_KEY`].
#[derive(Clone)]
pub struct Watchlist {
    storage: LocalStorage,
}

impl Watchlist {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// Stored ids; missing, unreadable or corrupt values read as empty
    pub fn load(&self) -> Vec<String> {
        match self.storage.get_item(WATCHLIST_KEY) {
            Ok(raw) => parse_ids(raw.as_deref()),
            Err(e) => {
                warn!("Failed to read watchlist: {}", e);
                Vec::new()
            }
        }
    }

    pub fn contains(&self, market_id: &str) -> bool {
        self.load().iter().any(|id| id == market_id)
    }

    /// Add the id if missing, remove it otherwise; returns the stored list
    pub fn toggle(&self, market_id: &str) -> Result<Vec<String>, StorageError> {
        let mut ids = self.load();
        match ids.iter().position(|id| id == market_id) {
            Some(index) => {
                ids.remove(index);
                debug!("Removed {} from watchlist", market_id);
            }
            None => {
                ids.push(market_id.to_string());
                debug!("Added {} to watchlist", market_id);
            }
        }
        self.save(&ids)?;
        Ok(ids)
    }

    pub fn save(&self, ids: &[String]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(ids)?;
        self.storage.set_item(WATCHLIST_KEY, &raw)
    }

    /// Follow changes made through any handle on the same storage.
    ///
    /// Must be called inside a tokio runtime.
    pub fn sync(&self) -> WatchlistSync {
        WatchlistSync::spawn(self.clone())
    }
}

fn parse_ids(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Ignoring corrupt watchlist: {}", e);
        Vec::new()
    })
}

/// Background listener keeping a live copy of the watchlist.
///
/// Each event carries the full array, so the copy is replaced wholesale.
pub struct WatchlistSync {
    ids: watch::Receiver<Vec<String>>,
    task: JoinHandle<()>,
}

impl WatchlistSync {
    fn spawn(watchlist: Watchlist) -> Self {
        let mut events = watchlist.storage.subscribe();
        let (tx, ids) = watch::channel(watchlist.load());

        let task = tokio::spawn(async move {
            loop {
                let next = match events.recv().await {
                    Ok(event) if event.key == WATCHLIST_KEY => parse_ids(event.new_value.as_deref()),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Watchlist sync lagged by {} events, reloading", skipped);
                        watchlist.load()
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if tx.send(next).is_err() {
                    break;
                }
            }
        });

        Self { ids, task }
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.borrow().clone()
    }

    /// Wait for the next change; returns the new list
    pub async fn changed(&mut self) -> Option<Vec<String>> {
        self.ids.changed().await.ok()?;
        Some(self.ids.borrow_and_update().clone())
    }
}

impl Drop for WatchlistSync {
    fn drop(&mut self) {
        self.task.abort();
    }
}
