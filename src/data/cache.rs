use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::config::ServiceConfig;

/// Which mock query produced a cached value; decides its stale time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Markets,
    Market,
    Search,
}

#[derive(Debug, Clone, Copy)]
pub struct StaleTimes {
    pub markets: Duration,
    pub market: Duration,
    pub search: Duration,
}

impl StaleTimes {
    pub fn for_kind(&self, kind: QueryKind) -> Duration {
        match kind {
            QueryKind::Markets => self.markets,
            QueryKind::Market => self.market,
            QueryKind::Search => self.search,
        }
    }
}

impl From<&ServiceConfig> for StaleTimes {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            markets: Duration::from_secs(config.markets_stale_secs),
            market: Duration::from_secs(config.market_stale_secs),
            search: Duration::from_secs(config.search_stale_secs),
        }
    }
}

impl Default for StaleTimes {
    fn default() -> Self {
        Self::from(&ServiceConfig::default())
    }
}

pub struct QueryCache<V> {
    cache: DashMap<String, CachedEntry<V>>,
    stale_times: StaleTimes,
}

struct CachedEntry<V> {
    value: V,
    timestamp: Instant,
    ttl: Duration,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(stale_times: StaleTimes) -> Self {
        Self {
            cache: DashMap::new(),
            stale_times,
        }
    }

    /// Insert with a TTL chosen by query kind
    pub fn insert(&self, key: String, value: V, kind: QueryKind) {
        self.cache.insert(key, CachedEntry {
            value,
            timestamp: Instant::now(),
            ttl: self.stale_times.for_kind(kind),
        });
    }

    /// Get value if still fresh (evict on read)
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.cache.get(key)?;
        if entry.timestamp.elapsed() > entry.ttl {
            drop(entry); // release the shard read lock before removing
            self.cache.remove(key);
            None
        } else {
            Some(entry.value.clone())
        }
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl<V: Clone> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new(StaleTimes::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn short_ttls() -> StaleTimes {
        StaleTimes {
            markets: Duration::from_secs(300),
            market: Duration::from_millis(200),
            search: Duration::from_secs(300),
        }
    }

    #[test]
    fn test_cache_insert_and_get() {
        let cache = QueryCache::default();
        cache.insert("markets:20:0".to_string(), vec![1, 2, 3], QueryKind::Markets);

        assert_eq!(cache.get("markets:20:0"), Some(vec![1, 2, 3]));
        assert_eq!(cache.get("markets:10:0"), None);
    }

    #[test]
    fn test_cache_ttl_expiration() {
        let cache = QueryCache::new(short_ttls());
        cache.insert("market:1".to_string(), 42.0, QueryKind::Market);

        assert_eq!(cache.get("market:1"), Some(42.0));

        thread::sleep(Duration::from_millis(300));

        assert_eq!(cache.get("market:1"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_different_ttls() {
        let cache = QueryCache::new(short_ttls());
        cache.insert("market:1".to_string(), 1.0, QueryKind::Market);
        cache.insert("search:btc".to_string(), 2.0, QueryKind::Search);

        thread::sleep(Duration::from_millis(300));

        assert_eq!(cache.get("market:1"), None);
        assert_eq!(cache.get("search:btc"), Some(2.0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stale_times_from_config() {
        let times = StaleTimes::default();
        assert_eq!(times.for_kind(QueryKind::Markets), Duration::from_secs(30));
        assert_eq!(times.for_kind(QueryKind::Market), Duration::from_secs(15));
    }
}
