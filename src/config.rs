use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            login_path: default_login_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Fixed seed for the feed RNG. Unset means entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Track every fetched market when the watchlist is empty
    #[serde(default = "default_true")]
    pub track_all_when_empty: bool,
    #[serde(default)]
    pub batch: BatchFeedConfig,
    #[serde(default)]
    pub single: SingleFeedConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: None,
            track_all_when_empty: true,
            batch: BatchFeedConfig::default(),
            single: SingleFeedConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchFeedConfig {
    #[serde(default = "default_connect_delay")]
    pub connect_delay_ms: u64,
    #[serde(default = "default_batch_min_interval")]
    pub min_interval_ms: u64,
    #[serde(default = "default_batch_max_interval")]
    pub max_interval_ms: u64,
    /// Lower bound of the share of tracked markets updated per tick
    #[serde(default = "default_min_activity")]
    pub min_activity: f64,
    #[serde(default = "default_max_activity")]
    pub max_activity: f64,
}

impl Default for BatchFeedConfig {
    fn default() -> Self {
        Self {
            connect_delay_ms: default_connect_delay(),
            min_interval_ms: default_batch_min_interval(),
            max_interval_ms: default_batch_max_interval(),
            min_activity: default_min_activity(),
            max_activity: default_max_activity(),
        }
    }
}

impl BatchFeedConfig {
    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SingleFeedConfig {
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_single_min_interval")]
    pub min_interval_ms: u64,
    #[serde(default = "default_single_max_interval")]
    pub max_interval_ms: u64,
}

impl Default for SingleFeedConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            min_interval_ms: default_single_min_interval(),
            max_interval_ms: default_single_max_interval(),
        }
    }
}

impl SingleFeedConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Sleep for the mock network delay on every uncached call
    #[serde(default = "default_true")]
    pub simulate_latency: bool,
    #[serde(default = "default_markets_stale")]
    pub markets_stale_secs: u64,
    #[serde(default = "default_market_stale")]
    pub market_stale_secs: u64,
    #[serde(default = "default_search_stale")]
    pub search_stale_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            simulate_latency: true,
            markets_stale_secs: default_markets_stale(),
            market_stale_secs: default_market_stale(),
            search_stale_secs: default_search_stale(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub csv_logging: bool,
    #[serde(default = "default_csv_log_path")]
    pub csv_log_path: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            csv_logging: false,
            csv_log_path: default_csv_log_path(),
        }
    }
}

fn default_true() -> bool { true }
fn default_storage_dir() -> String { ".polypro".to_string() }
fn default_login_path() -> String { "/login".to_string() }
fn default_connect_delay() -> u64 { 300 }
fn default_batch_min_interval() -> u64 { 1500 }
fn default_batch_max_interval() -> u64 { 4000 }
fn default_min_activity() -> f64 { 0.3 }
fn default_max_activity() -> f64 { 0.7 }
fn default_initial_delay() -> u64 { 1000 }
fn default_single_min_interval() -> u64 { 2000 }
fn default_single_max_interval() -> u64 { 5000 }
fn default_markets_stale() -> u64 { 30 }
fn default_market_stale() -> u64 { 15 }
fn default_search_stale() -> u64 { 30 }
fn default_csv_log_path() -> String { "feed_updates.csv".to_string() }

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub config_path: String,
    pub storage_dir: Option<String>,
    pub seed: Option<u64>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Load the file when present, otherwise fall back to defaults
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            tracing::warn!("Config file {} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Environment overrides win over the file
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(dir) = &env.storage_dir {
            self.system.storage_dir = dir.clone();
        }
        if env.seed.is_some() {
            self.feed.seed = env.seed;
        }
    }

    fn validate(&self) -> Result<()> {
        let batch = &self.feed.batch;
        if batch.min_interval_ms > batch.max_interval_ms {
            anyhow::bail!("feed.batch: min_interval_ms exceeds max_interval_ms");
        }
        if !(0.0..=1.0).contains(&batch.min_activity)
            || !(0.0..=1.0).contains(&batch.max_activity)
            || batch.min_activity > batch.max_activity
        {
            anyhow::bail!("feed.batch: activity bounds must satisfy 0 <= min <= max <= 1");
        }
        let single = &self.feed.single;
        if single.min_interval_ms > single.max_interval_ms {
            anyhow::bail!("feed.single: min_interval_ms exceeds max_interval_ms");
        }
        Ok(())
    }
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let seed = match std::env::var("POLYPRO_SEED") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .with_context(|| format!("POLYPRO_SEED is not a u64: {}", raw))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            config_path: std::env::var("POLYPRO_CONFIG")
                .unwrap_or_else(|_| "config.toml".to_string()),
            storage_dir: std::env::var("POLYPRO_STORAGE_DIR").ok(),
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.system.storage_dir, ".polypro");
        assert_eq!(config.feed.batch.connect_delay_ms, 300);
        assert_eq!(config.feed.single.initial_delay_ms, 1000);
        assert_eq!(config.service.market_stale_secs, 15);
        assert!(config.feed.enabled);
        assert!(config.feed.seed.is_none());
    }

    #[test]
    fn test_partial_section_overrides() {
        let config = Config::parse(
            r#"
            [feed]
            seed = 7

            [feed.batch]
            min_interval_ms = 100
            max_interval_ms = 200
            "#,
        )
        .unwrap();

        assert_eq!(config.feed.seed, Some(7));
        assert_eq!(config.feed.batch.min_interval_ms, 100);
        assert_eq!(config.feed.batch.connect_delay_ms, 300);
    }

    #[test]
    fn test_rejects_inverted_intervals() {
        let result = Config::parse(
            r#"
            [feed.single]
            min_interval_ms = 5000
            max_interval_ms = 2000
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(&EnvConfig {
            config_path: "config.toml".to_string(),
            storage_dir: Some("/tmp/polypro".to_string()),
            seed: Some(99),
        });

        assert_eq!(config.system.storage_dir, "/tmp/polypro");
        assert_eq!(config.feed.seed, Some(99));
    }
}
