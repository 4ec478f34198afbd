//! Simulated real-time market feed.
//!
//! [`MarketFeed`] ticks many markets at once with uneven activity;
//! [`SingleMarketFeed`] drives one market on its own schedule. Both run the
//! process in [`process`] and stop through a [`FeedHandle`].

pub mod batch;
pub mod handle;
pub mod process;
pub mod single;
pub mod types;

pub use batch::MarketFeed;
pub use handle::FeedHandle;
pub use single::SingleMarketFeed;
pub use types::{InitialVolume, MarketUpdate, Momentum, SingleMarketSnapshot, Volatility, VolatilityInfo};
