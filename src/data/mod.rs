pub mod cache;
pub mod fixtures;
pub mod market_service;
pub mod types;

pub use market_service::{FetchParams, MockMarketService};
pub use types::{CategoryFilter, Market, MarketCategory, Side};
