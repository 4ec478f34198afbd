//! PolyPro prediction-market dashboard backend
//!
//! Mock market data, a simulated real-time odds feed, local storage for the
//! watchlist and session, and in-memory alert, arbitrage and portfolio views.

pub mod alerts;
pub mod arbitrage;
pub mod config;
pub mod data;
pub mod feed;
pub mod monitoring;
pub mod portfolio;
pub mod storage;
