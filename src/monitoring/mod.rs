#[cfg(feature = "metrics")]
pub mod metrics;
pub mod recorder;

#[cfg(feature = "metrics")]
pub use metrics::FeedMetrics;
pub use recorder::UpdateRecorder;
