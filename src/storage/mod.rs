//! Local key/value persistence standing in for browser storage.

pub mod local;
pub mod session;
pub mod watchlist;

pub use local::{LocalStorage, StorageError, StorageEvent};
pub use session::{Access, AuthGuard, FeatureAccess, SessionStore, Tier, User};
pub use watchlist::{Watchlist, WatchlistSync};
