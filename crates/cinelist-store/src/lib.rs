//! Watchlist state store.
//!
//! [`WatchlistStore`] owns the deduplicated, insertion-ordered watchlist,
//! persists it through a [`WatchlistStorage`] after every mutation and
//! notifies [`Subscription`] holders synchronously.

pub mod error;
pub mod stats;
pub mod storage;
pub mod store;
pub mod subscription;

pub use error::{StorageError, StorageResult};
pub use stats::WatchlistStats;
pub use storage::{JsonFileStorage, MemoryStorage, WatchlistStorage, STORAGE_VERSION};
pub use store::{Clock, MutationOutcome, SystemClock, WatchlistStore};
pub use subscription::{SnapshotCallback, Subscription, WatchlistSnapshot};
