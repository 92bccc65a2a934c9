use chrono::{DateTime, Utc};
use cinelist_models::{MovieSummary, WatchlistEntry};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use crate::error::{StorageError, StorageResult};
use crate::stats::WatchlistStats;
use crate::storage::WatchlistStorage;
use crate::subscription::{self, DeliveryQueue, SubscriberRegistry, Subscription, WatchlistSnapshot};

/// Source of `addedAt` timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Result of a mutation. `Unchanged` is not an error: adding a movie that is
/// already listed, or removing one that is not, is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    Unchanged,
}

impl MutationOutcome {
    pub fn is_applied(self) -> bool {
        self == MutationOutcome::Applied
    }
}

struct StoreState {
    entries: Vec<WatchlistEntry>,
    ids: HashSet<u64>,
    snapshot: WatchlistSnapshot,
    last_added_at: Option<DateTime<Utc>>,
    unsaved: bool,
    /// Last delivery ticket handed out
    next_ticket: u64,
}

/// The authoritative watchlist.
///
/// Owns the in-memory collection and its persisted slot. All mutation goes
/// through [`add`](Self::add), [`remove`](Self::remove) and
/// [`clear`](Self::clear); each one updates memory, writes the whole
/// collection to storage, then notifies subscribers before returning.
///
/// The store is `Send + Sync`; share it behind an `Arc`.
pub struct WatchlistStore {
    storage: Box<dyn WatchlistStorage>,
    clock: Box<dyn Clock>,
    state: Mutex<StoreState>,
    subscribers: Arc<SubscriberRegistry>,
    delivery: DeliveryQueue,
}

impl WatchlistStore {
    /// Restore the watchlist from `storage`.
    ///
    /// Never fails: a missing slot starts empty, a corrupt slot is cleared and
    /// starts empty, an unreadable slot starts empty and is left in place.
    pub fn initialize(storage: impl WatchlistStorage + 'static) -> Self {
        Self::with_clock(storage, SystemClock)
    }

    pub fn with_clock(storage: impl WatchlistStorage + 'static, clock: impl Clock + 'static) -> Self {
        let entries = restore(&storage);
        let ids = entries.iter().map(|e| e.id()).collect();
        let last_added_at = entries.iter().map(|e| e.added_at).max();
        let snapshot = WatchlistSnapshot::new(0, &entries);

        Self {
            storage: Box::new(storage),
            clock: Box::new(clock),
            state: Mutex::new(StoreState {
                entries,
                ids,
                snapshot,
                last_added_at,
                unsaved: false,
                next_ticket: 0,
            }),
            subscribers: Arc::new(SubscriberRegistry::new()),
            delivery: DeliveryQueue::new(),
        }
    }

    /// Append `movie` unless a movie with the same id is already listed.
    ///
    /// Existing entries are never merged or refreshed.
    pub fn add(&self, movie: MovieSummary) -> MutationOutcome {
        assert_not_delivering("add");
        let mut state = self.lock_state();

        if state.ids.contains(&movie.id) {
            debug!("Movie {} already in watchlist, ignoring add", movie.id);
            return MutationOutcome::Unchanged;
        }

        let movie = sanitize(movie);
        let now = self.clock.now();
        let added_at = match state.last_added_at {
            Some(last) if last > now => last,
            _ => now,
        };

        info!("Adding movie {} ({}) to watchlist", movie.id, movie.title);
        state.last_added_at = Some(added_at);
        state.ids.insert(movie.id);
        state.entries.push(WatchlistEntry::new(movie, added_at));

        self.commit(state);
        MutationOutcome::Applied
    }

    /// Remove the movie with `movie_id` if listed
    pub fn remove(&self, movie_id: u64) -> MutationOutcome {
        assert_not_delivering("remove");
        let mut state = self.lock_state();

        if !state.ids.remove(&movie_id) {
            debug!("Movie {} not in watchlist, ignoring remove", movie_id);
            return MutationOutcome::Unchanged;
        }

        info!("Removing movie {} from watchlist", movie_id);
        state.entries.retain(|e| e.id() != movie_id);

        self.commit(state);
        MutationOutcome::Applied
    }

    /// Remove every entry
    pub fn clear(&self) -> MutationOutcome {
        assert_not_delivering("clear");
        let mut state = self.lock_state();

        if state.entries.is_empty() {
            return MutationOutcome::Unchanged;
        }

        info!("Clearing watchlist ({} entries)", state.entries.len());
        state.entries.clear();
        state.ids.clear();

        self.commit(state);
        MutationOutcome::Applied
    }

    /// Whether `movie_id` is listed in memory (persisted state may lag after a failed write)
    pub fn contains(&self, movie_id: u64) -> bool {
        self.lock_state().ids.contains(&movie_id)
    }

    pub fn get(&self, movie_id: u64) -> Option<WatchlistEntry> {
        self.lock_state()
            .entries
            .iter()
            .find(|e| e.id() == movie_id)
            .cloned()
    }

    /// Entries in insertion order, as an owned copy
    pub fn list(&self) -> Vec<WatchlistEntry> {
        self.lock_state().snapshot.to_vec()
    }

    pub fn snapshot(&self) -> WatchlistSnapshot {
        self.lock_state().snapshot.clone()
    }

    pub fn len(&self) -> usize {
        self.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_state().entries.is_empty()
    }

    pub fn stats(&self) -> WatchlistStats {
        self.snapshot().stats()
    }

    /// Entries newest first by `addedAt`
    pub fn recently_added(&self) -> Vec<WatchlistEntry> {
        self.snapshot().recently_added()
    }

    /// Register `callback`.
    ///
    /// It is called with the current snapshot before this returns, then after
    /// every committed mutation until the [`Subscription`] is dropped.
    /// Callbacks may read the store but must not mutate it.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&WatchlistSnapshot) + Send + Sync + 'static,
    {
        assert_not_delivering("subscribe");
        let mut state = self.lock_state();
        state.next_ticket += 1;
        let ticket = state.next_ticket;
        let subscription = self.subscribers.register(Arc::new(callback), ticket);
        let snapshot = state.snapshot.clone();
        drop(state);

        let _turn = self.delivery.wait_turn(ticket);
        self.subscribers.deliver_to(subscription.id(), &snapshot);
        subscription
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// True when the last write to storage failed
    pub fn has_unsaved_changes(&self) -> bool {
        self.lock_state().unsaved
    }

    /// Write the whole collection to storage now
    pub fn flush(&self) -> StorageResult<()> {
        let mut state = self.lock_state();
        self.storage.save(&state.entries)?;
        state.unsaved = false;
        Ok(())
    }

    pub fn storage_location(&self) -> String {
        self.storage.describe()
    }

    /// Publish the mutated state: bump the version, persist, then notify.
    ///
    /// The delivery ticket is drawn under the state lock so deliveries follow
    /// commit order; the lock is released before callbacks run.
    fn commit(&self, mut state: MutexGuard<'_, StoreState>) {
        let version = state.snapshot.version() + 1;
        let snapshot = WatchlistSnapshot::new(version, &state.entries);
        state.snapshot = snapshot.clone();

        match self.storage.save(&state.entries) {
            Ok(()) => state.unsaved = false,
            Err(e) => {
                state.unsaved = true;
                warn!(
                    "Failed to persist watchlist to {}: {}. Keeping in-memory changes.",
                    self.storage.describe(),
                    e
                );
            }
        }

        state.next_ticket += 1;
        let ticket = state.next_ticket;
        drop(state);

        let _turn = self.delivery.wait_turn(ticket);
        self.subscribers.deliver(&snapshot, ticket);
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        // Mutations are single-step, so a poisoned lock still guards a consistent collection
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for WatchlistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("WatchlistStore")
            .field("storage", &self.storage.describe())
            .field("entries", &state.entries.len())
            .field("version", &state.snapshot.version())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

fn assert_not_delivering(operation: &str) {
    assert!(
        !subscription::is_delivering(),
        "WatchlistStore::{} called from inside a subscriber callback",
        operation
    );
}

/// Load the persisted collection, recovering from every storage failure
fn restore(storage: &dyn WatchlistStorage) -> Vec<WatchlistEntry> {
    match storage.load() {
        Ok(entries) => {
            let total = entries.len();
            let mut seen = HashSet::new();
            let entries: Vec<WatchlistEntry> = entries
                .into_iter()
                .filter(|e| seen.insert(e.id()))
                .collect();

            if entries.len() != total {
                warn!(
                    "Watchlist at {} had {} duplicate entries, keeping first occurrences",
                    storage.describe(),
                    total - entries.len()
                );
                if let Err(e) = storage.save(&entries) {
                    warn!("Failed to rewrite deduplicated watchlist: {}", e);
                }
            }
            entries
        }
        Err(StorageError::CorruptData(reason)) => {
            warn!(
                "Watchlist corruption detected at {}: {}. Discarding stored data.",
                storage.describe(),
                reason
            );
            if let Err(e) = storage.clear() {
                warn!("Failed to clear corrupt watchlist slot: {}", e);
            }
            Vec::new()
        }
        Err(e) => {
            warn!("{}. Starting with an empty watchlist.", e);
            Vec::new()
        }
    }
}

/// Keep persisted data loadable: a rating that would fail validation is reset to 0.0
fn sanitize(mut movie: MovieSummary) -> MovieSummary {
    if let Err(reason) = movie.validate() {
        warn!("{}, storing 0.0 instead", reason);
        movie.vote_average = 0.0;
    }
    movie
}
