//! Change notification for watchlist consumers.
//!
//! Consumers register a callback and receive a [`WatchlistSnapshot`]
//! immediately, then again after every committed mutation. The returned
//! [`Subscription`] is an RAII guard: dropping it removes the callback.
//!
//! Deliveries are serialized by a ticket queue. Each mutation (and each new
//! subscription) draws a ticket while the store's state lock is held and
//! delivers once every earlier ticket has been served, so a consumer never
//! sees versions out of order. The state lock is released before delivery,
//! which lets callbacks read the store. Mutating the store or subscribing
//! from inside a callback would wait on its own ticket, so the store panics
//! instead.

use cinelist_models::WatchlistEntry;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, Weak};
use crate::stats::{self, WatchlistStats};

pub type SnapshotCallback = dyn Fn(&WatchlistSnapshot) + Send + Sync;

thread_local! {
    static DELIVERING: Cell<bool> = const { Cell::new(false) };
}

/// True while the current thread is inside a subscriber callback
pub(crate) fn is_delivering() -> bool {
    DELIVERING.with(Cell::get)
}

struct DeliveringGuard {
    previous: bool,
}

impl DeliveringGuard {
    fn enter() -> Self {
        Self {
            previous: DELIVERING.with(|d| d.replace(true)),
        }
    }
}

impl Drop for DeliveringGuard {
    fn drop(&mut self) {
        let previous = self.previous;
        DELIVERING.with(|d| d.set(previous));
    }
}

fn invoke(callback: &SnapshotCallback, snapshot: &WatchlistSnapshot) {
    let _guard = DeliveringGuard::enter();
    callback(snapshot);
}

/// Immutable view of the watchlist at one version.
///
/// Cloning is cheap; entries are shared.
#[derive(Debug, Clone)]
pub struct WatchlistSnapshot {
    version: u64,
    entries: Arc<[WatchlistEntry]>,
}

impl WatchlistSnapshot {
    pub(crate) fn new(version: u64, entries: &[WatchlistEntry]) -> Self {
        Self {
            version,
            entries: Arc::from(entries),
        }
    }

    /// 0 for the initial state, incremented once per committed mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, movie_id: u64) -> bool {
        self.entries.iter().any(|e| e.id() == movie_id)
    }

    pub fn ids(&self) -> Vec<u64> {
        self.entries.iter().map(|e| e.id()).collect()
    }

    /// Owned copy, detached from the store
    pub fn to_vec(&self) -> Vec<WatchlistEntry> {
        self.entries.to_vec()
    }

    pub fn stats(&self) -> WatchlistStats {
        WatchlistStats::from_entries(&self.entries)
    }

    pub fn recently_added(&self) -> Vec<WatchlistEntry> {
        stats::sort_recently_added(&self.entries)
    }
}

pub(crate) struct SubscriberRegistry {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Registration>>,
}

struct Registration {
    id: u64,
    /// Ticket of the initial delivery; only later tickets reach this callback
    start_ticket: u64,
    callback: Arc<SnapshotCallback>,
}

impl SubscriberRegistry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn register(self: &Arc<Self>, callback: Arc<SnapshotCallback>, start_ticket: u64) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push(Registration { id, start_ticket, callback });
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: u64) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|r| r.id != id);
        subscribers.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn callback(&self, id: u64) -> Option<Arc<SnapshotCallback>> {
        self.lock()
            .iter()
            .find(|r| r.id == id)
            .map(|r| Arc::clone(&r.callback))
    }

    /// Call every subscriber registered before `ticket`, in registration order.
    ///
    /// The registry lock is not held while a callback runs, so callbacks may
    /// drop subscriptions. A subscription dropped mid-cycle is skipped if it
    /// has not been called yet.
    pub(crate) fn deliver(&self, snapshot: &WatchlistSnapshot, ticket: u64) {
        let ids: Vec<u64> = self
            .lock()
            .iter()
            .filter(|r| r.start_ticket < ticket)
            .map(|r| r.id)
            .collect();
        for id in ids {
            if let Some(callback) = self.callback(id) {
                invoke(&*callback, snapshot);
            }
        }
    }

    pub(crate) fn deliver_to(&self, id: u64, snapshot: &WatchlistSnapshot) {
        if let Some(callback) = self.callback(id) {
            invoke(&*callback, snapshot);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Registration>> {
        self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Registration handle returned by
/// [`WatchlistStore::subscribe`](crate::WatchlistStore::subscribe).
///
/// Dropping it unregisters the callback.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<SubscriberRegistry>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True while the callback is registered and the store is alive
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .map(|r| r.callback(self.id).is_some())
            .unwrap_or(false)
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// FIFO ticket queue ordering deliveries
pub(crate) struct DeliveryQueue {
    served: Mutex<u64>,
    turn: Condvar,
}

impl DeliveryQueue {
    pub(crate) fn new() -> Self {
        Self {
            served: Mutex::new(0),
            turn: Condvar::new(),
        }
    }

    /// Block until every ticket before `ticket` has been served.
    ///
    /// Tickets start at 1 and must be drawn contiguously. The returned guard
    /// marks the ticket served when dropped, including during a panic.
    pub(crate) fn wait_turn(&self, ticket: u64) -> DeliveryTurn<'_> {
        let mut served = self.served.lock().unwrap_or_else(|p| p.into_inner());
        while *served + 1 < ticket {
            served = self.turn.wait(served).unwrap_or_else(|p| p.into_inner());
        }
        DeliveryTurn { queue: self, ticket }
    }
}

pub(crate) struct DeliveryTurn<'a> {
    queue: &'a DeliveryQueue,
    ticket: u64,
}

impl Drop for DeliveryTurn<'_> {
    fn drop(&mut self) {
        let mut served = self.queue.served.lock().unwrap_or_else(|p| p.into_inner());
        if *served < self.ticket {
            *served = self.ticket;
        }
        self.queue.turn.notify_all();
    }
}
