//! Observable read model of the remote cart.
//!
//! Backed by a `tokio::sync::watch` channel: views hold a receiver and wake on
//! every published change. Fetches are ticketed in issue order and a result is
//! only published if nothing issued later has been published already.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;

use emporium_core::{CartItem, CartSummary, compute_total, total_items};

/// What views see: the last published cart plus fetch progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    /// Line entries in server order.
    pub items: Arc<[CartItem]>,
    /// A fetch is in flight.
    pub loading: bool,
    /// Ticket of the fetch that produced `items`; 0 before the first fetch lands.
    pub revision: u64,
}

impl CartSnapshot {
    /// Whether any fetch has landed yet.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.revision > 0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of `price * quantity` over the held items.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        compute_total(&self.items)
    }

    /// Units across all held items.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        total_items(&self.items)
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::from_items(&self.items)
    }
}

/// Single shared owner of the cart read model.
#[derive(Debug)]
pub struct CartStore {
    tx: watch::Sender<CartSnapshot>,
    state: std::sync::Mutex<FetchState>,
}

#[derive(Debug, Default)]
struct FetchState {
    last_ticket: u64,
    in_flight: usize,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(CartSnapshot::default());
        Self {
            tx,
            state: std::sync::Mutex::new(FetchState::default()),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every published change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.tx.subscribe()
    }

    /// Register a fetch. Complete it with [`FetchGuard::publish`]; dropping the
    /// guard without publishing only clears the loading flag.
    pub fn begin_fetch(&self) -> FetchGuard<'_> {
        let mut state = self.lock_state();
        state.last_ticket += 1;
        state.in_flight += 1;
        let ticket = state.last_ticket;
        self.tx.send_if_modified(|snapshot| {
            let changed = !snapshot.loading;
            snapshot.loading = true;
            changed
        });
        drop(state);

        FetchGuard {
            store: self,
            ticket,
            finished: false,
        }
    }

    fn finish(&self, ticket: u64, items: Option<Vec<CartItem>>) -> bool {
        // Held across the send so loading flags are published in counter order.
        let mut state = self.lock_state();
        state.in_flight = state.in_flight.saturating_sub(1);
        let still_loading = state.in_flight > 0;

        let mut published = false;
        self.tx.send_if_modified(|snapshot| {
            let mut changed = snapshot.loading != still_loading;
            snapshot.loading = still_loading;
            if let Some(items) = items
                && ticket > snapshot.revision
            {
                snapshot.items = items.into();
                snapshot.revision = ticket;
                published = true;
                changed = true;
            }
            changed
        });
        published
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, FetchState> {
        // Two counters; a poisoned lock still holds usable values.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// An in-flight fetch registered with a [`CartStore`].
#[must_use = "a fetch that is never published leaves the view unchanged"]
#[derive(Debug)]
pub struct FetchGuard<'a> {
    store: &'a CartStore,
    ticket: u64,
    finished: bool,
}

impl FetchGuard<'_> {
    /// Publish the fetched items. Returns `false` if a later-issued fetch had
    /// already been published, in which case these items are discarded.
    pub fn publish(mut self, items: Vec<CartItem>) -> bool {
        self.finished = true;
        self.store.finish(self.ticket, Some(items))
    }

    #[must_use]
    pub const fn ticket(&self) -> u64 {
        self.ticket
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.store.finish(self.ticket, None);
        }
    }
}
