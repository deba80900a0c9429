//! The cart synchronizer: mutations through the API, refetch on success.

use std::num::NonZeroU32;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use emporium_core::{CartItem, CartSummary, Product, ProductId, QuantityError, requested_quantity};

use super::{CartApi, CartSnapshot, CartStore};
use crate::api::ApiError;
use crate::notify::{Notification, Notifier};

/// A mutating cart operation, used for notification titles and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartAction {
    Add,
    Update,
    Remove,
    Clear,
}

impl CartAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Clear => "clear",
        }
    }

    /// Title shown when the server accepted the mutation.
    #[must_use]
    pub const fn success_title(self) -> &'static str {
        match self {
            Self::Add | Self::Update => "Cart updated",
            Self::Remove => "Item removed",
            Self::Clear => "Cart cleared",
        }
    }

    /// Title shown when the mutation failed.
    #[must_use]
    pub const fn failure_title(self) -> &'static str {
        match self {
            Self::Add | Self::Update => "Failed to update cart",
            Self::Remove => "Failed to remove item",
            Self::Clear => "Failed to clear cart",
        }
    }
}

impl std::fmt::Display for CartAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a mutation settled. The user has already been notified either way.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The server accepted it and a refetch was issued.
    Applied,
    /// Rejected locally or by the server; the view was left as it was.
    Failed,
}

impl MutationOutcome {
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Shared handle to the cart read model and its mutations.
///
/// Cheap to clone; every clone observes and mutates the same cart.
#[derive(Clone)]
pub struct CartSynchronizer {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn CartApi>,
    notifier: Arc<dyn Notifier>,
    store: CartStore,
}

impl std::fmt::Debug for CartSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSynchronizer")
            .field("store", &self.inner.store)
            .finish_non_exhaustive()
    }
}

impl CartSynchronizer {
    /// Create a synchronizer with an empty, not yet fetched, view.
    #[must_use]
    pub fn new(api: Arc<dyn CartApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                notifier,
                store: CartStore::new(),
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetch the cart and publish it.
    ///
    /// A failed read publishes an empty cart. It is logged, never retried and
    /// never shown to the user.
    #[instrument(skip(self))]
    pub async fn refresh(&self) {
        if let Err(error) = self.try_refresh().await {
            warn!(error = %error, "Failed to fetch cart, showing it as empty");
        }
    }

    /// Like [`refresh`](Self::refresh), but hands the read failure back.
    ///
    /// The view degrades to empty either way.
    ///
    /// # Errors
    ///
    /// Returns the API error that made the read fail.
    pub async fn try_refresh(&self) -> Result<(), ApiError> {
        let fetch = self.inner.store.begin_fetch();
        let ticket = fetch.ticket();

        let (items, result) = match self.inner.api.fetch_cart().await {
            Ok(items) => (items, Ok(())),
            Err(error) => (Vec::new(), Err(error)),
        };

        if !fetch.publish(items) {
            debug!(ticket, "Discarded cart fetch superseded by a later one");
        }
        result
    }

    /// Items of the last published fetch.
    #[must_use]
    pub fn items(&self) -> Arc<[CartItem]> {
        Arc::clone(&self.inner.store.snapshot().items)
    }

    /// Sum of `price * quantity` over the held items. No network access.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.inner.store.snapshot().total_price()
    }

    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.inner.store.snapshot().total_items()
    }

    /// Order summary for the held items.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.inner.store.snapshot().summary()
    }

    /// Whether a fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.store.snapshot().loading
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.store.snapshot()
    }

    /// Observe every published change to the cart.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.inner.store.subscribe()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` of `product`. The server decides whether an existing
    /// line is incremented or replaced.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_item(&self, product: &Product, quantity: NonZeroU32) -> MutationOutcome {
        let result = self.inner.api.add_to_cart(&product.id, quantity).await;
        self.settle(CartAction::Add, result).await
    }

    /// Add a single unit of `product`.
    pub async fn add_one(&self, product: &Product) -> MutationOutcome {
        self.add_item(product, NonZeroU32::MIN).await
    }

    /// Set the line for `product_id` to exactly `quantity`.
    ///
    /// Zero or less removes the line instead; no update is sent.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(&self, product_id: &ProductId, quantity: i64) -> MutationOutcome {
        match requested_quantity(quantity) {
            Ok(quantity) => {
                let result = self.inner.api.set_quantity(product_id, quantity).await;
                self.settle(CartAction::Update, result).await
            }
            Err(QuantityError::NotPositive(_)) => self.remove_item(product_id).await,
            Err(error @ QuantityError::TooLarge(_)) => {
                warn!(error = %error, "Rejected cart quantity");
                self.notify(Notification::error(
                    CartAction::Update.failure_title(),
                    Some(error.to_string().as_str()),
                ));
                MutationOutcome::Failed
            }
        }
    }

    /// Remove the line for `product_id`.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: &ProductId) -> MutationOutcome {
        let result = self.inner.api.remove_from_cart(product_id).await;
        self.settle(CartAction::Remove, result).await
    }

    /// Remove every line.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> MutationOutcome {
        let result = self.inner.api.clear_cart().await;
        self.settle(CartAction::Clear, result).await
    }

    async fn settle(&self, action: CartAction, result: Result<(), ApiError>) -> MutationOutcome {
        match result {
            Ok(()) => {
                self.notify(Notification::success(action.success_title()));
                self.refresh().await;
                MutationOutcome::Applied
            }
            Err(error) => {
                warn!(action = %action, error = %error, "Cart mutation failed");
                self.notify(Notification::error(
                    action.failure_title(),
                    error.server_message(),
                ));
                MutationOutcome::Failed
            }
        }
    }

    fn notify(&self, notification: Notification) {
        self.inner.notifier.notify(notification);
    }
}
