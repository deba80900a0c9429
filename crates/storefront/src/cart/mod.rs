//! Cart synchronization.
//!
//! The remote API owns the cart. This module keeps a read model of it that any
//! number of views can observe, and routes every mutation through the API:
//!
//! ```text
//! idle -> in-flight -> success -> notify, invalidate, refetch
//!                   -> failure -> notify, view untouched
//! ```
//!
//! Nothing is merged locally. After a successful mutation the view is only
//! authoritative again once the follow-up fetch lands.

mod store;
mod sync;

pub use store::{CartSnapshot, CartStore};
pub use sync::{CartAction, CartSynchronizer, MutationOutcome};

use std::num::NonZeroU32;

use async_trait::async_trait;
use emporium_core::{CartItem, ProductId};

use crate::api::ApiError;

/// Remote cart endpoints the synchronizer depends on.
///
/// Implemented by [`crate::api::ApiClient`]; tests substitute in-memory fakes.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// `GET /cart`: the session's line entries in server order.
    async fn fetch_cart(&self) -> Result<Vec<CartItem>, ApiError>;

    /// `POST /cart`: create or grow the line for `product_id`.
    async fn add_to_cart(&self, product_id: &ProductId, quantity: NonZeroU32)
    -> Result<(), ApiError>;

    /// `PATCH /cart/{productId}`: set the line to exactly `quantity`.
    async fn set_quantity(&self, product_id: &ProductId, quantity: NonZeroU32)
    -> Result<(), ApiError>;

    /// `DELETE /cart/{productId}`.
    async fn remove_from_cart(&self, product_id: &ProductId) -> Result<(), ApiError>;

    /// `DELETE /cart`.
    async fn clear_cart(&self) -> Result<(), ApiError>;
}
