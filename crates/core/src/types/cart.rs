//! Cart line entries and the aggregates derived from them.
//!
//! Nothing here is stored: totals are recomputed from the item set every time
//! they are asked for.

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartItemId, ProductId};
use super::price::{add_amounts, line_total};
use super::product::Product;

/// Subtotal at or above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(500, 0, 0, false, 0);
/// Flat shipping fee charged below [`FREE_SHIPPING_THRESHOLD`].
pub const FLAT_SHIPPING_FEE: Decimal = Decimal::from_parts(25, 0, 0, false, 0);
/// Estimated tax rate (10%).
pub const ESTIMATED_TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Why a requested quantity cannot be stored on a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    /// Zero or negative. Callers translate this into a removal.
    #[error("quantity must be positive (got {0})")]
    NotPositive(i64),
    /// Larger than a cart line can hold.
    #[error("quantity {0} is too large")]
    TooLarge(i64),
}

/// Validate a caller-supplied quantity for a cart line.
///
/// # Errors
///
/// Returns [`QuantityError::NotPositive`] for `q <= 0` and
/// [`QuantityError::TooLarge`] when `q` does not fit in a `u32`.
pub fn requested_quantity(q: i64) -> Result<NonZeroU32, QuantityError> {
    if q <= 0 {
        return Err(QuantityError::NotPositive(q));
    }
    u32::try_from(q)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or(QuantityError::TooLarge(q))
}

/// One (product, quantity) pairing within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Server-issued line id.
    pub id: CartItemId,
    pub product: Product,
    pub quantity: NonZeroU32,
}

impl CartItem {
    /// Id of the product this line refers to; the key used for mutations.
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product.id
    }

    /// `unit price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        line_total(self.product.price, self.quantity.get())
    }

    /// Whether the line already holds every unit in stock.
    #[must_use]
    pub const fn at_stock_limit(&self) -> bool {
        self.quantity.get() >= self.product.stock
    }
}

/// Sum of `price * quantity` over all items. Zero for an empty cart.
///
/// Saturates at [`Decimal::MAX`], so a server-supplied price can never make
/// this panic.
#[must_use]
pub fn compute_total(items: &[CartItem]) -> Decimal {
    items
        .iter()
        .map(CartItem::line_total)
        .fold(Decimal::ZERO, add_amounts)
}

/// Total number of units across all items.
#[must_use]
pub fn total_items(items: &[CartItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity.get())).sum()
}

/// Order summary shown next to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub item_count: u64,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub estimated_tax: Decimal,
    pub total: Decimal,
}

impl CartSummary {
    /// Build the summary for a set of items.
    #[must_use]
    pub fn from_items(items: &[CartItem]) -> Self {
        let subtotal = compute_total(items);
        let shipping = if subtotal >= FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            FLAT_SHIPPING_FEE
        };
        let estimated_tax = subtotal.saturating_mul(ESTIMATED_TAX_RATE).round_dp(2);

        Self {
            item_count: total_items(items),
            subtotal,
            shipping,
            estimated_tax,
            total: add_amounts(add_amounts(subtotal, shipping), estimated_tax),
        }
    }

    /// Whether this order ships for free.
    #[must_use]
    pub fn free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::item;
    use super::*;

    #[test]
    fn test_total_of_empty_cart_is_zero() {
        assert_eq!(compute_total(&[]), Decimal::ZERO);
        assert_eq!(total_items(&[]), 0);
    }

    #[test]
    fn test_total_sums_price_times_quantity() {
        let items = [
            item("a", Decimal::new(10, 0), 2),
            item("b", Decimal::new(5, 0), 3),
        ];
        assert_eq!(compute_total(&items), Decimal::new(35, 0));
        assert_eq!(total_items(&items), 5);
    }

    #[test]
    fn test_summary_charges_shipping_below_threshold() {
        let summary = CartSummary::from_items(&[item("a", Decimal::new(100, 0), 1)]);
        assert_eq!(summary.shipping, Decimal::new(25, 0));
        assert_eq!(summary.estimated_tax, Decimal::new(10, 0));
        assert_eq!(summary.total, Decimal::new(135, 0));
        assert!(!summary.free_shipping());
    }

    #[test]
    fn test_summary_free_shipping_at_threshold() {
        let summary = CartSummary::from_items(&[item("a", Decimal::new(250, 0), 2)]);
        assert!(summary.free_shipping());
        assert_eq!(summary.total, Decimal::new(550, 0));
        assert_eq!(summary.item_count, 2);
    }

    #[test]
    fn test_totals_saturate_instead_of_panicking() {
        let items = [
            item("a", Decimal::MAX, 2),
            item("b", Decimal::new(5, 0), 1),
        ];
        assert_eq!(compute_total(&items), Decimal::MAX);

        let summary = CartSummary::from_items(&items);
        assert_eq!(summary.subtotal, Decimal::MAX);
        assert_eq!(summary.total, Decimal::MAX);
        assert!(summary.free_shipping());
    }

    #[test]
    fn test_requested_quantity() {
        assert_eq!(requested_quantity(0), Err(QuantityError::NotPositive(0)));
        assert_eq!(requested_quantity(-4), Err(QuantityError::NotPositive(-4)));
        assert_eq!(requested_quantity(7).map(NonZeroU32::get), Ok(7));
        assert_eq!(
            requested_quantity(i64::from(u32::MAX) + 1),
            Err(QuantityError::TooLarge(i64::from(u32::MAX) + 1))
        );
    }

    #[test]
    fn test_stock_limit() {
        let mut line = item("a", Decimal::ONE, 3);
        line.product.stock = 3;
        assert!(line.at_stock_limit());
        line.product.stock = 4;
        assert!(!line.at_stock_limit());
    }
}
