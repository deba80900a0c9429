//! Orders, payment handoff and admin dashboard figures.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{OrderId, OrderItemId, PaymentReference, ProductId, UserId};
use super::price::line_total;
use super::product::Product;
use super::status::OrderStatus;

/// The slice of the buyer's account attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// One purchased line. `unit_price` is frozen at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product: Option<Product>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderItem {
    /// Display name, falling back to the product id when the product was not embedded.
    #[must_use]
    pub fn name(&self) -> &str {
        self.product
            .as_ref()
            .map_or_else(|| self.product_id.as_str(), |p| p.name.as_str())
    }

    #[must_use]
    pub fn line_total(&self) -> Decimal {
        line_total(self.unit_price, self.quantity)
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: Option<OrderCustomer>,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

/// Where to send the buyer to pay, as issued by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRedirect {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: PaymentReference,
}

/// Store-wide figures for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub users: u64,
    pub orders: u64,
    pub products: u64,
    pub revenue: Decimal,
}
