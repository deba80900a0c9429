//! Core types for Emporium.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;
pub mod user;

pub use cart::{
    CartItem, CartSummary, QuantityError, compute_total, requested_quantity, total_items,
};
pub use id::*;
pub use order::{DashboardStats, Order, OrderCustomer, OrderItem, PaymentRedirect};
pub use price::{add_amounts, format_price, line_total};
pub use product::{Product, product_id_from_slug};
pub use status::*;
pub use user::User;
