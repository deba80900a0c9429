//! Cache types for catalog responses.

use emporium_core::{Product, ProductId};

use super::catalog::ProductQuery;

/// Cache key for products and product listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    /// Only listings without a search term are cached.
    Products(ProductQuery),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
}
