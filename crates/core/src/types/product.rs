//! Catalog products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product from the remote catalog. Read-only to this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    /// Unit price in the store currency.
    pub price: Decimal,
    /// Units available; the most a cart line may hold.
    pub stock: u32,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether any stock remains.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// URL slug of the form `product-name-<id>.html`.
    #[must_use]
    pub fn slug(&self) -> String {
        let mut name = String::with_capacity(self.name.len());
        let mut pending_dash = false;
        for c in self.name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !name.is_empty() {
                    name.push('-');
                }
                pending_dash = false;
                name.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }
        format!("{name}-{}.html", self.id)
    }
}

/// Recover a product id from a slug produced by [`Product::slug`].
///
/// Ids are UUIDs in practice, so the trailing 36 characters are taken when they
/// look like one. Anything else is returned with the `.html` suffix removed.
#[must_use]
pub fn product_id_from_slug(slug: &str) -> ProductId {
    let clean = slug.strip_suffix(".html").unwrap_or(slug);
    let uuid_len = 36;
    if clean.len() >= uuid_len
        && let Some(tail) = clean.get(clean.len() - uuid_len..)
        && looks_like_uuid(tail)
    {
        return ProductId::new(tail);
    }
    ProductId::new(clean)
}

fn looks_like_uuid(s: &str) -> bool {
    s.char_indices().all(|(i, c)| match i {
        8 | 13 | 18 | 23 => c == '-',
        _ => c.is_ascii_hexdigit(),
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn product(id: &str, price: Decimal, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: None,
            price,
            stock,
            category: None,
            image_url: None,
            created_at: None,
            updated_at: None,
        }
    }
}
