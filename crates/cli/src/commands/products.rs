//! `emporium products ...`

use emporium_core::product_id_from_slug;
use emporium_storefront::api::ProductQuery;

use super::{CliError, Session};
use crate::output;

pub async fn list(session: &Session, query: &ProductQuery) -> Result<(), CliError> {
    let products = session.client.list_products(query).await?;
    output::products(&products);
    Ok(())
}

/// Accepts either a bare product id or a product page slug.
pub async fn show(session: &Session, product: &str) -> Result<(), CliError> {
    let product = session
        .client
        .get_product(&product_id_from_slug(product))
        .await?;
    output::product(&product);
    Ok(())
}
