//! `emporium cart ...`
//!
//! Every command fetches the cart first, so output always reflects the server.

use std::num::NonZeroU32;

use tracing::instrument;

use emporium_core::product_id_from_slug;

use super::{CliError, Session, applied};
use crate::output;

pub async fn show(session: &Session) -> Result<(), CliError> {
    session.cart.refresh().await;
    output::cart(&session.cart.items());
    output::line(&format!(
        "Total: {}",
        emporium_core::format_price(session.cart.total_price())
    ));
    Ok(())
}

#[instrument(skip(session))]
pub async fn add(session: &Session, product: &str, quantity: u32) -> Result<(), CliError> {
    let quantity = NonZeroU32::new(quantity)
        .ok_or_else(|| CliError::InvalidArgument("quantity must be at least 1".to_owned()))?;
    let product = session
        .client
        .get_product(&product_id_from_slug(product))
        .await?;

    applied(session.cart.add_item(&product, quantity).await)?;
    output::cart(&session.cart.items());
    Ok(())
}

#[instrument(skip(session))]
pub async fn set(session: &Session, product: &str, quantity: i64) -> Result<(), CliError> {
    let product_id = product_id_from_slug(product);
    applied(session.cart.update_quantity(&product_id, quantity).await)?;
    output::cart(&session.cart.items());
    Ok(())
}

#[instrument(skip(session))]
pub async fn remove(session: &Session, product: &str) -> Result<(), CliError> {
    let product_id = product_id_from_slug(product);
    applied(session.cart.remove_item(&product_id).await)?;
    output::cart(&session.cart.items());
    Ok(())
}

pub async fn clear(session: &Session) -> Result<(), CliError> {
    applied(session.cart.clear().await)
}

pub async fn summary(session: &Session) -> Result<(), CliError> {
    session.cart.refresh().await;
    output::summary(&session.cart.summary());
    Ok(())
}
