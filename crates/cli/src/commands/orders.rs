//! `emporium orders` and `emporium checkout ...`

use emporium_core::PaymentReference;

use super::{CliError, Session};
use crate::output;

pub async fn mine(session: &Session) -> Result<(), CliError> {
    let orders = session.client.my_orders().await?;
    output::orders(&orders);
    Ok(())
}

pub async fn begin_checkout(session: &Session) -> Result<(), CliError> {
    let redirect = session.checkout.begin().await?;
    output::summary(&session.cart.summary());
    output::line(&format!("Complete payment at: {}", redirect.authorization_url));
    output::line(&format!("Reference: {}", redirect.reference));
    Ok(())
}

pub async fn complete_checkout(session: &Session, reference: &str) -> Result<(), CliError> {
    let receipt = session
        .checkout
        .complete(&PaymentReference::new(reference))
        .await?;
    if receipt.is_paid() {
        output::line(&format!("Payment {} confirmed.", receipt.reference));
    } else {
        output::line(&format!("Payment {} was not successful.", receipt.reference));
    }
    Ok(())
}
