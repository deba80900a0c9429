//! Store administration commands.
//!
//! # Usage
//!
//! ```bash
//! # Every order in the store
//! emporium admin orders
//!
//! # Move an order along
//! emporium admin status 9c1f0b7e-2d3a-4f5b-8e6d-7a1c2b3d4e5f shipped
//!
//! # Dashboard figures
//! emporium admin stats
//!
//! # Add a product
//! emporium admin products create --name "Golden Pineapple" \
//!     --description "Sweet and hand picked" --price 12.50 --stock 20 \
//!     --category fruit --image ./pineapple.jpg
//! ```
//!
//! The session token must belong to an admin; other tokens get `Unauthorized`.

use std::path::Path;

use rust_decimal::Decimal;

use emporium_core::{OrderId, OrderStatus};
use emporium_storefront::api::{NewProduct, ProductImage};

use super::{CliError, Session};
use crate::output;

pub async fn orders(session: &Session) -> Result<(), CliError> {
    let orders = session.client.all_orders().await?;
    output::orders(&orders);
    Ok(())
}

pub async fn set_status(session: &Session, order: &str, status: &str) -> Result<(), CliError> {
    let status = parse_status(status)?;
    let order_id = OrderId::new(order);

    tracing::info!("Updating order {} to {}", order_id, status);
    session
        .client
        .update_order_status(&order_id, status)
        .await?;
    output::line(&format!("Order {order_id} is now {status}."));
    Ok(())
}

pub async fn stats(session: &Session) -> Result<(), CliError> {
    let stats = session.client.dashboard_stats().await?;
    output::stats(&stats);
    Ok(())
}

/// Product form fields; the image is read from `image`.
pub struct CreateProductArgs {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: u32,
    pub category: String,
    pub image: std::path::PathBuf,
}

pub async fn create_product(session: &Session, args: CreateProductArgs) -> Result<(), CliError> {
    let bytes = tokio::fs::read(&args.image).await?;
    let file_name = args
        .image
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();

    let product = session
        .client
        .create_product(NewProduct {
            name: args.name,
            description: args.description,
            price: args.price,
            stock: args.stock,
            category: args.category,
            image: ProductImage {
                content_type: image_content_type(&args.image).to_string(),
                file_name,
                bytes,
            },
        })
        .await?;

    output::line("Product created.");
    output::product(&product);
    Ok(())
}

fn image_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

fn parse_status(status: &str) -> Result<OrderStatus, CliError> {
    status.parse().map_err(|_| {
        CliError::InvalidArgument(format!(
            "{status}. Valid statuses: pending, processing, shipped, delivered, cancelled"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_is_case_insensitive() {
        assert_eq!(parse_status("shipped").unwrap(), OrderStatus::Shipped);
        assert_eq!(parse_status("CANCELLED").unwrap(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_image_content_type_from_extension() {
        assert_eq!(image_content_type(Path::new("a/b.JPG")), "image/jpeg");
        assert_eq!(image_content_type(Path::new("shot.png")), "image/png");
        assert_eq!(
            image_content_type(Path::new("README")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_parse_status_rejects_unknown() {
        assert!(matches!(
            parse_status("lost"),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
