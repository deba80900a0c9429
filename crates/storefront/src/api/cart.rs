//! Cart endpoints (never cached - mutable state).

use std::num::NonZeroU32;

use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use emporium_core::{CartItem, ProductId};

use super::wire::{AddToCartBody, CartData, SetQuantityBody, convert_cart};
use super::{ApiClient, ApiError};
use crate::cart::CartApi;

#[async_trait]
impl CartApi for ApiClient {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<Vec<CartItem>, ApiError> {
        let request = self.request(Method::GET, &["cart"])?;
        let data = self
            .execute::<CartData>(request)
            .await?
            .into_data("cart")?;
        Ok(convert_cart(data))
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add_to_cart(
        &self,
        product_id: &ProductId,
        quantity: NonZeroU32,
    ) -> Result<(), ApiError> {
        let request = self.request(Method::POST, &["cart"])?.json(&AddToCartBody {
            product_id: product_id.as_str(),
            quantity: quantity.get(),
        });
        self.execute_unit(request).await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn set_quantity(
        &self,
        product_id: &ProductId,
        quantity: NonZeroU32,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PATCH, &["cart", product_id.as_str()])?
            .json(&SetQuantityBody {
                quantity: quantity.get(),
            });
        self.execute_unit(request).await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn remove_from_cart(&self, product_id: &ProductId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &["cart", product_id.as_str()])?;
        self.execute_unit(request).await
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &["cart"])?;
        self.execute_unit(request).await
    }
}
