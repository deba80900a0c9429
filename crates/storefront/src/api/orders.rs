//! Order, payment and admin endpoints.

use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use emporium_core::{
    DashboardStats, Order, OrderId, OrderStatus, PaymentRedirect, PaymentReference, PaymentStatus,
};

use super::wire::{
    InitializePaymentBody, OrderData, OrderListData, OrderStatusBody, WirePaymentInit, WireStats,
    convert_orders,
};
use super::{ApiClient, ApiError};
use crate::checkout::CheckoutApi;

impl ApiClient {
    // =========================================================================
    // Shopper
    // =========================================================================

    /// Place an order from the session's current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the order or the payload is invalid.
    #[instrument(skip(self))]
    pub async fn create_order(&self) -> Result<Order, ApiError> {
        let request = self.request(Method::POST, &["orders"])?;
        let data = self
            .execute::<OrderData>(request)
            .await?
            .into_data("order")?;
        Ok(Order::try_from(data.order)?)
    }

    /// Orders placed by the current session's user, newest first as served.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        let request = self.request(Method::GET, &["orders"])?;
        let data = self
            .execute::<OrderListData>(request)
            .await?
            .into_data("orders")?;
        Ok(convert_orders(data.orders))
    }

    /// Ask the payment provider for a checkout URL for `order_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the redirect is malformed.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn initialize_payment(&self, order_id: &OrderId) -> Result<PaymentRedirect, ApiError> {
        let request = self
            .request(Method::POST, &["payments", "initialize"])?
            .json(&InitializePaymentBody {
                order_id: order_id.as_str(),
            });
        let data = self
            .execute::<WirePaymentInit>(request)
            .await?
            .into_data("payment")?;
        Ok(PaymentRedirect::try_from(data)?)
    }

    /// Check a payment reference returned by the provider's redirect.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails. A declined payment is
    /// `Ok(PaymentStatus::Failed)`, not an error.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn verify_payment(
        &self,
        reference: &PaymentReference,
    ) -> Result<PaymentStatus, ApiError> {
        let request = self
            .request(Method::GET, &["payments", "verify"])?
            .query(&[("reference", reference.as_str())]);
        let envelope = self.execute::<serde::de::IgnoredAny>(request).await?;
        Ok(PaymentStatus::from_envelope_status(&envelope.status))
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Every order in the store.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for non-admin sessions.
    #[instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<Order>, ApiError> {
        let request = self.request(Method::GET, &["orders", "all-orders"])?;
        let data = self
            .execute::<OrderListData>(request)
            .await?
            .into_data("orders")?;
        Ok(convert_orders(data.orders))
    }

    /// Move an order to `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the transition.
    #[instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PATCH, &["orders", order_id.as_str()])?
            .json(&OrderStatusBody { status });
        self.execute_unit(request).await
    }

    /// Store-wide dashboard figures.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for non-admin sessions.
    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        let request = self.request(Method::GET, &["stats", "dashboard"])?;
        let data = self
            .execute::<WireStats>(request)
            .await?
            .into_data("stats")?;
        Ok(data.into())
    }
}

#[async_trait]
impl CheckoutApi for ApiClient {
    async fn create_order(&self) -> Result<Order, ApiError> {
        Self::create_order(self).await
    }

    async fn initialize_payment(&self, order_id: &OrderId) -> Result<PaymentRedirect, ApiError> {
        Self::initialize_payment(self, order_id).await
    }

    async fn verify_payment(&self, reference: &PaymentReference) -> Result<PaymentStatus, ApiError> {
        Self::verify_payment(self, reference).await
    }
}
