//! Checkout handoff to the payment provider.
//!
//! `begin` turns the server-side cart into an order and asks for a payment
//! page; `complete` verifies the reference the provider redirected back with.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use emporium_core::{Order, OrderId, PaymentRedirect, PaymentReference, PaymentStatus};

use crate::api::ApiError;
use crate::cart::CartSynchronizer;
use crate::notify::{Notification, Notifier};

/// Order and payment endpoints checkout depends on.
#[async_trait]
pub trait CheckoutApi: Send + Sync {
    /// `POST /orders`: place an order from the session's cart.
    async fn create_order(&self) -> Result<Order, ApiError>;

    /// `POST /payments/initialize`.
    async fn initialize_payment(&self, order_id: &OrderId) -> Result<PaymentRedirect, ApiError>;

    /// `GET /payments/verify?reference=`.
    async fn verify_payment(&self, reference: &PaymentReference) -> Result<PaymentStatus, ApiError>;
}

/// Why checkout stopped.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("payment reference is missing")]
    MissingReference,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CheckoutError {
    fn description(&self) -> Option<String> {
        match self {
            Self::EmptyCart => Some("Your cart is empty".to_string()),
            Self::MissingReference => Some("No payment reference was provided".to_string()),
            Self::Api(error) => error.server_message().map(str::to_string),
        }
    }
}

/// A verified payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
    pub reference: PaymentReference,
    pub status: PaymentStatus,
}

impl CheckoutReceipt {
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self.status, PaymentStatus::Success)
    }
}

/// Drives checkout against the API and the shared cart.
#[derive(Clone)]
pub struct Checkout {
    api: Arc<dyn CheckoutApi>,
    cart: CartSynchronizer,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for Checkout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkout")
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}

impl Checkout {
    #[must_use]
    pub fn new(
        api: Arc<dyn CheckoutApi>,
        cart: CartSynchronizer,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            cart,
            notifier,
        }
    }

    /// Place an order for the current cart and get the payment page for it.
    ///
    /// The cart is refetched first so an empty cart is caught locally.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] without calling the order endpoint,
    /// or the API error that stopped checkout (including a failed cart read).
    /// The user has been notified.
    #[instrument(skip(self))]
    pub async fn begin(&self) -> Result<PaymentRedirect, CheckoutError> {
        if let Err(error) = self.cart.try_refresh().await {
            return Err(self.fail("Checkout failed", error.into()));
        }
        if self.cart.snapshot().is_empty() {
            return Err(self.fail("Checkout failed", CheckoutError::EmptyCart));
        }

        let redirect = match self.place_order().await {
            Ok(redirect) => redirect,
            Err(error) => return Err(self.fail("Checkout failed", error.into())),
        };

        info!(reference = %redirect.reference, "Checkout started");
        Ok(redirect)
    }

    async fn place_order(&self) -> Result<PaymentRedirect, ApiError> {
        let order = self.api.create_order().await?;
        info!(order_id = %order.id, total = %order.total_amount, "Order created");
        self.api.initialize_payment(&order.id).await
    }

    /// Verify the payment the provider redirected back with.
    ///
    /// A successful payment clears the cart. A declined one is returned as a
    /// receipt with [`PaymentStatus::Failed`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingReference`] for a blank reference, or
    /// the API error from verification. The user has been notified.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn complete(
        &self,
        reference: &PaymentReference,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        if reference.as_str().trim().is_empty() {
            return Err(self.fail("Payment failed", CheckoutError::MissingReference));
        }

        let status = match self.api.verify_payment(reference).await {
            Ok(status) => status,
            Err(error) => return Err(self.fail("Payment failed", error.into())),
        };

        let receipt = CheckoutReceipt {
            reference: reference.clone(),
            status,
        };

        if receipt.is_paid() {
            // The clear reports its own failure; the payment already went through.
            let _ = self.cart.clear().await;
            self.notifier
                .notify(Notification::success("Payment successful"));
        } else {
            warn!("Payment was not successful");
            self.notifier.notify(Notification::error(
                "Payment failed",
                Some("Your payment could not be verified"),
            ));
        }

        Ok(receipt)
    }

    fn fail(&self, title: &str, error: CheckoutError) -> CheckoutError {
        warn!(error = %error, "{title}");
        self.notifier
            .notify(Notification::error(title, error.description().as_deref()));
        error
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;
    use std::sync::Mutex;

    use emporium_core::{CartItem, CartItemId, OrderStatus, Product, ProductId};
    use rust_decimal::Decimal;

    use super::*;
    use crate::cart::CartApi;
    use crate::notify::NotificationLevel;

    #[derive(Default)]
    struct FakeShop {
        state: Mutex<ShopState>,
    }

    #[derive(Default)]
    struct ShopState {
        lines: Vec<CartItem>,
        orders_created: usize,
        paid_references: Vec<String>,
        fail_order: bool,
        signed_out: bool,
    }

    impl FakeShop {
        fn with_line() -> Self {
            let shop = Self::default();
            shop.state.lock().unwrap().lines.push(CartItem {
                id: CartItemId::new("line-1"),
                product: Product {
                    id: ProductId::new("p1"),
                    name: "Pineapple".to_string(),
                    description: None,
                    price: Decimal::new(12, 0),
                    stock: 4,
                    category: None,
                    image_url: None,
                    created_at: None,
                    updated_at: None,
                },
                quantity: NonZeroU32::new(2).unwrap(),
            });
            shop
        }
    }

    #[async_trait]
    impl CartApi for FakeShop {
        async fn fetch_cart(&self) -> Result<Vec<CartItem>, ApiError> {
            let state = self.state.lock().unwrap();
            if state.signed_out {
                return Err(ApiError::Unauthorized(Some("Please log in".to_string())));
            }
            Ok(state.lines.clone())
        }

        async fn add_to_cart(&self, _: &ProductId, _: NonZeroU32) -> Result<(), ApiError> {
            Ok(())
        }

        async fn set_quantity(&self, _: &ProductId, _: NonZeroU32) -> Result<(), ApiError> {
            Ok(())
        }

        async fn remove_from_cart(&self, _: &ProductId) -> Result<(), ApiError> {
            Ok(())
        }

        async fn clear_cart(&self) -> Result<(), ApiError> {
            self.state.lock().unwrap().lines.clear();
            Ok(())
        }
    }

    #[async_trait]
    impl CheckoutApi for FakeShop {
        async fn create_order(&self) -> Result<Order, ApiError> {
            let mut state = self.state.lock().unwrap();
            if state.fail_order {
                return Err(ApiError::Status {
                    status: 400,
                    message: Some("Insufficient stock for Pineapple".to_string()),
                });
            }
            state.orders_created += 1;
            Ok(Order {
                id: OrderId::new("order-1"),
                customer: None,
                items: Vec::new(),
                total_amount: Decimal::new(24, 0),
                status: OrderStatus::Pending,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            })
        }

        async fn initialize_payment(&self, order_id: &OrderId) -> Result<PaymentRedirect, ApiError> {
            Ok(PaymentRedirect {
                authorization_url: format!("https://pay.example.com/{order_id}"),
                access_code: "code".to_string(),
                reference: PaymentReference::new("ref-1"),
            })
        }

        async fn verify_payment(
            &self,
            reference: &PaymentReference,
        ) -> Result<PaymentStatus, ApiError> {
            let paid = self
                .state
                .lock()
                .unwrap()
                .paid_references
                .iter()
                .any(|r| r == reference.as_str());
            Ok(if paid {
                PaymentStatus::Success
            } else {
                PaymentStatus::Failed
            })
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Notification>>);

    impl Notifier for Recorder {
        fn notify(&self, notification: Notification) {
            self.0.lock().unwrap().push(notification);
        }
    }

    fn checkout(shop: FakeShop) -> (Checkout, Arc<FakeShop>, Arc<Recorder>) {
        let shop = Arc::new(shop);
        let recorder = Arc::new(Recorder::default());
        let cart = CartSynchronizer::new(shop.clone(), recorder.clone());
        (
            Checkout::new(shop.clone(), cart, recorder.clone()),
            shop,
            recorder,
        )
    }

    #[tokio::test]
    async fn test_begin_returns_payment_redirect() {
        let (checkout, shop, recorder) = checkout(FakeShop::with_line());

        let redirect = checkout.begin().await.unwrap();

        assert_eq!(redirect.authorization_url, "https://pay.example.com/order-1");
        assert_eq!(shop.state.lock().unwrap().orders_created, 1);
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_begin_with_empty_cart_fails_locally() {
        let (checkout, shop, recorder) = checkout(FakeShop::default());

        let error = checkout.begin().await.unwrap_err();

        assert!(matches!(error, CheckoutError::EmptyCart));
        assert_eq!(shop.state.lock().unwrap().orders_created, 0);
        let seen = recorder.0.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].title, "Checkout failed");
    }

    #[tokio::test]
    async fn test_begin_surfaces_cart_read_failure() {
        let shop = FakeShop::with_line();
        shop.state.lock().unwrap().signed_out = true;
        let (checkout, shop, recorder) = checkout(shop);

        let error = checkout.begin().await.unwrap_err();

        assert!(matches!(error, CheckoutError::Api(ApiError::Unauthorized(_))));
        assert_eq!(shop.state.lock().unwrap().orders_created, 0);
        let seen = recorder.0.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].description.as_deref(), Some("Please log in"));
    }

    #[tokio::test]
    async fn test_begin_surfaces_server_message() {
        let shop = FakeShop::with_line();
        shop.state.lock().unwrap().fail_order = true;
        let (checkout, _, recorder) = checkout(shop);

        let error = checkout.begin().await.unwrap_err();

        assert!(matches!(error, CheckoutError::Api(_)));
        let seen = recorder.0.lock().unwrap();
        assert_eq!(
            seen[0].description.as_deref(),
            Some("Insufficient stock for Pineapple")
        );
    }

    #[tokio::test]
    async fn test_complete_paid_clears_cart() {
        let shop = FakeShop::with_line();
        shop.state.lock().unwrap().paid_references.push("ref-1".to_string());
        let (checkout, shop, recorder) = checkout(shop);

        let receipt = checkout
            .complete(&PaymentReference::new("ref-1"))
            .await
            .unwrap();

        assert!(receipt.is_paid());
        assert!(shop.state.lock().unwrap().lines.is_empty());
        let seen = recorder.0.lock().unwrap();
        assert_eq!(seen.last().map(|n| n.title.as_str()), Some("Payment successful"));
        assert!(seen.iter().any(|n| n.title == "Cart cleared"));
    }

    #[tokio::test]
    async fn test_complete_declined_keeps_cart() {
        let (checkout, shop, recorder) = checkout(FakeShop::with_line());

        let receipt = checkout
            .complete(&PaymentReference::new("ref-unknown"))
            .await
            .unwrap();

        assert!(!receipt.is_paid());
        assert_eq!(shop.state.lock().unwrap().lines.len(), 1);
        let seen = recorder.0.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].level, NotificationLevel::Error);
        assert_eq!(seen[0].title, "Payment failed");
    }

    #[tokio::test]
    async fn test_complete_rejects_blank_reference() {
        let (checkout, _, _) = checkout(FakeShop::with_line());
        let error = checkout
            .complete(&PaymentReference::new("  "))
            .await
            .unwrap_err();
        assert!(matches!(error, CheckoutError::MissingReference));
    }
}
