//! Cart synchronizer driven over HTTP against the fake API.
//!
//! Run with: cargo test -p emporium-integration-tests --test cart_sync

use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;

use emporium_core::ProductId;
use emporium_integration_tests::{FakeShop, StatusCode};
use emporium_storefront::{
    CartApi, CartSynchronizer, MutationOutcome, Notification, NotificationLevel, Notifier,
};

#[derive(Default)]
struct Recorder(Mutex<Vec<Notification>>);

impl Recorder {
    fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl Notifier for Recorder {
    fn notify(&self, notification: Notification) {
        self.0.lock().unwrap().push(notification);
    }
}

async fn setup() -> (FakeShop, CartSynchronizer, Arc<Recorder>) {
    let shop = FakeShop::start().await;
    shop.seed_catalog();
    let recorder = Arc::new(Recorder::default());
    let cart = CartSynchronizer::new(Arc::new(shop.customer_client()), recorder.clone());
    (shop, cart, recorder)
}

fn qty(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap()
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_refresh_of_new_session_is_empty() {
    let (shop, cart, recorder) = setup().await;

    cart.refresh().await;

    assert!(cart.items().is_empty());
    assert_eq!(cart.total_price(), Decimal::ZERO);
    assert!(cart.snapshot().is_loaded());
    assert!(!cart.is_loading());
    assert_eq!(shop.hit_count("GET /cart"), 1);
    assert!(recorder.take().is_empty());
}

#[tokio::test]
async fn test_unauthorized_fetch_degrades_to_empty_silently() {
    let shop = FakeShop::start().await;
    shop.seed_catalog();
    let recorder = Arc::new(Recorder::default());
    let cart = CartSynchronizer::new(Arc::new(shop.anonymous_client()), recorder.clone());

    cart.refresh().await;

    assert!(cart.items().is_empty());
    assert!(cart.snapshot().is_loaded());
    assert!(recorder.take().is_empty());
    assert_eq!(shop.hit_count("GET /cart"), 1);
}

#[tokio::test]
async fn test_server_total_is_ignored_in_favor_of_items() {
    let (shop, cart, _) = setup().await;
    let client = shop.customer_client();
    client
        .add_to_cart(&ProductId::new("p-pineapple"), qty(2))
        .await
        .unwrap();
    client
        .add_to_cart(&ProductId::new("p-mango"), qty(3))
        .await
        .unwrap();

    cart.refresh().await;

    assert_eq!(cart.total_price(), Decimal::new(35, 0));
    assert_eq!(cart.total_items(), 5);
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_add_item_refetches_authoritative_quantity() {
    let (shop, cart, recorder) = setup().await;
    let pineapple = shop
        .customer_client()
        .get_product(&ProductId::new("p-pineapple"))
        .await
        .unwrap();

    let outcome = cart.add_item(&pineapple, qty(2)).await;

    assert_eq!(outcome, MutationOutcome::Applied);
    let items = cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id(), &pineapple.id);
    assert_eq!(items[0].quantity.get(), 2);
    assert_eq!(
        shop.hits(),
        vec!["GET /products/p-pineapple", "POST /cart", "GET /cart"]
    );

    let seen = recorder.take();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].title, "Cart updated");
}

#[tokio::test]
async fn test_adding_twice_follows_server_merge() {
    let (shop, cart, _) = setup().await;
    let pineapple = shop
        .customer_client()
        .get_product(&ProductId::new("p-pineapple"))
        .await
        .unwrap();

    let _ = cart.add_one(&pineapple).await;
    let _ = cart.add_item(&pineapple, qty(2)).await;

    let items = cart.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity.get(), 3);
    assert_eq!(shop.cart_quantity("p-pineapple"), Some(3));
}

#[tokio::test]
async fn test_update_quantity_patches_by_product_id() {
    let (shop, cart, _) = setup().await;
    shop.customer_client()
        .add_to_cart(&ProductId::new("p-mango"), qty(1))
        .await
        .unwrap();

    let outcome = cart.update_quantity(&ProductId::new("p-mango"), 3).await;

    assert!(outcome.is_applied());
    assert_eq!(shop.hit_count("PATCH /cart/p-mango"), 1);
    assert_eq!(cart.items()[0].quantity.get(), 3);
    assert_eq!(cart.total_price(), Decimal::new(15, 0));
}

#[tokio::test]
async fn test_update_to_zero_deletes_instead_of_patching() {
    let (shop, cart, recorder) = setup().await;
    shop.customer_client()
        .add_to_cart(&ProductId::new("p-mango"), qty(2))
        .await
        .unwrap();

    let outcome = cart.update_quantity(&ProductId::new("p-mango"), 0).await;

    assert!(outcome.is_applied());
    assert_eq!(shop.hit_count("PATCH /cart/p-mango"), 0);
    assert_eq!(shop.hit_count("DELETE /cart/p-mango"), 1);
    assert_eq!(shop.cart_quantity("p-mango"), None);
    assert!(cart.items().is_empty());
    assert_eq!(recorder.take()[0].title, "Item removed");
}

#[tokio::test]
async fn test_insufficient_stock_keeps_view_and_reports_server_message() {
    let (shop, cart, recorder) = setup().await;
    let mango = shop
        .customer_client()
        .get_product(&ProductId::new("p-mango"))
        .await
        .unwrap();
    let _ = cart.add_item(&mango, qty(2)).await;
    let before = cart.snapshot();
    recorder.take();

    let outcome = cart.update_quantity(&mango.id, 10).await;

    assert_eq!(outcome, MutationOutcome::Failed);
    assert_eq!(cart.snapshot(), before);
    assert_eq!(shop.cart_quantity("p-mango"), Some(2));
    let seen = recorder.take();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].level, NotificationLevel::Error);
    assert_eq!(seen[0].title, "Failed to update cart");
    assert_eq!(seen[0].description.as_deref(), Some("Insufficient stock"));
}

#[tokio::test]
async fn test_transport_style_failure_uses_generic_message() {
    let (shop, cart, recorder) = setup().await;
    shop.fail_next(StatusCode::INTERNAL_SERVER_ERROR, None);

    let outcome = cart.clear().await;

    assert_eq!(outcome, MutationOutcome::Failed);
    let seen = recorder.take();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].title, "Failed to clear cart");
    assert_eq!(seen[0].description.as_deref(), Some("Something went wrong"));
    assert_eq!(shop.hit_count("GET /cart"), 0);
}

#[tokio::test]
async fn test_no_content_acknowledgements_count_as_applied() {
    let (shop, cart, recorder) = setup().await;
    shop.acknowledge_without_body();
    let pineapple = shop
        .customer_client()
        .get_product(&ProductId::new("p-pineapple"))
        .await
        .unwrap();

    assert_eq!(cart.add_item(&pineapple, qty(2)).await, MutationOutcome::Applied);
    assert_eq!(cart.total_items(), 2);
    assert_eq!(
        cart.update_quantity(&pineapple.id, 3).await,
        MutationOutcome::Applied
    );
    assert_eq!(cart.total_items(), 3);

    let outcome = cart.clear().await;

    assert_eq!(outcome, MutationOutcome::Applied);
    assert!(cart.items().is_empty());
    assert_eq!(shop.hit_count("GET /cart"), 3);
    let titles: Vec<String> = recorder.take().into_iter().map(|n| n.title).collect();
    assert_eq!(titles, ["Cart updated", "Cart updated", "Cart cleared"]);
}

#[tokio::test]
async fn test_oversized_prices_saturate_totals() {
    let (shop, cart, _) = setup().await;
    shop.seed_product("p-yacht", "Gold Yacht", 1e27, 1000, None);
    let yacht = shop
        .customer_client()
        .get_product(&ProductId::new("p-yacht"))
        .await
        .unwrap();

    let _ = cart.add_item(&yacht, qty(100)).await;

    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.total_price(), Decimal::MAX);
    assert_eq!(cart.summary().total, Decimal::MAX);
}

#[tokio::test]
async fn test_removing_absent_item_reports_once() {
    let (_shop, cart, recorder) = setup().await;

    let outcome = cart.remove_item(&ProductId::new("p-unknown")).await;

    assert_eq!(outcome, MutationOutcome::Failed);
    let seen = recorder.take();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].title, "Failed to remove item");
    assert_eq!(seen[0].description.as_deref(), Some("Cart item not found"));
}

#[tokio::test]
async fn test_clear_empties_view_and_total() {
    let (shop, cart, recorder) = setup().await;
    let client = shop.customer_client();
    client
        .add_to_cart(&ProductId::new("p-pineapple"), qty(1))
        .await
        .unwrap();
    client
        .add_to_cart(&ProductId::new("p-basket"), qty(1))
        .await
        .unwrap();
    cart.refresh().await;
    assert_eq!(cart.items().len(), 2);

    let outcome = cart.clear().await;

    assert!(outcome.is_applied());
    assert!(cart.items().is_empty());
    assert_eq!(cart.total_price(), Decimal::ZERO);
    assert_eq!(recorder.take()[0].title, "Cart cleared");
}

#[tokio::test]
async fn test_rapid_increments_settle_on_last_refetch() {
    let (shop, cart, _) = setup().await;
    let pineapple = shop
        .customer_client()
        .get_product(&ProductId::new("p-pineapple"))
        .await
        .unwrap();

    let outcomes = tokio::join!(
        cart.add_one(&pineapple),
        cart.add_one(&pineapple),
        cart.add_one(&pineapple),
        cart.add_one(&pineapple),
    );

    assert!(outcomes.0.is_applied() && outcomes.3.is_applied());
    assert_eq!(shop.cart_quantity("p-pineapple"), Some(4));
    cart.refresh().await;
    assert_eq!(cart.items()[0].quantity.get(), 4);
    assert!(!cart.is_loading());
}

#[tokio::test]
async fn test_summary_applies_shipping_threshold() {
    let (shop, cart, _) = setup().await;
    let client = shop.customer_client();
    client
        .add_to_cart(&ProductId::new("p-basket"), qty(1))
        .await
        .unwrap();
    cart.refresh().await;

    let summary = cart.summary();
    assert_eq!(summary.subtotal, Decimal::new(450, 0));
    assert_eq!(summary.shipping, Decimal::new(25, 0));

    let _ = cart.update_quantity(&ProductId::new("p-basket"), 2).await;
    let summary = cart.summary();
    assert_eq!(summary.subtotal, Decimal::new(900, 0));
    assert!(summary.free_shipping());
    assert_eq!(summary.estimated_tax, Decimal::new(90, 0));
    assert_eq!(summary.total, Decimal::new(990, 0));
}
