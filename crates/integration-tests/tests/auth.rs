//! Account endpoints and admin product creation against the fake API.
//!
//! Run with: cargo test -p emporium-integration-tests --test auth

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};

use emporium_core::UserRole;
use emporium_integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, CUSTOMER_EMAIL, CUSTOMER_PASSWORD, CUSTOMER_TOKEN, FakeShop,
    Upload,
};
use emporium_storefront::api::{NewProduct, ProductImage, ProductQuery};
use emporium_storefront::{ApiError, Credentials, NewAccount, PasswordChange};

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

fn new_product() -> NewProduct {
    NewProduct {
        name: "Dragon Fruit".to_string(),
        description: "Bright pink and mildly sweet".to_string(),
        price: Decimal::new(750, 2),
        stock: 8,
        category: "fruit".to_string(),
        image: ProductImage {
            file_name: "dragon.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        },
    }
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test]
async fn test_login_returns_token_for_the_account() {
    let shop = FakeShop::start().await;

    let auth = shop
        .anonymous_client()
        .login(&Credentials::new(ADMIN_EMAIL, secret(ADMIN_PASSWORD)))
        .await
        .unwrap();

    assert_eq!(auth.user.email, ADMIN_EMAIL);
    assert_eq!(auth.user.role, UserRole::Admin);
    let token = auth.token.unwrap();
    let me = shop
        .anonymous_client()
        .with_token(token)
        .me()
        .await
        .unwrap();
    assert!(me.is_admin());
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let shop = FakeShop::start().await;

    let error = shop
        .anonymous_client()
        .login(&Credentials::new(CUSTOMER_EMAIL, secret("not-it")))
        .await
        .unwrap_err();

    assert!(error.is_unauthorized());
    assert_eq!(error.server_message(), Some("Invalid email or password"));
}

#[tokio::test]
async fn test_invalid_login_form_sends_nothing() {
    let shop = FakeShop::start().await;

    let error = shop
        .anonymous_client()
        .login(&Credentials::new("not-an-email", secret(CUSTOMER_PASSWORD)))
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::InvalidInput(_)));
    assert!(shop.hits().is_empty());
}

#[tokio::test]
async fn test_signup_creates_customer_session() {
    let shop = FakeShop::start().await;
    let account = NewAccount {
        name: "Jane Smith".to_string(),
        email: "jane.smith@example.com".to_string(),
        password: secret("sunshine-42"),
        phone: Some("+44 20 7946 0000".to_string()),
        address: None,
    };

    let auth = shop.anonymous_client().signup(&account).await.unwrap();

    assert_eq!(auth.user.role, UserRole::Customer);
    assert_eq!(auth.user.phone.as_deref(), Some("+44 20 7946 0000"));
    let token = auth.token.unwrap();
    assert!(shop.token_is_active(token.expose_secret()));

    let error = shop.anonymous_client().signup(&account).await.unwrap_err();
    assert_eq!(error.server_message(), Some("User already exists"));
}

#[tokio::test]
async fn test_me_without_session_is_unauthorized() {
    let shop = FakeShop::start().await;
    let error = shop.anonymous_client().me().await.unwrap_err();
    assert!(error.is_unauthorized());
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let shop = FakeShop::start().await;
    let client = shop.customer_client();
    assert_eq!(client.me().await.unwrap().email, CUSTOMER_EMAIL);

    client.logout().await.unwrap();

    assert!(!shop.token_is_active(CUSTOMER_TOKEN));
    assert!(client.me().await.unwrap_err().is_unauthorized());
}

#[tokio::test]
async fn test_logout_acknowledged_without_body() {
    let shop = FakeShop::start().await;
    shop.acknowledge_without_body();

    shop.customer_client().logout().await.unwrap();

    assert!(!shop.token_is_active(CUSTOMER_TOKEN));
}

#[tokio::test]
async fn test_change_password_then_login_with_new_one() {
    let shop = FakeShop::start().await;
    let client = shop.customer_client();

    let error = client
        .change_password(&PasswordChange {
            old_password: secret("wrong-guess"),
            new_password: secret("mango-season"),
        })
        .await
        .unwrap_err();
    assert_eq!(error.server_message(), Some("Current password is incorrect"));

    client
        .change_password(&PasswordChange {
            old_password: secret(CUSTOMER_PASSWORD),
            new_password: secret("mango-season"),
        })
        .await
        .unwrap();

    let anonymous = shop.anonymous_client();
    assert!(
        anonymous
            .login(&Credentials::new(CUSTOMER_EMAIL, secret(CUSTOMER_PASSWORD)))
            .await
            .is_err()
    );
    assert!(
        anonymous
            .login(&Credentials::new(CUSTOMER_EMAIL, secret("mango-season")))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_short_new_password_is_rejected_locally() {
    let shop = FakeShop::start().await;

    let error = shop
        .customer_client()
        .change_password(&PasswordChange {
            old_password: secret(CUSTOMER_PASSWORD),
            new_password: secret("abc"),
        })
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::InvalidInput(_)));
    assert_eq!(shop.hit_count("PATCH /auth/change-password"), 0);
}

// ============================================================================
// Product creation
// ============================================================================

#[tokio::test]
async fn test_admin_creates_product_with_image() {
    let shop = FakeShop::start().await;
    shop.seed_catalog();
    let client = shop.admin_client();
    assert_eq!(client.list_products(&ProductQuery::default()).await.unwrap().len(), 3);

    let product = client.create_product(new_product()).await.unwrap();

    assert_eq!(product.name, "Dragon Fruit");
    assert_eq!(product.price, Decimal::new(75, 1));
    assert_eq!(product.stock, 8);
    assert_eq!(
        shop.uploads(),
        [Upload {
            file_name: Some("dragon.png".to_string()),
            content_type: Some("image/png".to_string()),
            len: 4,
        }]
    );

    // The cached listing was dropped, so the new product shows up.
    let products = client.list_products(&ProductQuery::default()).await.unwrap();
    assert_eq!(products.len(), 4);
    assert_eq!(shop.hit_count("GET /products"), 2);
}

#[tokio::test]
async fn test_customer_cannot_create_products() {
    let shop = FakeShop::start().await;

    let error = shop
        .customer_client()
        .create_product(new_product())
        .await
        .unwrap_err();

    assert!(error.is_unauthorized());
    assert!(shop.uploads().is_empty());
}

#[tokio::test]
async fn test_incomplete_product_form_sends_nothing() {
    let shop = FakeShop::start().await;
    let mut product = new_product();
    product.category = "  ".to_string();

    let error = shop.admin_client().create_product(product).await.unwrap_err();

    assert_eq!(error.server_message(), Some("Category is required"));
    assert!(shop.hits().is_empty());
}
