//! Integration tests for Emporium.
//!
//! [`FakeShop`] serves an in-memory copy of the REST API on an ephemeral port
//! so the real `ApiClient`, `CartSynchronizer` and `Checkout` can be driven
//! over HTTP without any external service.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p emporium-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_sync` - Cart synchronizer against the HTTP cart endpoints
//! - `catalog` - Product reads and caching
//! - `checkout` - Order placement and payment verification
//! - `admin` - Admin-only endpoints and authorization
//! - `auth` - Signup, login, session lookup, logout and password change

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

use emporium_storefront::{ApiClient, ApiConfig};

pub use axum::http::StatusCode;

/// Bearer token of the seeded customer.
pub const CUSTOMER_TOKEN: &str = "customer-session-7f3a";
/// Bearer token of the seeded admin.
pub const ADMIN_TOKEN: &str = "admin-session-c91e";

/// Login of the seeded customer.
pub const CUSTOMER_EMAIL: &str = "shopper@example.com";
pub const CUSTOMER_PASSWORD: &str = "pineapple-pass";
/// Login of the seeded admin.
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "basket-keeper";

const CUSTOMER_ID: &str = "user-customer";
const ADMIN_ID: &str = "user-admin";

const TIMESTAMP: &str = "2026-03-14T09:30:00Z";

// ============================================================================
// Server state
// ============================================================================

#[derive(Debug, Clone)]
struct FakeProduct {
    id: String,
    name: String,
    price: f64,
    stock: i64,
    category: Option<String>,
}

impl FakeProduct {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "description": format!("Fresh {}", self.name),
            "price": self.price,
            "stock": self.stock,
            "category": self.category,
            "imageUrl": format!("https://cdn.example.com/{}.jpg", self.id),
            "createdAt": TIMESTAMP,
            "updatedAt": TIMESTAMP,
        })
    }
}

fn line_amount(price: f64, quantity: i64) -> f64 {
    price * f64::from(i32::try_from(quantity).unwrap_or(i32::MAX))
}

#[derive(Debug, Clone)]
struct FakeAccount {
    id: String,
    name: String,
    email: String,
    password: String,
    role: &'static str,
    phone: Option<String>,
    address: Option<String>,
    tokens: Vec<String>,
}

impl FakeAccount {
    fn seeded(id: &str, name: &str, email: &str, password: &str, role: &'static str, token: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            role,
            phone: None,
            address: None,
            tokens: vec![token.to_owned()],
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "role": self.role,
            "phone": self.phone,
            "address": self.address,
            "createdAt": TIMESTAMP,
            "updatedAt": TIMESTAMP,
        })
    }
}

/// A product image received by `POST /products`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub len: usize,
}

#[derive(Debug, Clone)]
struct FakeLine {
    id: String,
    product_id: String,
    quantity: i64,
}

#[derive(Debug, Clone)]
struct FakeOrder {
    id: String,
    owner: String,
    owner_name: String,
    owner_email: String,
    lines: Vec<(FakeProduct, i64)>,
    status: String,
}

impl FakeOrder {
    fn total(&self) -> f64 {
        self.lines
            .iter()
            .map(|(product, quantity)| line_amount(product.price, *quantity))
            .sum()
    }

    fn to_json(&self) -> Value {
        let items: Vec<Value> = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, (product, quantity))| {
                json!({
                    "id": format!("{}-item-{i}", self.id),
                    "productId": product.id,
                    "quantity": quantity,
                    "price": product.price,
                    "product": product.to_json(),
                })
            })
            .collect();

        json!({
            "id": self.id,
            "user": {
                "id": self.owner,
                "name": self.owner_name,
                "email": self.owner_email,
            },
            "orderItems": items,
            "totalAmount": self.total(),
            "status": self.status,
            "createdAt": TIMESTAMP,
            "updatedAt": TIMESTAMP,
        })
    }
}

#[derive(Debug, Default)]
struct ShopState {
    accounts: Vec<FakeAccount>,
    products: Vec<FakeProduct>,
    uploads: Vec<Upload>,
    carts: HashMap<String, Vec<FakeLine>>,
    orders: Vec<FakeOrder>,
    payments: HashMap<String, String>,
    paid: HashSet<String>,
    fail_next: Option<(StatusCode, Option<String>)>,
    bare_acks: bool,
    hits: Vec<String>,
    next_id: u64,
}

impl ShopState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn product(&self, id: &str) -> Option<&FakeProduct> {
        self.products.iter().find(|p| p.id == id)
    }

    fn account(&self, id: &str) -> Option<&FakeAccount> {
        self.accounts.iter().find(|a| a.id == id)
    }

    fn account_by_token(&self, token: &str) -> Option<&FakeAccount> {
        self.accounts
            .iter()
            .find(|a| a.tokens.iter().any(|t| t == token))
    }

    fn cart_json(&self, owner: &str) -> Value {
        let lines = self.carts.get(owner).map_or(&[][..], Vec::as_slice);
        let mut total = 0.0;
        let cart: Vec<Value> = lines
            .iter()
            .filter_map(|line| {
                let product = self.product(&line.product_id)?;
                total += line_amount(product.price, line.quantity);
                Some(json!({
                    "id": line.id,
                    "quantity": line.quantity,
                    "productId": line.product_id,
                    "userId": owner,
                    "product": product.to_json(),
                }))
            })
            .collect();
        json!({ "cart": cart, "total": total })
    }
}

type Shared = Arc<Mutex<ShopState>>;

fn lock(shop: &Shared) -> MutexGuard<'_, ShopState> {
    shop.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// FakeShop
// ============================================================================

/// A running fake of the REST service. Shut down on drop.
pub struct FakeShop {
    base_url: Url,
    state: Shared,
    handle: JoinHandle<()>,
}

impl FakeShop {
    /// Bind to an ephemeral port and serve under `/api`.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        lock(&state).accounts = vec![
            FakeAccount::seeded(
                CUSTOMER_ID,
                "Test Shopper",
                CUSTOMER_EMAIL,
                CUSTOMER_PASSWORD,
                "CUSTOMER",
                CUSTOMER_TOKEN,
            ),
            FakeAccount::seeded(
                ADMIN_ID,
                "Store Admin",
                ADMIN_EMAIL,
                ADMIN_PASSWORD,
                "ADMIN",
                ADMIN_TOKEN,
            ),
        ];
        let app = Router::new().nest("/api", routes()).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake API listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url =
            Url::parse(&format!("http://{addr}/api")).expect("Fake API address is a valid URL");

        Self {
            base_url,
            state,
            handle,
        }
    }

    /// Base URL clients should be configured with.
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Client authenticated with `token`.
    pub fn client_with_token(&self, token: &str) -> ApiClient {
        self.anonymous_client()
            .with_token(SecretString::from(token.to_owned()))
    }

    /// Client for the seeded customer.
    pub fn customer_client(&self) -> ApiClient {
        self.client_with_token(CUSTOMER_TOKEN)
    }

    /// Client for the seeded admin.
    pub fn admin_client(&self) -> ApiClient {
        self.client_with_token(ADMIN_TOKEN)
    }

    /// Client that sends no token at all.
    pub fn anonymous_client(&self) -> ApiClient {
        ApiClient::new(&ApiConfig::new(self.base_url.clone()))
    }

    /// Add a product to the catalog.
    pub fn seed_product(&self, id: &str, name: &str, price: f64, stock: i64, category: Option<&str>) {
        lock(&self.state).products.push(FakeProduct {
            id: id.to_owned(),
            name: name.to_owned(),
            price,
            stock,
            category: category.map(str::to_owned),
        });
    }

    /// Seed the default catalog: two fruits and a basket.
    pub fn seed_catalog(&self) {
        self.seed_product("p-pineapple", "Golden Pineapple", 10.0, 20, Some("fruit"));
        self.seed_product("p-mango", "Alphonso Mango", 5.0, 3, Some("fruit"));
        self.seed_product("p-basket", "Gift Basket", 450.0, 5, Some("gifts"));
    }

    /// Rename a product server-side, as another admin might.
    pub fn rename_product(&self, id: &str, name: &str) {
        if let Some(product) = lock(&self.state).products.iter_mut().find(|p| p.id == id) {
            name.clone_into(&mut product.name);
        }
    }

    /// Make the next mutating request fail with `status` and `message`.
    pub fn fail_next(&self, status: StatusCode, message: Option<&str>) {
        lock(&self.state).fail_next = Some((status, message.map(str::to_owned)));
    }

    /// Answer successful cart mutations with a bare `204 No Content`.
    pub fn acknowledge_without_body(&self) {
        lock(&self.state).bare_acks = true;
    }

    /// Mark a payment reference as paid by the provider.
    pub fn mark_paid(&self, reference: &str) {
        lock(&self.state).paid.insert(reference.to_owned());
    }

    /// Server-side quantity of `product_id` in the customer's cart.
    pub fn cart_quantity(&self, product_id: &str) -> Option<i64> {
        lock(&self.state)
            .carts
            .get(CUSTOMER_ID)?
            .iter()
            .find(|l| l.product_id == product_id)
            .map(|l| l.quantity)
    }

    /// Requests served so far, as `"METHOD /path"` with ids left in.
    pub fn hits(&self) -> Vec<String> {
        lock(&self.state).hits.clone()
    }

    /// Number of requests matching `route` exactly.
    pub fn hit_count(&self, route: &str) -> usize {
        lock(&self.state).hits.iter().filter(|h| *h == route).count()
    }

    /// Images received with created products, oldest first.
    pub fn uploads(&self) -> Vec<Upload> {
        lock(&self.state).uploads.clone()
    }

    /// Whether `token` still identifies a session.
    pub fn token_is_active(&self, token: &str) -> bool {
        lock(&self.state).account_by_token(token).is_some()
    }

    /// Status of an order as stored server-side.
    pub fn order_status(&self, order_id: &str) -> Option<String> {
        lock(&self.state)
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .map(|o| o.status.clone())
    }
}

impl Drop for FakeShop {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// Routes
// ============================================================================

fn routes() -> Router<Shared> {
    Router::new()
        .route("/cart", get(fetch_cart).post(add_to_cart).delete(clear_cart))
        .route(
            "/cart/{product_id}",
            patch(set_quantity).delete(remove_from_cart),
        )
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
        .route("/auth/change-password", patch(change_password))
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", get(get_product))
        .route("/orders", get(my_orders).post(create_order))
        .route("/orders/all-orders", get(all_orders))
        .route("/orders/{id}", patch(update_order_status))
        .route("/payments/initialize", post(initialize_payment))
        .route("/payments/verify", get(verify_payment))
        .route("/stats/dashboard", get(dashboard_stats))
}

fn success(data: Value) -> Response {
    Json(json!({ "status": "success", "data": data })).into_response()
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "status": "error", "message": message }))).into_response()
}

/// Answer a successful mutation whose payload clients ignore.
fn acknowledged(state: &ShopState, status: StatusCode, message: &str) -> Response {
    if state.bare_acks {
        return StatusCode::NO_CONTENT.into_response();
    }
    (status, Json(json!({ "status": "success", "message": message }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Id of the account the bearer token belongs to.
fn session(state: &ShopState, headers: &HeaderMap) -> Result<String, Response> {
    bearer(headers)
        .and_then(|token| state.account_by_token(token))
        .map(|account| account.id.clone())
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Not authorized, no token"))
}

fn admin(state: &ShopState, headers: &HeaderMap) -> Result<String, Response> {
    let id = session(state, headers)?;
    if state.account(&id).is_none_or(|a| a.role != "ADMIN") {
        return Err(failure(StatusCode::FORBIDDEN, "Admin access required"));
    }
    Ok(id)
}

/// Record the request and consume an injected failure, if any.
fn enter(state: &mut ShopState, route: String, mutating: bool) -> Result<(), Response> {
    state.hits.push(route);
    if mutating && let Some((status, message)) = state.fail_next.take() {
        return Err(match message {
            Some(message) => failure(status, &message),
            None => (status, Json(json!({ "status": "error" }))).into_response(),
        });
    }
    Ok(())
}

// ---- cart -------------------------------------------------------------------

async fn fetch_cart(State(shop): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "GET /cart".to_owned(), false) {
        return response;
    }
    match session(&state, &headers) {
        Ok(owner) => success(state.cart_json(&owner)),
        Err(response) => response,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddBody {
    product_id: String,
    quantity: i64,
}

async fn add_to_cart(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<AddBody>,
) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "POST /cart".to_owned(), true) {
        return response;
    }
    let owner = match session(&state, &headers) {
        Ok(owner) => owner,
        Err(response) => return response,
    };
    let Some(stock) = state.product(&body.product_id).map(|p| p.stock) else {
        return failure(StatusCode::NOT_FOUND, "Product not found");
    };

    let line_id = state.next_id("line");
    let lines = state.carts.entry(owner).or_default();
    let current = lines
        .iter()
        .find(|l| l.product_id == body.product_id)
        .map_or(0, |l| l.quantity);
    if current + body.quantity > stock {
        return failure(StatusCode::BAD_REQUEST, "Insufficient stock");
    }

    match lines.iter_mut().find(|l| l.product_id == body.product_id) {
        Some(line) => line.quantity += body.quantity,
        None => lines.push(FakeLine {
            id: line_id,
            product_id: body.product_id,
            quantity: body.quantity,
        }),
    }
    acknowledged(&state, StatusCode::CREATED, "Item added to cart")
}

#[derive(Deserialize)]
struct QuantityBody {
    quantity: i64,
}

async fn set_quantity(
    State(shop): State<Shared>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<QuantityBody>,
) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, format!("PATCH /cart/{product_id}"), true) {
        return response;
    }
    let owner = match session(&state, &headers) {
        Ok(owner) => owner,
        Err(response) => return response,
    };
    if body.quantity < 1 {
        return failure(StatusCode::BAD_REQUEST, "Quantity must be at least 1");
    }
    let stock = state.product(&product_id).map_or(0, |p| p.stock);
    let Some(line) = state
        .carts
        .get_mut(&owner)
        .and_then(|lines| lines.iter_mut().find(|l| l.product_id == product_id))
    else {
        return failure(StatusCode::NOT_FOUND, "Cart item not found");
    };
    if body.quantity > stock {
        return failure(StatusCode::BAD_REQUEST, "Insufficient stock");
    }
    line.quantity = body.quantity;
    acknowledged(&state, StatusCode::OK, "Cart updated")
}

async fn remove_from_cart(
    State(shop): State<Shared>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, format!("DELETE /cart/{product_id}"), true) {
        return response;
    }
    let owner = match session(&state, &headers) {
        Ok(owner) => owner,
        Err(response) => return response,
    };
    let lines = state.carts.entry(owner).or_default();
    let before = lines.len();
    lines.retain(|l| l.product_id != product_id);
    if lines.len() == before {
        return failure(StatusCode::NOT_FOUND, "Cart item not found");
    }
    acknowledged(&state, StatusCode::OK, "Item removed from cart")
}

async fn clear_cart(State(shop): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "DELETE /cart".to_owned(), true) {
        return response;
    }
    match session(&state, &headers) {
        Ok(owner) => {
            state.carts.remove(&owner);
            acknowledged(&state, StatusCode::OK, "Cart cleared")
        }
        Err(response) => response,
    }
}

// ---- accounts ---------------------------------------------------------------

#[derive(Deserialize)]
struct SignupRequest {
    name: String,
    email: String,
    password: String,
    phone: Option<String>,
    address: Option<String>,
}

async fn signup(State(shop): State<Shared>, Json(body): Json<SignupRequest>) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "POST /auth/signup".to_owned(), true) {
        return response;
    }
    if state.accounts.iter().any(|a| a.email == body.email) {
        return failure(StatusCode::BAD_REQUEST, "User already exists");
    }

    let token = state.next_id("session");
    let account = FakeAccount {
        id: state.next_id("user"),
        name: body.name,
        email: body.email,
        password: body.password,
        role: "CUSTOMER",
        phone: body.phone,
        address: body.address,
        tokens: vec![token.clone()],
    };
    let user = account.to_json();
    state.accounts.push(account);
    (
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": { "user": user, "token": token } })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(State(shop): State<Shared>, Json(body): Json<LoginRequest>) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "POST /auth/login".to_owned(), true) {
        return response;
    }
    let token = state.next_id("session");
    let Some(account) = state
        .accounts
        .iter_mut()
        .find(|a| a.email == body.email && a.password == body.password)
    else {
        return failure(StatusCode::UNAUTHORIZED, "Invalid email or password");
    };
    account.tokens.push(token.clone());
    success(json!({ "user": account.to_json(), "token": token }))
}

async fn me(State(shop): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "GET /auth/me".to_owned(), false) {
        return response;
    }
    match session(&state, &headers) {
        Ok(id) => match state.account(&id) {
            Some(account) => success(json!({ "user": account.to_json() })),
            None => failure(StatusCode::UNAUTHORIZED, "Not authorized, no token"),
        },
        Err(response) => response,
    }
}

async fn logout(State(shop): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "POST /auth/logout".to_owned(), true) {
        return response;
    }
    let Some(token) = bearer(&headers) else {
        return failure(StatusCode::UNAUTHORIZED, "Not authorized, no token");
    };
    for account in &mut state.accounts {
        account.tokens.retain(|t| t != token);
    }
    acknowledged(&state, StatusCode::OK, "Logged out successfully")
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
}

async fn change_password(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ChangePasswordRequest>,
) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "PATCH /auth/change-password".to_owned(), true) {
        return response;
    }
    let id = match session(&state, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Some(account) = state.accounts.iter_mut().find(|a| a.id == id) else {
        return failure(StatusCode::UNAUTHORIZED, "Not authorized, no token");
    };
    if account.password != body.old_password {
        return failure(StatusCode::BAD_REQUEST, "Current password is incorrect");
    }
    account.password = body.new_password;
    acknowledged(&state, StatusCode::OK, "Password changed successfully")
}

// ---- catalog ----------------------------------------------------------------

#[derive(Default)]
struct ProductForm {
    fields: HashMap<String, String>,
    image: Option<Upload>,
}

async fn read_product_form(mut multipart: Multipart) -> Result<ProductForm, Response> {
    let mut form = ProductForm::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(form),
            Err(e) => return Err(failure(StatusCode::BAD_REQUEST, &e.to_string())),
        };
        let name = field.name().unwrap_or_default().to_owned();
        if name == "image" {
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field.content_type().map(str::to_owned);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| failure(StatusCode::BAD_REQUEST, &e.to_string()))?;
            form.image = Some(Upload {
                file_name,
                content_type,
                len: bytes.len(),
            });
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| failure(StatusCode::BAD_REQUEST, &e.to_string()))?;
            form.fields.insert(name, text);
        }
    }
}

async fn create_product(
    State(shop): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    // Read the body before taking the lock; the guard must not cross an await.
    let form = read_product_form(multipart).await;

    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "POST /products".to_owned(), true) {
        return response;
    }
    if let Err(response) = admin(&state, &headers) {
        return response;
    }
    let form = match form {
        Ok(form) => form,
        Err(response) => return response,
    };

    let field = |key: &str| form.fields.get(key).cloned().unwrap_or_default();
    let (Ok(price), Ok(stock)) = (field("price").parse::<f64>(), field("stock").parse::<i64>())
    else {
        return failure(StatusCode::BAD_REQUEST, "Price and stock must be numbers");
    };
    let Some(image) = form.image.clone() else {
        return failure(StatusCode::BAD_REQUEST, "Image is required");
    };

    let category = Some(field("category")).filter(|c| !c.is_empty());
    let product = FakeProduct {
        id: state.next_id("p"),
        name: field("name"),
        price,
        stock,
        category,
    };
    let body = product.to_json();
    state.products.push(product);
    state.uploads.push(image);
    (
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": { "product": body } })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct ProductParams {
    search: Option<String>,
    category: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

async fn list_products(State(shop): State<Shared>, Query(params): Query<ProductParams>) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "GET /products".to_owned(), false) {
        return response;
    }
    let limit = params.limit.unwrap_or(usize::MAX);
    let skip = params.page.unwrap_or(1).saturating_sub(1).saturating_mul(limit);
    let products: Vec<Value> = state
        .products
        .iter()
        .filter(|p| {
            params.search.as_ref().is_none_or(|s| {
                p.name.to_lowercase().contains(&s.to_lowercase())
            })
        })
        .filter(|p| {
            params
                .category
                .as_ref()
                .is_none_or(|c| p.category.as_ref() == Some(c))
        })
        .skip(skip)
        .take(limit)
        .map(FakeProduct::to_json)
        .collect();
    success(json!({ "products": products }))
}

async fn get_product(State(shop): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, format!("GET /products/{id}"), false) {
        return response;
    }
    match state.product(&id) {
        Some(product) => success(json!({ "product": product.to_json() })),
        None => failure(StatusCode::NOT_FOUND, "Product not found"),
    }
}

// ---- orders & payments ------------------------------------------------------

async fn create_order(State(shop): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "POST /orders".to_owned(), true) {
        return response;
    }
    let owner = match session(&state, &headers) {
        Ok(owner) => owner,
        Err(response) => return response,
    };
    let lines: Vec<(FakeProduct, i64)> = state
        .carts
        .get(&owner)
        .map(|lines| {
            lines
                .iter()
                .filter_map(|l| Some((state.product(&l.product_id)?.clone(), l.quantity)))
                .collect()
        })
        .unwrap_or_default();
    if lines.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Cart is empty");
    }

    let (owner_name, owner_email) = state
        .account(&owner)
        .map(|a| (a.name.clone(), a.email.clone()))
        .unwrap_or_default();
    let order = FakeOrder {
        id: state.next_id("order"),
        owner,
        owner_name,
        owner_email,
        lines,
        status: "PENDING".to_owned(),
    };
    let body = order.to_json();
    state.orders.push(order);
    (
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": { "order": body } })),
    )
        .into_response()
}

async fn my_orders(State(shop): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "GET /orders".to_owned(), false) {
        return response;
    }
    let owner = match session(&state, &headers) {
        Ok(owner) => owner,
        Err(response) => return response,
    };
    let orders: Vec<Value> = state
        .orders
        .iter()
        .filter(|o| o.owner == owner)
        .map(FakeOrder::to_json)
        .collect();
    success(json!({ "orders": orders }))
}

async fn all_orders(State(shop): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "GET /orders/all-orders".to_owned(), false) {
        return response;
    }
    if let Err(response) = admin(&state, &headers) {
        return response;
    }
    let orders: Vec<Value> = state.orders.iter().map(FakeOrder::to_json).collect();
    success(json!({ "orders": orders }))
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
}

async fn update_order_status(
    State(shop): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<StatusBody>,
) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, format!("PATCH /orders/{id}"), true) {
        return response;
    }
    if let Err(response) = admin(&state, &headers) {
        return response;
    }
    match state.orders.iter_mut().find(|o| o.id == id) {
        Some(order) => {
            order.status = body.status;
            success(json!({ "order": order.to_json() }))
        }
        None => failure(StatusCode::NOT_FOUND, "Order not found"),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeBody {
    order_id: String,
}

async fn initialize_payment(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<InitializeBody>,
) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "POST /payments/initialize".to_owned(), true) {
        return response;
    }
    if let Err(response) = session(&state, &headers) {
        return response;
    }
    if !state.orders.iter().any(|o| o.id == body.order_id) {
        return failure(StatusCode::NOT_FOUND, "Order not found");
    }
    let reference = format!("ref-{}", body.order_id);
    state.payments.insert(reference.clone(), body.order_id);
    success(json!({
        "authorization_url": format!("https://checkout.example.com/{reference}"),
        "access_code": "access-1234",
        "reference": reference,
    }))
}

#[derive(Deserialize)]
struct VerifyParams {
    reference: String,
}

async fn verify_payment(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<VerifyParams>,
) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "GET /payments/verify".to_owned(), false) {
        return response;
    }
    if let Err(response) = session(&state, &headers) {
        return response;
    }
    let Some(order_id) = state.payments.get(&params.reference).cloned() else {
        return failure(StatusCode::NOT_FOUND, "Payment not found");
    };
    if !state.paid.contains(&params.reference) {
        return Json(json!({ "status": "Failed", "message": "Payment not completed" }))
            .into_response();
    }
    if let Some(order) = state.orders.iter_mut().find(|o| o.id == order_id) {
        "PROCESSING".clone_into(&mut order.status);
    }
    Json(json!({ "status": "Success", "message": "Payment verified" })).into_response()
}

async fn dashboard_stats(State(shop): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&shop);
    if let Err(response) = enter(&mut state, "GET /stats/dashboard".to_owned(), false) {
        return response;
    }
    if let Err(response) = admin(&state, &headers) {
        return response;
    }
    let revenue: f64 = state
        .orders
        .iter()
        .filter(|o| o.status != "PENDING" && o.status != "CANCELLED")
        .map(FakeOrder::total)
        .sum();
    success(json!({
        "users": 2,
        "orders": state.orders.len(),
        "products": state.products.len(),
        "revenue": revenue,
    }))
}
