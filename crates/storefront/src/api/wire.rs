//! Wire contracts for the storefront API and their conversion into core types.
//!
//! Every response shape the client accepts is spelled out here. Conversions
//! validate what serde cannot (positive quantities, non-negative stock,
//! matching ids) so the rest of the crate only ever sees canonical values.
//!
//! Canonical choices where the service has historically been loose:
//! - cart lines are addressed by **product id** on every mutating endpoint
//! - order lines live under **`orderItems`**

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use emporium_core::{
    CartItem, CartItemId, DashboardStats, Order, OrderCustomer, OrderId, OrderItem, OrderItemId,
    OrderStatus, PaymentRedirect, PaymentReference, Product, ProductId, User, UserId, UserRole,
    requested_quantity,
};

// =============================================================================
// Envelope
// =============================================================================

/// Response envelope wrapped around every payload.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    /// `"success"`, `"fail"`, `"Success"`...; meaning depends on the endpoint.
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Take the payload, failing if the server left it out.
    ///
    /// # Errors
    ///
    /// Returns a contract violation naming `what` when `data` is absent.
    pub fn into_data(self, what: &str) -> Result<T, ContractViolation> {
        self.data
            .ok_or_else(|| ContractViolation(format!("{what}: response has no data")))
    }
}

/// Body of an error response. Only the message is of interest.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// A payload that decoded but does not satisfy the contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ContractViolation(pub String);

impl From<ContractViolation> for super::ApiError {
    fn from(violation: ContractViolation) -> Self {
        Self::Contract(violation.0)
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProduct {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ProductData {
    pub product: WireProduct,
}

#[derive(Debug, Deserialize)]
pub struct ProductListData {
    pub products: Vec<WireProduct>,
}

impl TryFrom<WireProduct> for Product {
    type Error = ContractViolation;

    fn try_from(wire: WireProduct) -> Result<Self, Self::Error> {
        if wire.id.trim().is_empty() {
            return Err(ContractViolation("product has an empty id".to_string()));
        }
        if wire.price.is_sign_negative() {
            return Err(ContractViolation(format!(
                "product {} has a negative price",
                wire.id
            )));
        }
        let stock = u32::try_from(wire.stock).map_err(|_| {
            ContractViolation(format!(
                "product {} has out-of-range stock {}",
                wire.id, wire.stock
            ))
        })?;

        Ok(Self {
            id: ProductId::new(wire.id),
            name: wire.name,
            description: wire.description,
            price: wire.price,
            stock,
            category: wire.category,
            image_url: wire.image_url,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }
}

/// Convert a product list, dropping entries that break the contract.
pub fn convert_products(products: Vec<WireProduct>) -> Vec<Product> {
    products
        .into_iter()
        .filter_map(|p| {
            Product::try_from(p)
                .inspect_err(|e| warn!(error = %e, "Dropping invalid product"))
                .ok()
        })
        .collect()
}

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload of `POST /auth/login` and `POST /auth/signup`.
#[derive(Debug, Deserialize)]
pub struct AuthData {
    pub user: WireUser,
    /// Omitted when the service only sets a session cookie.
    #[serde(default)]
    pub token: Option<String>,
}

/// Payload of `GET /auth/me`.
#[derive(Debug, Deserialize)]
pub struct UserData {
    pub user: WireUser,
}

impl TryFrom<WireUser> for User {
    type Error = ContractViolation;

    fn try_from(wire: WireUser) -> Result<Self, Self::Error> {
        if wire.id.trim().is_empty() {
            return Err(ContractViolation("user has an empty id".to_string()));
        }

        Ok(Self {
            id: UserId::new(wire.id),
            name: wire.name,
            email: wire.email,
            role: wire.role,
            phone: wire.phone,
            address: wire.address,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignupBody<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordBody<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCartItem {
    pub id: String,
    pub quantity: i64,
    pub product_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub product: WireProduct,
}

/// Payload of `GET /cart`. The server's `total` is ignored; totals are
/// always derived from the items.
#[derive(Debug, Deserialize)]
pub struct CartData {
    pub cart: Vec<WireCartItem>,
}

impl TryFrom<WireCartItem> for CartItem {
    type Error = ContractViolation;

    fn try_from(wire: WireCartItem) -> Result<Self, Self::Error> {
        if wire.product_id != wire.product.id {
            return Err(ContractViolation(format!(
                "cart line {} references product {} but embeds {}",
                wire.id, wire.product_id, wire.product.id
            )));
        }
        let quantity = requested_quantity(wire.quantity)
            .map_err(|e| ContractViolation(format!("cart line {}: {e}", wire.id)))?;

        Ok(Self {
            id: CartItemId::new(wire.id),
            product: Product::try_from(wire.product)?,
            quantity,
        })
    }
}

/// Convert the cart payload, keeping server order and dropping lines that
/// break the contract.
pub fn convert_cart(data: CartData) -> Vec<CartItem> {
    data.cart
        .into_iter()
        .filter_map(|line| {
            CartItem::try_from(line)
                .inspect_err(|e| warn!(error = %e, "Dropping invalid cart line"))
                .ok()
        })
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartBody<'a> {
    pub product_id: &'a str,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct SetQuantityBody {
    pub quantity: u32,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrderUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrderItem {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(default)]
    pub product: Option<WireProduct>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrder {
    pub id: String,
    #[serde(default)]
    pub user: Option<WireOrderUser>,
    pub order_items: Vec<WireOrderItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct OrderData {
    pub order: WireOrder,
}

#[derive(Debug, Deserialize)]
pub struct OrderListData {
    pub orders: Vec<WireOrder>,
}

impl TryFrom<WireOrder> for Order {
    type Error = ContractViolation;

    fn try_from(wire: WireOrder) -> Result<Self, Self::Error> {
        let items = wire
            .order_items
            .into_iter()
            .map(|item| -> Result<OrderItem, ContractViolation> {
                Ok(OrderItem {
                    id: OrderItemId::new(item.id),
                    product_id: ProductId::new(item.product_id),
                    product: item.product.map(Product::try_from).transpose()?,
                    quantity: item.quantity,
                    unit_price: item.price,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: OrderId::new(wire.id),
            customer: wire.user.map(|u| OrderCustomer {
                id: UserId::new(u.id),
                name: u.name,
                email: u.email,
                phone: u.phone,
                address: u.address,
            }),
            items,
            total_amount: wire.total_amount,
            status: wire.status,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }
}

/// Convert an order list, dropping orders that break the contract.
pub fn convert_orders(orders: Vec<WireOrder>) -> Vec<Order> {
    orders
        .into_iter()
        .filter_map(|o| {
            Order::try_from(o)
                .inspect_err(|e| warn!(error = %e, "Dropping invalid order"))
                .ok()
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct OrderStatusBody {
    pub status: OrderStatus,
}

// =============================================================================
// Payments & stats
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializePaymentBody<'a> {
    pub order_id: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WirePaymentInit {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

impl TryFrom<WirePaymentInit> for PaymentRedirect {
    type Error = ContractViolation;

    fn try_from(wire: WirePaymentInit) -> Result<Self, Self::Error> {
        let url = url::Url::parse(&wire.authorization_url).map_err(|e| {
            ContractViolation(format!(
                "authorization_url {:?} is not a URL: {e}",
                wire.authorization_url
            ))
        })?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ContractViolation(format!(
                "authorization_url uses unsupported scheme {}",
                url.scheme()
            )));
        }
        if wire.reference.trim().is_empty() {
            return Err(ContractViolation("payment reference is empty".to_string()));
        }

        Ok(Self {
            authorization_url: wire.authorization_url,
            access_code: wire.access_code,
            reference: PaymentReference::new(wire.reference),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireStats {
    pub users: u64,
    pub orders: u64,
    pub products: u64,
    pub revenue: Decimal,
}

impl From<WireStats> for DashboardStats {
    fn from(wire: WireStats) -> Self {
        Self {
            users: wire.users,
            orders: wire.orders,
            products: wire.products,
            revenue: wire.revenue,
        }
    }
}
