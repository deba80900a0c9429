//! Catalog endpoints, cached via `moka`.

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, instrument};

use emporium_core::{Product, ProductId};

use super::cache::{CacheKey, CacheValue};
use super::wire::{ProductData, ProductListData, convert_products};
use super::{ApiClient, ApiError};

/// Filters for `GET /products`.
#[derive(Debug, Clone, Default, Hash, PartialEq, Eq, Serialize)]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ProductQuery {
    /// Search results change with every keystroke and are not worth caching.
    const fn is_cacheable(&self) -> bool {
        self.search.is_none()
    }
}

/// Image uploaded with a new product.
#[derive(Clone)]
pub struct ProductImage {
    pub file_name: String,
    /// MIME type, e.g. `image/jpeg`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ProductImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductImage")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Admin form for `POST /products`, sent as `multipart/form-data`.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: u32,
    pub category: String,
    pub image: ProductImage,
}

impl NewProduct {
    fn validate(&self) -> Result<(), ApiError> {
        let reject = |reason: &str| Err(ApiError::InvalidInput(reason.to_string()));

        if self.name.trim().chars().count() < 2 {
            return reject("Name must be at least 2 characters");
        }
        if self.description.trim().chars().count() < 10 {
            return reject("Description must be at least 10 characters");
        }
        if self.price <= Decimal::ZERO {
            return reject("Price must be a positive number");
        }
        if self.category.trim().is_empty() {
            return reject("Category is required");
        }
        if self.image.bytes.is_empty() {
            return reject("Image is required");
        }
        Ok(())
    }

    fn into_form(self) -> Result<Form, ApiError> {
        let image = Part::bytes(self.image.bytes)
            .file_name(self.image.file_name)
            .mime_str(&self.image.content_type)?;

        Ok(Form::new()
            .text("name", self.name.trim().to_string())
            .text("description", self.description.trim().to_string())
            .text("price", self.price.normalize().to_string())
            .text("stock", self.stock.to_string())
            .text("category", self.category.trim().to_string())
            .part("image", image))
    }
}

impl ApiClient {
    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found, the API request fails, or
    /// the payload breaks the product contract.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let request = self.request(Method::GET, &["products", id.as_str()])?;
        let data = self
            .execute::<ProductData>(request)
            .await?
            .into_data("product")?;
        let product = Product::try_from(data.product)?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List products matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let key = CacheKey::Products(query.clone());

        if query.is_cacheable()
            && let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let request = self.request(Method::GET, &["products"])?.query(query);
        let data = self
            .execute::<ProductListData>(request)
            .await?
            .into_data("products")?;
        let products = convert_products(data.products);

        if query.is_cacheable() {
            self.inner
                .cache
                .insert(key, CacheValue::Products(products.clone()))
                .await;
        }

        Ok(products)
    }

    /// Create a product (admin only).
    ///
    /// Cached listings are dropped so the new product shows up on the next read.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a request when the form is
    /// incomplete, [`ApiError::Unauthorized`] for non-admin sessions, or the
    /// API error that rejected the product.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, ApiError> {
        product.validate()?;

        let request = self
            .request(Method::POST, &["products"])?
            .multipart(product.into_form()?);
        let data = self
            .execute::<ProductData>(request)
            .await?
            .into_data("product")?;
        let product = Product::try_from(data.product)?;

        self.invalidate_all().await;
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, id: &ProductId) {
        self.inner
            .cache
            .invalidate(&CacheKey::Product(id.clone()))
            .await;
    }

    /// Invalidate all cached catalog data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}
