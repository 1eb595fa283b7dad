//! Product catalog.
//!
//! An in-memory product table loaded from a JSON file, with the CRUD
//! operations the storefront pages use plus simple search and category
//! filtering. The catalog resolves cart lines through [`ProductLookup`];
//! wrap it in [`CachedLookup`] when the source is slow, and change products
//! through [`CachedCatalog`] so the cache never serves a stale record.
//!
//! Records may use either the mock-data field names or the hosted-backend
//! `_c` names; see [`marketpulse_core::Product`].

pub mod cache;

pub use cache::{CachedCatalog, CachedLookup};

use std::path::Path;
use std::time::Duration;

use marketpulse_core::{Product, ProductId};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::cart::{LookupError, ProductLookup};

/// Errors that can occur in catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product with this ID.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The catalog file could not be read.
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        /// Catalog file path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog file is not a JSON array of products.
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two records share an ID.
    #[error("Duplicate product ID in catalog: {0}")]
    DuplicateId(ProductId),

    /// The largest numeric ID is already `u64::MAX`.
    #[error("No product IDs left after {0}")]
    IdExhausted(ProductId),
}

/// Partial update applied by [`Catalog::update`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Option<Decimal>>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub in_stock: Option<bool>,
}

impl ProductPatch {
    fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(original_price) = self.original_price {
            product.original_price = original_price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(images) = self.images {
            product.images = images;
        }
        if let Some(in_stock) = self.in_stock {
            product.in_stock = in_stock;
        }
    }
}

/// In-memory product catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    products: RwLock<Vec<Product>>,
    latency: Option<Duration>,
}

impl Catalog {
    /// Build a catalog from records, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if two records share an ID.
    pub fn from_products(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = std::collections::HashSet::with_capacity(products.len());
        for product in &products {
            if !seen.insert(&product.id) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }

        Ok(Self {
            products: RwLock::new(products),
            latency: None,
        })
    }

    /// Parse a catalog from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for malformed JSON and
    /// `CatalogError::DuplicateId` for repeated IDs.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::from_products(products)
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` if the file cannot be read, plus the
    /// errors of [`Catalog::from_json`].
    #[instrument]
    pub async fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let catalog = Self::from_json(&json)?;
        info!(products = catalog.len().await, "Catalog loaded");
        Ok(catalog)
    }

    /// Delay every read by `latency`, simulating a remote record service.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// Number of products.
    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    /// Whether the catalog has no products.
    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }

    /// All products in catalog order.
    pub async fn get_all(&self) -> Vec<Product> {
        self.simulate_latency().await;
        self.products.read().await.clone()
    }

    /// Get one product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this ID.
    pub async fn get_by_id(&self, id: &ProductId) -> Result<Product, CatalogError> {
        self.simulate_latency().await;
        self.products
            .read()
            .await
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }

    /// Insert a product under the next sequential ID.
    ///
    /// The ID on `product` is ignored: the new ID is one more than the
    /// largest numeric ID in the catalog (or 1 for an empty catalog).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::IdExhausted` if the largest ID is `u64::MAX`.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, mut product: Product) -> Result<Product, CatalogError> {
        let mut products = self.products.write().await;
        let next = match products.iter().filter_map(|p| p.id.as_number()).max() {
            None => 1,
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| CatalogError::IdExhausted(ProductId::from(max)))?,
        };

        product.id = ProductId::from(next);
        products.push(product.clone());
        debug!(id = %product.id, "Product created");
        Ok(product)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this ID.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<Product, CatalogError> {
        let mut products = self.products.write().await;
        let product = products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
        patch.apply(product);
        Ok(product.clone())
    }

    /// Remove a product, returning it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this ID.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let mut products = self.products.write().await;
        let index = products
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
        Ok(products.remove(index))
    }

    /// Case-insensitive match on name, description, or category.
    ///
    /// An empty or whitespace-only query matches everything.
    pub async fn search(&self, query: &str) -> Vec<Product> {
        let needle = query.trim().to_lowercase();
        let products = self.get_all().await;
        if needle.is_empty() {
            return products;
        }

        products
            .into_iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
                    || p.category.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Products in a category (case-insensitive exact match).
    pub async fn by_category(&self, category: &str) -> Vec<Product> {
        let category = category.trim();
        self.get_all()
            .await
            .into_iter()
            .filter(|p| p.category.eq_ignore_ascii_case(category))
            .collect()
    }
}

impl ProductLookup for Catalog {
    async fn resolve(&self, id: &ProductId) -> Result<Product, LookupError> {
        self.get_by_id(id).await.map_err(|e| match e {
            CatalogError::NotFound(id) => LookupError::NotFound(id),
            other => LookupError::Unavailable {
                id: id.clone(),
                reason: other.to_string(),
            },
        })
    }
}
