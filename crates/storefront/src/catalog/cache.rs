//! Cached product lookup.
//!
//! Wraps any [`ProductLookup`] with a `moka` cache so repeated cart loads and
//! product pages do not hit the record service for every line. Only
//! successful lookups are cached; a missing product is asked for again next
//! time.
//!
//! [`CachedCatalog`] pairs a [`Catalog`] with its cache and is the way to
//! change products while carts resolve through the cache: every mutation
//! evicts the product it touched.

use std::sync::Arc;
use std::time::Duration;

use marketpulse_core::{Product, ProductId};
use moka::future::Cache;
use tracing::{debug, instrument};

use super::{Catalog, CatalogError, ProductPatch};
use crate::cart::{LookupError, ProductLookup};

/// Default maximum number of cached products.
pub const DEFAULT_CAPACITY: u64 = 1000;

/// Default time-to-live for cached products.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// A [`ProductLookup`] decorator with an in-memory TTL cache.
#[derive(Clone)]
pub struct CachedLookup<L> {
    inner: L,
    cache: Cache<ProductId, Product>,
}

impl<L> CachedLookup<L> {
    /// Wrap `inner` with the default capacity and a 5 minute TTL.
    #[must_use]
    pub fn new(inner: L) -> Self {
        Self::with_settings(inner, DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    /// Wrap `inner` with a specific capacity and TTL.
    #[must_use]
    pub fn with_settings(inner: L, max_capacity: u64, time_to_live: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(time_to_live)
            .build();

        Self { inner, cache }
    }

    /// The wrapped lookup.
    pub const fn inner(&self) -> &L {
        &self.inner
    }

    /// Drop a cached product so the next lookup refetches it.
    pub async fn invalidate(&self, id: &ProductId) {
        self.cache.invalidate(id).await;
    }
}

impl<L: ProductLookup> ProductLookup for CachedLookup<L> {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn resolve(&self, id: &ProductId) -> Result<Product, LookupError> {
        if let Some(product) = self.cache.get(id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product = self.inner.resolve(id).await?;
        self.cache.insert(id.clone(), product.clone()).await;
        Ok(product)
    }
}

impl<L> std::fmt::Debug for CachedLookup<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedLookup")
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

/// A catalog together with the cached lookup carts resolve through.
///
/// Reads go straight to the catalog. `create`, `update` and `delete` evict
/// the product from the cache once the catalog has changed, so the next
/// lookup sees the new record (or its absence).
#[derive(Debug, Clone)]
pub struct CachedCatalog {
    catalog: Arc<Catalog>,
    lookup: CachedLookup<Arc<Catalog>>,
}

impl CachedCatalog {
    /// Wrap `catalog` with a lookup cache of the given capacity and TTL.
    #[must_use]
    pub fn new(catalog: Catalog, max_capacity: u64, time_to_live: Duration) -> Self {
        let catalog = Arc::new(catalog);
        let lookup = CachedLookup::with_settings(Arc::clone(&catalog), max_capacity, time_to_live);
        Self { catalog, lookup }
    }

    /// The cached lookup. Clones share the same cache.
    pub const fn lookup(&self) -> &CachedLookup<Arc<Catalog>> {
        &self.lookup
    }

    /// Number of products.
    pub async fn len(&self) -> usize {
        self.catalog.len().await
    }

    /// Whether the catalog has no products.
    pub async fn is_empty(&self) -> bool {
        self.catalog.is_empty().await
    }

    /// All products in catalog order.
    pub async fn get_all(&self) -> Vec<Product> {
        self.catalog.get_all().await
    }

    /// Get one product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this ID.
    pub async fn get_by_id(&self, id: &ProductId) -> Result<Product, CatalogError> {
        self.catalog.get_by_id(id).await
    }

    /// See [`Catalog::search`].
    pub async fn search(&self, query: &str) -> Vec<Product> {
        self.catalog.search(query).await
    }

    /// See [`Catalog::by_category`].
    pub async fn by_category(&self, category: &str) -> Vec<Product> {
        self.catalog.by_category(category).await
    }

    /// Insert a product under the next sequential ID.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Catalog::create`].
    pub async fn create(&self, product: Product) -> Result<Product, CatalogError> {
        let product = self.catalog.create(product).await?;
        self.lookup.invalidate(&product.id).await;
        Ok(product)
    }

    /// Apply a partial update and evict the cached copy.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this ID.
    pub async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<Product, CatalogError> {
        let product = self.catalog.update(id, patch).await?;
        self.lookup.invalidate(id).await;
        Ok(product)
    }

    /// Remove a product and evict the cached copy.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this ID.
    pub async fn delete(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let product = self.catalog.delete(id).await?;
        self.lookup.invalidate(id).await;
        Ok(product)
    }
}
