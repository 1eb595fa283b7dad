//! Application state shared across commands.

use std::sync::Arc;

use crate::cart::{CartEngine, FileStore};
use crate::catalog::{CachedCatalog, CachedLookup, Catalog};
use crate::checkout::{Checkout, StoredOrderSink};
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::reviews::Reviews;

/// Product lookup used by the storefront: the catalog behind a TTL cache.
pub type StorefrontLookup = CachedLookup<Arc<Catalog>>;

/// Cart engine used by the storefront.
pub type StorefrontCart = CartEngine<FileStore, StorefrontLookup>;

/// Checkout used by the storefront, recording orders next to the cart.
pub type StorefrontCheckout = Checkout<StoredOrderSink<FileStore>>;

/// Application state shared across all commands.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, reviews, the session cart, and checkout. The cart and the order
/// history both live in `config.data_dir`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CachedCatalog,
    reviews: Reviews,
    cart: StorefrontCart,
    checkout: StorefrontCheckout,
}

impl AppState {
    /// Load the catalog and reviews named in `config`, then restore the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or parsed, or if a
    /// reviews file exists but is invalid.
    pub async fn new(config: StorefrontConfig) -> Result<Self> {
        let catalog = Catalog::load(&config.catalog_path).await?;
        let reviews = Reviews::load(&config.reviews_path).await?;
        Ok(Self::from_parts(config, catalog, reviews).await)
    }

    /// Build state around an already-loaded catalog and reviews.
    pub async fn from_parts(config: StorefrontConfig, catalog: Catalog, reviews: Reviews) -> Self {
        let catalog = CachedCatalog::new(catalog, config.cache.capacity, config.cache.ttl);
        let store = FileStore::new(config.data_dir.clone());
        let cart = CartEngine::load(store.clone(), catalog.lookup().clone()).await;
        let checkout = Checkout::new(config.checkout, StoredOrderSink::new(store));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                reviews,
                cart,
                checkout,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog. Changes made through it
    /// evict the cart's cached copy of the product.
    #[must_use]
    pub fn catalog(&self) -> &CachedCatalog {
        &self.inner.catalog
    }

    /// Get a reference to the product reviews.
    #[must_use]
    pub fn reviews(&self) -> &Reviews {
        &self.inner.reviews
    }

    /// Get a reference to the session cart.
    #[must_use]
    pub fn cart(&self) -> &StorefrontCart {
        &self.inner.cart
    }

    /// Get a reference to the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &StorefrontCheckout {
        &self.inner.checkout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("cart", &self.inner.cart)
            .finish_non_exhaustive()
    }
}
