//! Integration tests for MarketPulse.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marketpulse-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - Cart snapshots across restarts, recovery, and fan-out
//! - `checkout_flow` - Pricing, order placement, and the order history across restarts
//! - `catalog_changes` - Catalog edits reaching carts through the lookup cache, and reviews
//!
//! Every test runs against its own temporary data directory; nothing needs
//! to be running.

use std::path::PathBuf;

use marketpulse_storefront::cart::{CART_STORAGE_KEY, FileStore};
use marketpulse_storefront::catalog::Catalog;
use marketpulse_storefront::checkout::ShippingAddress;
use marketpulse_storefront::config::StorefrontConfig;
use marketpulse_storefront::reviews::Reviews;
use marketpulse_storefront::state::AppState;
use tempfile::TempDir;

/// Catalog shared by the integration tests, in the mock-data field style.
pub const CATALOG_JSON: &str = r#"[
    {"Id": 1, "name": "Desk Lamp", "price": 25, "category": "Home"},
    {"Id": 2, "name": "Notebook", "price": 4.5, "category": "Stationery"},
    {"Id": 3, "name_c": "Headphones", "price_c": 120, "category_c": "Electronics",
     "originalPrice": 150},
    {"Id": 4, "name": "Mug", "price": 12.25, "category": "Home", "inStock": false}
]"#;

/// Reviews of [`CATALOG_JSON`] products, in the backend `_c` field style.
pub const REVIEWS_JSON: &str = r#"[
    {"Id": 1, "productId": 3, "rating_c": 5, "title_c": "Crisp sound", "author_c": "Mo",
     "date_c": "2024-02-01T09:00:00Z", "content_c": "Worth it.", "helpful_c": 4},
    {"Id": 2, "productId": 3, "rating_c": 4, "title_c": "Comfortable", "author_c": "Jo",
     "date_c": "2024-02-03T18:30:00Z"},
    {"Id": 3, "productId": 1, "rating_c": 2, "title_c": "Dim", "author_c": "Ri"}
]"#;

/// One isolated storefront: a temporary data directory plus config.
pub struct TestContext {
    dir: TempDir,
}

impl TestContext {
    /// Create a fresh context.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    /// Config pointing at this context's data directory.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig {
            data_dir: self.data_dir(),
            catalog_path: self.dir.path().join("products.json"),
            ..StorefrontConfig::default()
        }
    }

    /// Directory holding the cart snapshot and order history.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("carts")
    }

    /// Path of the cart snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir().join(format!("{CART_STORAGE_KEY}.json"))
    }

    /// A store over this context's data directory.
    #[must_use]
    pub fn store(&self) -> FileStore {
        FileStore::new(self.data_dir())
    }

    /// Start (or restart) the storefront with [`CATALOG_JSON`] and
    /// [`REVIEWS_JSON`].
    ///
    /// # Panics
    ///
    /// Panics if a fixture does not parse.
    pub async fn start(&self) -> AppState {
        self.start_with(self.config()).await
    }

    /// Start the storefront with a custom config and the fixtures.
    ///
    /// # Panics
    ///
    /// Panics if a fixture does not parse.
    pub async fn start_with(&self, config: StorefrontConfig) -> AppState {
        let catalog = Catalog::from_json(CATALOG_JSON).expect("Catalog fixture is invalid");
        let reviews = Reviews::from_json(REVIEWS_JSON).expect("Reviews fixture is invalid");
        AppState::from_parts(config, catalog, reviews).await
    }

    /// Read the raw snapshot file, if any.
    #[must_use]
    pub fn read_snapshot(&self) -> Option<String> {
        std::fs::read_to_string(self.snapshot_path()).ok()
    }

    /// Write a raw snapshot file.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_snapshot(&self, contents: &str) {
        std::fs::create_dir_all(self.data_dir()).expect("Failed to create data dir");
        std::fs::write(self.snapshot_path(), contents).expect("Failed to write snapshot");
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete shipping address.
#[must_use]
pub fn address() -> ShippingAddress {
    ShippingAddress {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: "555-0100".to_string(),
        address: "12 Analytical Way".to_string(),
        city: "London".to_string(),
        state: "LDN".to_string(),
        zip_code: "10001".to_string(),
        country: "United Kingdom".to_string(),
    }
}
