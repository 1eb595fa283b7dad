//! Product lookup collaborator.
//!
//! The cart only persists product IDs. On load, every persisted line is
//! enriched by resolving its ID through a [`ProductLookup`]. The catalog, the
//! cached decorator, and test doubles all implement this trait.

use std::future::Future;

use marketpulse_core::{Product, ProductId};
use thiserror::Error;

/// Errors returned when resolving a product.
#[derive(Debug, Error)]
pub enum LookupError {
    /// No product exists with this ID.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The backing source failed.
    #[error("Lookup failed for {id}: {reason}")]
    Unavailable {
        /// ID being resolved.
        id: ProductId,
        /// Human-readable cause.
        reason: String,
    },
}

/// Resolves a product ID to the full product record.
///
/// Implementations must be safe to call concurrently for distinct IDs; the
/// cart engine resolves every persisted line at once during load.
pub trait ProductLookup: Send + Sync {
    /// Resolve a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NotFound` if the product does not exist, or
    /// `LookupError::Unavailable` if the source could not be queried.
    fn resolve(&self, id: &ProductId) -> impl Future<Output = Result<Product, LookupError>> + Send;
}

impl<L: ProductLookup> ProductLookup for std::sync::Arc<L> {
    fn resolve(&self, id: &ProductId) -> impl Future<Output = Result<Product, LookupError>> + Send {
        (**self).resolve(id)
    }
}
