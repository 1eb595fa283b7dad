//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for the storefront's outer surfaces.
//! Library operations return their own error enums; callers convert them
//! with `?` and hand the result to [`AppError::report`] before exiting.

use thiserror::Error;

use crate::cart::CartError;
use crate::catalog::CatalogError;
use crate::checkout::{CheckoutError, OrderError};
use crate::config::ConfigError;
use crate::reviews::ReviewError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Cart mutation was malformed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Review operation failed.
    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Order history operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Bad input from the caller.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether the error was caused by the caller's input rather than by the
    /// system.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Cart(_) | Self::BadRequest(_) => true,
            Self::Catalog(CatalogError::NotFound(_))
            | Self::Review(ReviewError::NotFound(_) | ReviewError::InvalidRating(_))
            | Self::Order(OrderError::NotFound(_)) => true,
            Self::Checkout(
                CheckoutError::EmptyCart
                | CheckoutError::MissingField(_)
                | CheckoutError::InvalidEmail(_),
            ) => true,
            _ => false,
        }
    }

    /// Log the error and capture system failures to Sentry.
    pub fn report(&self) {
        if self.is_client_error() {
            tracing::debug!(error = %self, "Rejected request");
            return;
        }

        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Operation failed"
        );
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
