//! Checkout.
//!
//! Prices the cart with a [`CheckoutPolicy`] and turns it into an [`Order`]
//! recorded by an [`OrderSink`]. The cart is cleared only once the sink has
//! accepted the order; any failure before that leaves the cart as it was.

mod order;
mod summary;

pub use order::{
    NewOrder, ORDER_STORAGE_KEY, Order, OrderError, OrderLine, OrderSink, ShippingAddress,
    StoredOrderSink,
};
pub use summary::{CheckoutPolicy, OrderSummary};

use chrono::Utc;
use marketpulse_core::OrderStatus;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::cart::{CartEngine, CartStore, ProductLookup};

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// There is nothing in the cart to order.
    #[error("Cannot place an order with an empty cart")]
    EmptyCart,

    /// A required shipping field is blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The email address is not shaped like one.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// The order sink refused the order.
    #[error("Failed to submit order: {0}")]
    Submit(#[from] OrderError),
}

/// Minimal shape check: one `@` with text on both sides and a dot in the
/// domain.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// Checks a shipping address before an order is built from it.
///
/// # Errors
///
/// Returns the first blank required field, or `CheckoutError::InvalidEmail`.
pub fn validate_address(address: &ShippingAddress) -> Result<(), CheckoutError> {
    if let Some(field) = address.missing_fields().first().copied() {
        return Err(CheckoutError::MissingField(field));
    }
    if !is_plausible_email(&address.email) {
        return Err(CheckoutError::InvalidEmail(address.email.clone()));
    }
    Ok(())
}

/// Checkout service for one storefront.
#[derive(Debug)]
pub struct Checkout<K> {
    policy: CheckoutPolicy,
    sink: K,
}

impl<K: OrderSink> Checkout<K> {
    /// Create a checkout with the given pricing policy and order sink.
    pub const fn new(policy: CheckoutPolicy, sink: K) -> Self {
        Self { policy, sink }
    }

    /// Pricing rules in effect.
    pub const fn policy(&self) -> &CheckoutPolicy {
        &self.policy
    }

    /// The order sink.
    pub const fn sink(&self) -> &K {
        &self.sink
    }

    /// Price the current cart.
    pub async fn summary<S, L>(&self, engine: &CartEngine<S, L>) -> OrderSummary
    where
        S: CartStore,
        L: ProductLookup,
    {
        OrderSummary::from_state(&engine.state().await, &self.policy)
    }

    /// Place an order for everything in the cart.
    ///
    /// Assumes a single session drives the cart: lines added between the
    /// price snapshot and the final clear are cleared with it.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for an empty cart, an address
    /// validation error, or `CheckoutError::Submit` if the sink refuses the
    /// order. The cart is untouched in every error case.
    #[instrument(skip(self, engine, address), fields(email = %address.email))]
    pub async fn place_order<S, L>(
        &self,
        engine: &CartEngine<S, L>,
        address: ShippingAddress,
    ) -> Result<Order, CheckoutError>
    where
        S: CartStore,
        L: ProductLookup,
    {
        let state = engine.state().await;
        if state.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        validate_address(&address)?;

        let order = NewOrder {
            items: state.items.iter().map(OrderLine::from).collect(),
            summary: OrderSummary::from_state(&state, &self.policy),
            shipping_address: address,
            placed_at: Utc::now(),
            status: OrderStatus::Processing,
        };

        let order = self.sink.submit(order).await.inspect_err(|e| {
            warn!(error = %e, "Order submission failed; cart kept");
        })?;

        engine.clear_cart().await;
        info!(order = %order.number(), total = %order.details.summary.total, "Order placed");
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketpulse_core::{Product, ProductId};
    use rust_decimal::Decimal;

    use super::*;
    use crate::cart::MemoryStore;
    use crate::catalog::Catalog;

    /// Sink that refuses everything.
    struct ClosedSink;

    impl OrderSink for ClosedSink {
        async fn submit(&self, _order: NewOrder) -> Result<Order, OrderError> {
            Err(OrderError::Rejected("store closed".to_string()))
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            phone: "555-0199".to_string(),
            address: "1 Compiler Ct".to_string(),
            city: "Arlington".to_string(),
            state: "VA".to_string(),
            zip_code: "22201".to_string(),
            country: "United States".to_string(),
        }
    }

    fn new_checkout() -> Checkout<StoredOrderSink<MemoryStore>> {
        Checkout::new(CheckoutPolicy::default(), StoredOrderSink::new(MemoryStore::new()))
    }

    fn mug() -> Product {
        Product::new(ProductId::from(1), "Mug", Decimal::new(1250, 2))
    }

    async fn engine_with_mugs(quantity: u32) -> CartEngine<MemoryStore, Catalog> {
        let catalog = Catalog::from_products(vec![mug()]).unwrap();
        let engine = CartEngine::load(MemoryStore::new(), catalog).await;
        engine.add_to_cart(&mug(), quantity).await.unwrap();
        engine
    }

    #[test]
    fn test_email_shape() {
        assert!(is_plausible_email("a@b.co"));
        assert!(!is_plausible_email("a@b"));
        assert!(!is_plausible_email("@b.co"));
        assert!(!is_plausible_email("a@@b.co"));
        assert!(!is_plausible_email("a@.co"));
    }

    #[test]
    fn test_validate_address_reports_first_missing() {
        let mut addr = address();
        addr.last_name = String::new();
        addr.city = String::new();
        assert!(matches!(
            validate_address(&addr),
            Err(CheckoutError::MissingField("lastName"))
        ));
    }

    #[tokio::test]
    async fn test_summary_prices_cart() {
        let engine = engine_with_mugs(2).await;
        let checkout = new_checkout();

        let summary = checkout.summary(&engine).await;
        assert_eq!(summary.subtotal, Decimal::new(25, 0));
        assert_eq!(summary.shipping, Decimal::new(999, 2));
        assert_eq!(summary.tax, Decimal::new(200, 2));
    }

    #[tokio::test]
    async fn test_place_order_clears_cart() {
        let engine = engine_with_mugs(4).await;
        let checkout = new_checkout();

        let order = checkout.place_order(&engine, address()).await.unwrap();

        assert_eq!(order.details.status, OrderStatus::Processing);
        assert_eq!(order.details.items.len(), 1);
        assert_eq!(order.details.items[0].name.as_deref(), Some("Mug"));
        assert_eq!(order.details.summary.subtotal, Decimal::new(50, 0));
        assert!(order.details.summary.ships_free());
        assert!(engine.state().await.is_empty());
        assert_eq!(checkout.sink().all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let engine = CartEngine::load(MemoryStore::new(), Catalog::default()).await;
        let checkout = new_checkout();

        let result = checkout.place_order(&engine, address()).await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_invalid_address_keeps_cart() {
        let engine = engine_with_mugs(1).await;
        let checkout = new_checkout();
        let mut addr = address();
        addr.email = "not-an-email".to_string();

        let result = checkout.place_order(&engine, addr).await;
        assert!(matches!(result, Err(CheckoutError::InvalidEmail(_))));
        assert_eq!(engine.cart_count().await, 1);
        assert!(checkout.sink().all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sink_failure_keeps_cart() {
        let engine = engine_with_mugs(3).await;
        let checkout = Checkout::new(CheckoutPolicy::default(), ClosedSink);

        let result = checkout.place_order(&engine, address()).await;
        assert!(matches!(result, Err(CheckoutError::Submit(_))));
        assert_eq!(engine.cart_count().await, 3);
    }
}
