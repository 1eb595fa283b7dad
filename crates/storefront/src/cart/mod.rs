//! Cart engine.
//!
//! Owns the canonical list of cart line items for one shopping session,
//! keeps it persisted in a [`CartStore`] slot, and enriches persisted lines
//! with product details from a [`ProductLookup`].
//!
//! # Lifecycle
//!
//! 1. [`CartEngine::load`] reads the snapshot, resolves every line's product
//!    concurrently, and drops lines whose product cannot be resolved. The
//!    loaded set is not written back.
//! 2. Each mutation updates the working set and overwrites the snapshot
//!    before returning. Mutations are serialized by a write lock held across
//!    the store write, so readers never see memory and storage disagree.
//! 3. [`CartEngine::clear_cart`] empties the set and erases the slot.
//!
//! # Failure policy
//!
//! Problems reading or enriching the snapshot are logged and absorbed: an
//! unparsable snapshot is erased and the cart starts empty, an unresolvable
//! product drops its line. Store write failures are logged and the in-memory
//! change stands. Only malformed calls (zero quantity, negative price,
//! quantity overflow) return [`CartError`].
//!
//! # Example
//!
//! ```rust,ignore
//! let engine = CartEngine::load(FileStore::new(".marketpulse"), catalog).await;
//! let state = engine.add_to_cart(&product, 2).await?;
//! assert_eq!(state.count, 2);
//! ```

mod line_item;
pub mod lookup;
pub mod store;

pub use line_item::{
    CartLineItem, CartState, PersistedLine, SelectedOptions, cart_count, cart_total,
};
pub use lookup::{LookupError, ProductLookup};
pub use store::{CartStore, FileStore, MemoryStore, StoreError};

use futures::future::join_all;
use marketpulse_core::{Product, ProductId};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, instrument, warn};

/// Store key holding the cart snapshot.
pub const CART_STORAGE_KEY: &str = "marketpulse_cart";

/// Errors returned for malformed cart mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Quantity must be at least 1 when adding.
    #[error("Quantity must be at least 1 (got {0})")]
    InvalidQuantity(u32),

    /// Product price is negative.
    #[error("Product {id} has a negative price: {price}")]
    InvalidPrice {
        /// Offending product.
        id: ProductId,
        /// Offending price.
        price: Decimal,
    },

    /// Resulting quantity does not fit in a line.
    #[error("Quantity for product {0} exceeds the maximum")]
    QuantityOverflow(ProductId),
}

/// The cart engine for one session.
///
/// Generic over its collaborators so production code uses
/// [`FileStore`] with a cached catalog and tests use in-memory doubles.
pub struct CartEngine<S, L> {
    store: S,
    lookup: L,
    key: String,
    items: RwLock<Vec<CartLineItem>>,
    updates: watch::Sender<CartState>,
}

impl<S: CartStore, L: ProductLookup> CartEngine<S, L> {
    /// Load the cart from the default storage key.
    ///
    /// Never fails: unreadable or corrupt snapshots yield an empty cart.
    pub async fn load(store: S, lookup: L) -> Self {
        Self::load_with_key(store, lookup, CART_STORAGE_KEY).await
    }

    /// Load the cart from a specific storage key.
    #[instrument(skip(store, lookup))]
    pub async fn load_with_key(store: S, lookup: L, key: &str) -> Self {
        let persisted = read_snapshot(&store, key).await;
        let items = enrich(&lookup, persisted).await;

        info!(lines = items.len(), "Cart loaded");

        let (updates, _) = watch::channel(CartState::from_items(&items));
        Self {
            store,
            lookup,
            key: key.to_string(),
            items: RwLock::new(items),
            updates,
        }
    }

    /// Current cart view: lines plus derived count and total.
    pub async fn state(&self) -> CartState {
        CartState::from_items(&self.items.read().await)
    }

    /// Subscribe to the cart view published after every mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.updates.subscribe()
    }

    /// Add `quantity` of `product` with no selected options.
    ///
    /// # Errors
    ///
    /// See [`CartEngine::add_with_options`].
    pub async fn add_to_cart(&self, product: &Product, quantity: u32) -> Result<CartState, CartError> {
        self.add_with_options(product, quantity, SelectedOptions::new())
            .await
    }

    /// Add `quantity` of `product`.
    ///
    /// If the product already has a line its quantity is increased (merge,
    /// so two calls with 1 yield 2) and its existing unit price and options
    /// are kept. Otherwise a new line is appended with the product's current
    /// price as the unit price.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for a zero quantity,
    /// `CartError::InvalidPrice` for a negative product price, and
    /// `CartError::QuantityOverflow` if the merged quantity would not fit.
    #[instrument(skip(self, product, options), fields(product_id = %product.id))]
    pub async fn add_with_options(
        &self,
        product: &Product,
        quantity: u32,
        options: SelectedOptions,
    ) -> Result<CartState, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        if product.price.is_sign_negative() && !product.price.is_zero() {
            return Err(CartError::InvalidPrice {
                id: product.id.clone(),
                price: product.price,
            });
        }

        let mut items = self.items.write().await;

        if let Some(line) = items.iter_mut().find(|line| line.product_id == product.id) {
            line.quantity = line
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| CartError::QuantityOverflow(product.id.clone()))?;
            debug!(quantity = line.quantity, "Merged into existing line");
        } else {
            items.push(CartLineItem {
                product_id: product.id.clone(),
                quantity,
                unit_price: product.price,
                selected_options: options,
                product: Some(product.clone()),
            });
            debug!(quantity, "Added new line");
        }

        Ok(self.commit(&items).await)
    }

    /// Remove the line for `product_id`. Removing an absent product is a no-op.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_cart(&self, product_id: &ProductId) -> CartState {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|line| &line.product_id != product_id);

        if items.len() == before {
            debug!("Product not in cart");
        }

        self.commit(&items).await
    }

    /// Set the quantity of an existing line to exactly `new_quantity`.
    ///
    /// A quantity of zero or less removes the line. A product that is not in
    /// the cart is ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError::QuantityOverflow` if `new_quantity` does not fit
    /// in a line.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        product_id: &ProductId,
        new_quantity: i64,
    ) -> Result<CartState, CartError> {
        if new_quantity <= 0 {
            return Ok(self.remove_from_cart(product_id).await);
        }

        let quantity = u32::try_from(new_quantity)
            .map_err(|_| CartError::QuantityOverflow(product_id.clone()))?;

        let mut items = self.items.write().await;
        match items.iter_mut().find(|line| &line.product_id == product_id) {
            Some(line) => line.quantity = quantity,
            None => debug!("Product not in cart"),
        }

        Ok(self.commit(&items).await)
    }

    /// Empty the cart and erase its snapshot slot.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> CartState {
        let mut items = self.items.write().await;
        items.clear();

        if let Err(e) = self.store.erase(&self.key).await {
            warn!(error = %e, "Failed to erase cart snapshot; a restart may restore old items");
        }

        let state = CartState::default();
        self.updates.send_replace(state.clone());
        state
    }

    /// Whether `product_id` has a line in the cart.
    pub async fn is_in_cart(&self, product_id: &ProductId) -> bool {
        self.items
            .read()
            .await
            .iter()
            .any(|line| &line.product_id == product_id)
    }

    /// Quantity held for `product_id`, or 0 if it is not in the cart.
    pub async fn get_item_quantity(&self, product_id: &ProductId) -> u32 {
        self.items
            .read()
            .await
            .iter()
            .find(|line| &line.product_id == product_id)
            .map_or(0, |line| line.quantity)
    }

    /// Sum of all quantities.
    pub async fn cart_count(&self) -> u64 {
        cart_count(&self.items.read().await)
    }

    /// Sum of `unit_price × quantity` over all lines.
    pub async fn cart_total(&self) -> Decimal {
        cart_total(&self.items.read().await)
    }

    /// The durable store backing this cart.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The product lookup used to enrich persisted lines.
    pub const fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Persist `items` and publish the new view.
    ///
    /// Called with the write lock held so the next mutation starts only
    /// after this snapshot is written.
    async fn commit(&self, items: &[CartLineItem]) -> CartState {
        let persisted: Vec<PersistedLine> = items.iter().map(CartLineItem::to_persisted).collect();

        match serde_json::to_string(&persisted) {
            Ok(snapshot) => {
                if let Err(e) = self.store.write(&self.key, &snapshot).await {
                    warn!(
                        error = %e,
                        lines = persisted.len(),
                        "Failed to persist cart; change kept in memory only"
                    );
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize cart snapshot"),
        }

        let state = CartState::from_items(items);
        self.updates.send_replace(state.clone());
        state
    }
}

impl<S, L> std::fmt::Debug for CartEngine<S, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartEngine")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Read and parse the snapshot, recovering from every failure with an empty list.
async fn read_snapshot<S: CartStore>(store: &S, key: &str) -> Vec<PersistedLine> {
    let raw = match store.read(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "Failed to read cart snapshot; starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<PersistedLine>>(&raw) {
        Ok(lines) => normalize(lines),
        Err(e) => {
            warn!(error = %e, "Cart snapshot is corrupt; discarding it");
            if let Err(e) = store.erase(key).await {
                warn!(error = %e, "Failed to erase corrupt cart snapshot");
            }
            Vec::new()
        }
    }
}

/// Enforce line invariants on data read from storage.
///
/// Zero-quantity lines are dropped and duplicate product IDs are merged into
/// the first occurrence.
fn normalize(lines: Vec<PersistedLine>) -> Vec<PersistedLine> {
    let mut normalized: Vec<PersistedLine> = Vec::with_capacity(lines.len());

    for line in lines {
        if line.quantity == 0 {
            warn!(product_id = %line.product_id, "Dropping zero-quantity line from snapshot");
            continue;
        }
        if let Some(existing) = normalized
            .iter_mut()
            .find(|existing| existing.product_id == line.product_id)
        {
            warn!(product_id = %line.product_id, "Merging duplicate line from snapshot");
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            normalized.push(line);
        }
    }

    normalized
}

/// Resolve every line's product concurrently, dropping lines that fail.
async fn enrich<L: ProductLookup>(lookup: &L, lines: Vec<PersistedLine>) -> Vec<CartLineItem> {
    let resolved = join_all(lines.into_iter().map(|line| async move {
        let result = lookup.resolve(&line.product_id).await;
        (line, result)
    }))
    .await;

    resolved
        .into_iter()
        .filter_map(|(line, result)| match result {
            Ok(product) => Some(line.enrich(product)),
            Err(e) => {
                warn!(product_id = %line.product_id, error = %e, "Dropping cart line");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Lookup double with a fixed product table and a set of failing IDs.
    #[derive(Default)]
    struct StubLookup {
        products: HashMap<ProductId, Product>,
        failing: HashSet<ProductId>,
        calls: AtomicUsize,
    }

    impl StubLookup {
        fn with(products: &[Product]) -> Self {
            Self {
                products: products.iter().map(|p| (p.id.clone(), p.clone())).collect(),
                ..Self::default()
            }
        }

        fn failing(mut self, id: u64) -> Self {
            self.failing.insert(ProductId::from(id));
            self
        }
    }

    impl ProductLookup for StubLookup {
        async fn resolve(&self, id: &ProductId) -> Result<Product, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(id) {
                return Err(LookupError::Unavailable {
                    id: id.clone(),
                    reason: "backend offline".to_string(),
                });
            }
            self.products
                .get(id)
                .cloned()
                .ok_or_else(|| LookupError::NotFound(id.clone()))
        }
    }

    /// Store double whose writes and erases always fail.
    #[derive(Default)]
    struct BrokenStore;

    impl CartStore for BrokenStore {
        async fn read(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        async fn write(&self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io {
                key: key.to_string(),
                source: std::io::Error::other("disk full"),
            })
        }

        async fn erase(&self, key: &str) -> Result<(), StoreError> {
            Err(StoreError::Io {
                key: key.to_string(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    fn product(id: u64, price: i64) -> Product {
        Product::new(ProductId::from(id), format!("Product {id}"), Decimal::new(price, 0))
    }

    async fn empty_engine(products: &[Product]) -> CartEngine<MemoryStore, StubLookup> {
        CartEngine::load(MemoryStore::new(), StubLookup::with(products)).await
    }

    async fn snapshot(engine: &CartEngine<MemoryStore, StubLookup>) -> Vec<PersistedLine> {
        let raw = engine
            .store()
            .read(CART_STORAGE_KEY)
            .await
            .unwrap()
            .unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_concrete_scenario() {
        let p = product(1, 10);
        let engine = empty_engine(&[p.clone()]).await;

        let state = engine.add_to_cart(&p, 1).await.unwrap();
        assert_eq!((state.count, state.total), (1, Decimal::new(10, 0)));

        let state = engine.add_to_cart(&p, 2).await.unwrap();
        assert_eq!((state.count, state.total), (3, Decimal::new(30, 0)));

        let state = engine.update_quantity(&p.id, 1).await.unwrap();
        assert_eq!((state.count, state.total), (1, Decimal::new(10, 0)));

        let state = engine.remove_from_cart(&p.id).await;
        assert_eq!((state.count, state.total), (0, Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_merge_is_additive() {
        let p = product(1, 5);
        let engine = empty_engine(&[]).await;

        engine.add_to_cart(&p, 2).await.unwrap();
        let state = engine.add_to_cart(&p, 3).await.unwrap();

        assert_eq!(state.items.len(), 1);
        assert_eq!(engine.get_item_quantity(&p.id).await, 5);
    }

    #[tokio::test]
    async fn test_add_keeps_one_line_per_product() {
        let a = product(1, 1);
        let b = product(2, 2);
        let engine = empty_engine(&[]).await;

        for p in [&a, &b, &a, &a, &b] {
            engine.add_to_cart(p, 1).await.unwrap();
        }

        let state = engine.state().await;
        let ids: HashSet<_> = state.items.iter().map(|l| l.product_id.clone()).collect();
        assert_eq!(ids.len(), state.items.len());
        assert_eq!(engine.get_item_quantity(&a.id).await, 3);
        assert_eq!(engine.get_item_quantity(&b.id).await, 2);
    }

    #[tokio::test]
    async fn test_merge_keeps_original_unit_price() {
        let engine = empty_engine(&[]).await;
        engine.add_to_cart(&product(1, 10), 1).await.unwrap();

        let repriced = product(1, 12);
        let state = engine.add_to_cart(&repriced, 1).await.unwrap();

        assert_eq!(state.items[0].unit_price, Decimal::new(10, 0));
        assert_eq!(state.total, Decimal::new(20, 0));
    }

    #[tokio::test]
    async fn test_add_rejects_zero_quantity() {
        let engine = empty_engine(&[]).await;
        let result = engine.add_to_cart(&product(1, 10), 0).await;
        assert_eq!(result, Err(CartError::InvalidQuantity(0)));
        assert!(engine.state().await.is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_negative_price() {
        let engine = empty_engine(&[]).await;
        let result = engine.add_to_cart(&product(1, -3), 1).await;
        assert!(matches!(result, Err(CartError::InvalidPrice { .. })));
    }

    #[tokio::test]
    async fn test_add_overflow_leaves_quantity_unchanged() {
        let p = product(1, 1);
        let engine = empty_engine(&[]).await;
        engine.add_to_cart(&p, u32::MAX).await.unwrap();

        let result = engine.add_to_cart(&p, 1).await;
        assert_eq!(result, Err(CartError::QuantityOverflow(p.id.clone())));
        assert_eq!(engine.get_item_quantity(&p.id).await, u32::MAX);
    }

    #[tokio::test]
    async fn test_update_sets_absolute_quantity() {
        let p = product(1, 2);
        let engine = empty_engine(&[]).await;
        engine.add_to_cart(&p, 4).await.unwrap();

        engine.update_quantity(&p.id, 7).await.unwrap();
        assert_eq!(engine.get_item_quantity(&p.id).await, 7);

        engine.update_quantity(&p.id, 7).await.unwrap();
        assert_eq!(engine.get_item_quantity(&p.id).await, 7);
    }

    #[tokio::test]
    async fn test_update_non_positive_removes() {
        let a = product(1, 2);
        let b = product(2, 2);
        let engine = empty_engine(&[]).await;
        engine.add_to_cart(&a, 3).await.unwrap();
        engine.add_to_cart(&b, 3).await.unwrap();

        engine.update_quantity(&a.id, 0).await.unwrap();
        engine.update_quantity(&b.id, -1).await.unwrap();

        assert!(!engine.is_in_cart(&a.id).await);
        assert!(!engine.is_in_cart(&b.id).await);
        assert!(snapshot(&engine).await.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_product_is_noop() {
        let engine = empty_engine(&[]).await;
        let state = engine
            .update_quantity(&ProductId::from(99), 5)
            .await
            .unwrap();
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_oversized_quantity() {
        let p = product(1, 2);
        let engine = empty_engine(&[]).await;
        engine.add_to_cart(&p, 1).await.unwrap();

        let result = engine.update_quantity(&p.id, i64::from(u32::MAX) + 1).await;
        assert!(matches!(result, Err(CartError::QuantityOverflow(_))));
        assert_eq!(engine.get_item_quantity(&p.id).await, 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let a = product(1, 2);
        let b = product(2, 3);
        let engine = empty_engine(&[]).await;
        engine.add_to_cart(&a, 1).await.unwrap();
        engine.add_to_cart(&b, 1).await.unwrap();

        let once = engine.remove_from_cart(&a.id).await;
        let twice = engine.remove_from_cart(&a.id).await;
        assert_eq!(once, twice);
        assert!(engine.is_in_cart(&b.id).await);
    }

    #[tokio::test]
    async fn test_mutations_write_snapshot() {
        let p = product(3, 4);
        let engine = empty_engine(&[]).await;
        let mut options = SelectedOptions::new();
        options.insert("color".to_string(), "red".to_string());

        engine.add_with_options(&p, 2, options.clone()).await.unwrap();

        let persisted = snapshot(&engine).await;
        assert_eq!(
            persisted,
            vec![PersistedLine {
                product_id: p.id.clone(),
                quantity: 2,
                unit_price: Decimal::new(4, 0),
                selected_options: options,
            }]
        );
    }

    #[tokio::test]
    async fn test_clear_erases_slot() {
        let p = product(1, 10);
        let engine = empty_engine(&[]).await;
        engine.add_to_cart(&p, 2).await.unwrap();

        let state = engine.clear_cart().await;

        assert_eq!(state.count, 0);
        assert_eq!(engine.cart_total().await, Decimal::ZERO);
        assert!(!engine.is_in_cart(&p.id).await);
        assert!(!engine.store().contains(CART_STORAGE_KEY).await);
    }

    #[tokio::test]
    async fn test_load_missing_snapshot_is_empty() {
        let engine = empty_engine(&[]).await;
        assert!(engine.state().await.is_empty());
        assert!(!engine.store().contains(CART_STORAGE_KEY).await);
    }

    #[tokio::test]
    async fn test_load_corrupt_snapshot_resets_slot() {
        let store = MemoryStore::with_slot(CART_STORAGE_KEY, "{not json");
        let engine = CartEngine::load(store, StubLookup::default()).await;

        assert!(engine.state().await.is_empty());
        assert!(!engine.store().contains(CART_STORAGE_KEY).await);
    }

    #[tokio::test]
    async fn test_load_drops_unresolvable_lines() {
        let snapshot = r#"[
            {"productId": "1", "quantity": 1, "unitPrice": "10", "selectedOptions": {}},
            {"productId": "2", "quantity": 2, "unitPrice": "20", "selectedOptions": {}},
            {"productId": "3", "quantity": 3, "unitPrice": "30", "selectedOptions": {}}
        ]"#;
        let lookup = StubLookup::with(&[product(1, 10), product(2, 20), product(3, 30)]).failing(2);
        let store = MemoryStore::with_slot(CART_STORAGE_KEY, snapshot);

        let engine = CartEngine::load(store, lookup).await;
        let state = engine.state().await;

        let ids: Vec<_> = state.items.iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(state.count, 4);
        assert_eq!(engine.lookup().calls.load(Ordering::SeqCst), 3);

        // Loading does not rewrite the snapshot
        let raw = engine.store().read(CART_STORAGE_KEY).await.unwrap().unwrap();
        assert_eq!(raw, snapshot);
    }

    #[tokio::test]
    async fn test_load_attaches_products() {
        let snapshot = r#"[{"productId": 5, "quantity": 1, "price": 9.5}]"#;
        let store = MemoryStore::with_slot(CART_STORAGE_KEY, snapshot);
        let engine = CartEngine::load(store, StubLookup::with(&[product(5, 12)])).await;

        let state = engine.state().await;
        let line = state.line(&ProductId::from(5)).unwrap();
        assert_eq!(line.product.as_ref().unwrap().name, "Product 5");
        // Unit price comes from the snapshot, not the live product
        assert_eq!(line.unit_price, Decimal::new(95, 1));
    }

    #[tokio::test]
    async fn test_load_normalizes_snapshot() {
        let snapshot = r#"[
            {"productId": "1", "quantity": 2, "unitPrice": "1"},
            {"productId": "2", "quantity": 0, "unitPrice": "1"},
            {"productId": "1", "quantity": 3, "unitPrice": "1"}
        ]"#;
        let store = MemoryStore::with_slot(CART_STORAGE_KEY, snapshot);
        let lookup = StubLookup::with(&[product(1, 1), product(2, 1)]);
        let engine = CartEngine::load(store, lookup).await;

        let state = engine.state().await;
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.count, 5);
    }

    #[tokio::test]
    async fn test_write_failure_keeps_memory_change() {
        let p = product(1, 10);
        let engine = CartEngine::load(BrokenStore, StubLookup::default()).await;

        let state = engine.add_to_cart(&p, 2).await.unwrap();
        assert_eq!(state.count, 2);
        assert_eq!(engine.get_item_quantity(&p.id).await, 2);

        let state = engine.clear_cart().await;
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_each_mutation() {
        let p = product(1, 10);
        let engine = empty_engine(&[]).await;
        let mut updates = engine.subscribe();

        engine.add_to_cart(&p, 2).await.unwrap();
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().count, 2);

        engine.clear_cart().await;
        assert_eq!(updates.borrow_and_update().count, 0);
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_serialized() {
        let p = product(1, 1);
        let engine = Arc::new(empty_engine(&[]).await);

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let p = p.clone();
                tokio::spawn(async move { engine.add_to_cart(&p, 1).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(engine.get_item_quantity(&p.id).await, 20);
        assert_eq!(snapshot(&engine).await[0].quantity, 20);
    }
}
