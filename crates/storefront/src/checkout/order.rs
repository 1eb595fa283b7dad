//! Orders produced by checkout and the sink that records them.
//!
//! [`StoredOrderSink`] keeps the order history in the same durable store as
//! the cart, so order numbers and lookups survive restarts.

use std::future::Future;

use chrono::{DateTime, Utc};
use marketpulse_core::{OrderId, OrderStatus, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use super::summary::OrderSummary;
use crate::cart::{CartLineItem, CartStore, SelectedOptions, StoreError};

/// Where an order ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "United States".to_string()
}

impl ShippingAddress {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("zipCode", &self.zip_code),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Full name for display.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// A cart line frozen into an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    /// Product name at order time, when the product was resolved.
    pub name: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    #[serde(default)]
    pub selected_options: SelectedOptions,
}

impl From<&CartLineItem> for OrderLine {
    fn from(item: &CartLineItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            name: item.product.as_ref().map(|p| p.name.clone()),
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.line_total(),
            selected_options: item.selected_options.clone(),
        }
    }
}

/// An order awaiting an ID from the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<OrderLine>,
    pub summary: OrderSummary,
    pub shipping_address: ShippingAddress,
    pub placed_at: DateTime<Utc>,
    pub status: OrderStatus,
}

/// A recorded order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(flatten)]
    pub details: NewOrder,
}

impl Order {
    /// Customer-facing order number, e.g. `#000042` for numeric IDs.
    #[must_use]
    pub fn number(&self) -> String {
        let id = self.id.as_str();
        if id.bytes().all(|b| b.is_ascii_digit()) {
            format!("#{id:0>6}")
        } else {
            format!("#{id}")
        }
    }
}

/// Errors returned by an [`OrderSink`].
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order service rejected or failed to record the order.
    #[error("Order rejected: {0}")]
    Rejected(String),

    /// No order with this ID.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The order history could not be read or written.
    #[error("Order storage failed: {0}")]
    Store(#[from] StoreError),

    /// The stored order history is not a JSON array of orders.
    #[error("Order history is unreadable: {0}")]
    Format(#[source] serde_json::Error),
}

/// Records placed orders and assigns their IDs.
pub trait OrderSink: Send + Sync {
    /// Record an order.
    ///
    /// # Errors
    ///
    /// Returns an `OrderError` if the order could not be recorded.
    fn submit(&self, order: NewOrder) -> impl Future<Output = Result<Order, OrderError>> + Send;
}

/// Store key holding the order history.
pub const ORDER_STORAGE_KEY: &str = "marketpulse_orders";

/// Order history kept as one JSON array in a [`CartStore`] slot.
///
/// IDs are sequential numbers that continue across restarts: a new order
/// gets one more than the largest recorded ID. Read-modify-write cycles on
/// the history are serialized within the process. A history that does not
/// parse is never overwritten; submissions fail until it is repaired.
#[derive(Debug)]
pub struct StoredOrderSink<S> {
    store: S,
    key: String,
    write_lock: Mutex<()>,
}

impl<S: CartStore> StoredOrderSink<S> {
    /// Keep the history under [`ORDER_STORAGE_KEY`] in `store`.
    pub fn new(store: S) -> Self {
        Self::with_key(store, ORDER_STORAGE_KEY)
    }

    /// Keep the history under a specific key.
    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    async fn read_orders(&self) -> Result<Vec<Order>, OrderError> {
        match self.store.read(&self.key).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(OrderError::Format),
            None => Ok(Vec::new()),
        }
    }

    async fn write_orders(&self, orders: &[Order]) -> Result<(), OrderError> {
        let json = serde_json::to_string(orders).map_err(OrderError::Format)?;
        self.store.write(&self.key, &json).await?;
        Ok(())
    }

    /// All recorded orders, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Store` or `OrderError::Format` if the history
    /// cannot be read.
    pub async fn all(&self) -> Result<Vec<Order>, OrderError> {
        self.read_orders().await
    }

    /// Get one order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if no order has this ID, or a storage
    /// error if the history cannot be read.
    pub async fn get(&self, id: &OrderId) -> Result<Order, OrderError> {
        self.read_orders()
            .await?
            .into_iter()
            .find(|order| &order.id == id)
            .ok_or_else(|| OrderError::NotFound(id.clone()))
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if no order has this ID, or a storage
    /// error if the history cannot be read or written.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order, OrderError> {
        let _guard = self.write_lock.lock().await;
        let mut orders = self.read_orders().await?;
        let order = orders
            .iter_mut()
            .find(|order| &order.id == id)
            .ok_or_else(|| OrderError::NotFound(id.clone()))?;
        order.details.status = status;
        let updated = order.clone();

        self.write_orders(&orders).await?;
        info!(%status, "Order status updated");
        Ok(updated)
    }
}

/// One more than the largest numeric ID, or 1 for an empty history.
fn next_order_id(orders: &[Order]) -> Result<OrderId, OrderError> {
    match orders.iter().filter_map(|order| order.id.as_number()).max() {
        None => Ok(OrderId::from(1)),
        Some(max) => max
            .checked_add(1)
            .map(OrderId::from)
            .ok_or_else(|| OrderError::Rejected(format!("no order IDs left after {max}"))),
    }
}

impl<S: CartStore> OrderSink for StoredOrderSink<S> {
    #[instrument(skip_all, fields(key = %self.key))]
    async fn submit(&self, order: NewOrder) -> Result<Order, OrderError> {
        let _guard = self.write_lock.lock().await;
        let mut orders = self.read_orders().await?;
        let order = Order {
            id: next_order_id(&orders)?,
            details: order,
        };
        orders.push(order.clone());

        self.write_orders(&orders).await?;
        debug!(order_id = %order.id, recorded = orders.len(), "Order recorded");
        Ok(order)
    }
}
