//! Cart line items, their durable projection, and the derived cart view.

use std::collections::BTreeMap;

use marketpulse_core::{Product, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Option name to chosen value (e.g. `size -> L`). Not validated by the cart.
pub type SelectedOptions = BTreeMap<String, String>;

/// One row in the cart: a distinct product and how many of it.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineItem {
    pub product_id: ProductId,
    /// Always at least 1 while the line is in the cart.
    pub quantity: u32,
    /// Product price captured when the line was created.
    pub unit_price: Decimal,
    pub selected_options: SelectedOptions,
    /// Resolved product details. Runtime only, never persisted.
    pub product: Option<Product>,
}

impl CartLineItem {
    /// Price of the whole line (`unit_price × quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// The durable projection of this line.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedLine {
        PersistedLine {
            product_id: self.product_id.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            selected_options: self.selected_options.clone(),
        }
    }
}

/// The durable form of a line item, as written to the snapshot slot.
///
/// Older snapshots call the unit price `price`; both names are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLine {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(alias = "price")]
    pub unit_price: Decimal,
    #[serde(default)]
    pub selected_options: SelectedOptions,
}

impl PersistedLine {
    /// Attach a resolved product, producing a working line item.
    #[must_use]
    pub fn enrich(self, product: Product) -> CartLineItem {
        CartLineItem {
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            selected_options: self.selected_options,
            product: Some(product),
        }
    }
}

/// Point-in-time view of the cart handed to callers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartState {
    pub items: Vec<CartLineItem>,
    /// Sum of all line quantities.
    pub count: u64,
    /// Sum of all line totals.
    pub total: Decimal,
}

impl CartState {
    /// Build a view over the given lines, deriving count and total.
    #[must_use]
    pub fn from_items(items: &[CartLineItem]) -> Self {
        Self {
            items: items.to_vec(),
            count: cart_count(items),
            total: cart_total(items),
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find the line for a product.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }
}

/// Sum of quantities across lines.
#[must_use]
pub fn cart_count(items: &[CartLineItem]) -> u64 {
    items.iter().map(|item| u64::from(item.quantity)).sum()
}

/// Sum of `unit_price × quantity` across lines.
#[must_use]
pub fn cart_total(items: &[CartLineItem]) -> Decimal {
    items.iter().map(CartLineItem::line_total).sum()
}
