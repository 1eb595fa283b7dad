//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! mp-cli cart show
//! mp-cli cart add 3 -q 2 -o size=M -o color=blue
//! mp-cli cart set 3 5
//! mp-cli cart remove 3
//! mp-cli cart clear
//! ```

use std::fmt::Write as _;

use marketpulse_core::{Product, ProductId};
use marketpulse_storefront::cart::{CartState, SelectedOptions};
use marketpulse_storefront::error::{AppError, Result, add_breadcrumb};
use marketpulse_storefront::state::AppState;
use tracing::{debug, info};

use super::{emit, money};

/// Parse a `name=value` option argument.
///
/// # Errors
///
/// Returns a message if there is no `=` or the name is blank.
pub fn parse_option(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("option name is empty in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Render the cart as a table plus totals.
pub fn render(state: &CartState) -> String {
    if state.is_empty() {
        return "Your cart is empty.".to_string();
    }

    let mut out = String::new();
    for item in &state.items {
        let name = item
            .product
            .as_ref()
            .map_or_else(|| format!("Product {}", item.product_id), |p| p.name.clone());
        let _ = write!(
            out,
            "{:>6}  {:<32} {:>4} x {:>10} = {:>10}",
            item.product_id,
            name,
            item.quantity,
            money(item.unit_price),
            money(item.line_total()),
        );
        if !item.selected_options.is_empty() {
            let options: Vec<String> = item
                .selected_options
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            let _ = write!(out, "  [{}]", options.join(", "));
        }
        out.push('\n');
    }
    let _ = write!(out, "{} item(s), total {}", state.count, money(state.total));
    out
}

/// Refuse products the catalog marks as out of stock.
///
/// # Errors
///
/// Returns `AppError::BadRequest` naming the product.
pub fn ensure_in_stock(product: &Product) -> Result<()> {
    if product.in_stock {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "{} (product {}) is out of stock",
            product.name, product.id
        )))
    }
}

/// Show the cart.
pub async fn show(state: &AppState) {
    emit(&render(&state.cart().state().await));
}

/// Add a product from the catalog.
///
/// # Errors
///
/// Returns an error if the product is not in the catalog, is out of stock,
/// or the quantity is invalid.
pub async fn add(
    state: &AppState,
    product_id: &ProductId,
    quantity: u32,
    options: SelectedOptions,
) -> Result<()> {
    let product = state.catalog().get_by_id(product_id).await?;
    ensure_in_stock(&product)?;
    let cart = state
        .cart()
        .add_with_options(&product, quantity, options)
        .await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.as_str())]),
    );
    info!(%product_id, quantity, cart_count = cart.count, "Added to cart");
    emit(&format!("Added {quantity} x {}.", product.name));
    emit(&render(&cart));
    Ok(())
}

/// Remove a product's line.
pub async fn remove(state: &AppState, product_id: &ProductId) {
    let was_present = state.cart().is_in_cart(product_id).await;
    let cart = state.cart().remove_from_cart(product_id).await;
    debug!(%product_id, was_present, "Removed from cart");
    if !was_present {
        emit(&format!("Product {product_id} is not in the cart."));
    }
    emit(&render(&cart));
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns an error if the quantity does not fit in a cart line.
pub async fn set(state: &AppState, product_id: &ProductId, quantity: i64) -> Result<()> {
    if !state.cart().is_in_cart(product_id).await {
        emit(&format!("Product {product_id} is not in the cart."));
    }
    let cart = state.cart().update_quantity(product_id, quantity).await?;
    debug!(%product_id, quantity, cart_count = cart.count, "Quantity set");
    emit(&render(&cart));
    Ok(())
}

/// Empty the cart.
pub async fn clear(state: &AppState) {
    state.cart().clear_cart().await;
    info!("Cart cleared");
    emit("Cart cleared.");
}
