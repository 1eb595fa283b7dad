//! Order history commands.
//!
//! # Usage
//!
//! ```bash
//! mp-cli order list
//! mp-cli order show 1
//! mp-cli order status 1 shipped
//! ```

use std::fmt::Write as _;

use marketpulse_core::{OrderId, OrderStatus};
use marketpulse_storefront::checkout::Order;
use marketpulse_storefront::error::Result;
use marketpulse_storefront::state::AppState;
use tracing::info;

use super::{checkout, emit, money};

/// One-line listing for an order.
pub fn render_row(order: &Order) -> String {
    format!(
        "{:<8} {}  {:<10} {:>10}  {}",
        order.number(),
        order.details.placed_at.format("%Y-%m-%d %H:%M"),
        order.details.status.to_string(),
        money(order.details.summary.total),
        order.details.shipping_address.full_name()
    )
}

/// Full order detail: header, address, lines, and the priced summary.
pub fn render(order: &Order) -> String {
    let details = &order.details;
    let address = &details.shipping_address;

    let mut out = String::new();
    let _ = writeln!(out, "Order {} ({})", order.number(), details.status);
    let _ = writeln!(out, "Placed:    {}", details.placed_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(out, "Ship to:   {} <{}>", address.full_name(), address.email);
    let _ = writeln!(
        out,
        "           {}, {}, {} {}, {}",
        address.address, address.city, address.state, address.zip_code, address.country
    );
    for line in &details.items {
        let name = line
            .name
            .clone()
            .unwrap_or_else(|| format!("Product {}", line.product_id));
        let _ = writeln!(
            out,
            "{:>6}  {:<32} {:>4} x {:>10} = {:>10}",
            line.product_id,
            name,
            line.quantity,
            money(line.unit_price),
            money(line.line_total)
        );
    }
    out.push_str(&checkout::render(&details.summary));
    out
}

/// List every recorded order, oldest first.
///
/// # Errors
///
/// Returns an error if the order history cannot be read.
pub async fn list(state: &AppState) -> Result<()> {
    let orders = state.checkout().sink().all().await?;
    if orders.is_empty() {
        emit("No orders yet.");
        return Ok(());
    }
    for order in &orders {
        emit(&render_row(order));
    }
    Ok(())
}

/// Show one order.
///
/// # Errors
///
/// Returns an error if there is no such order or the history cannot be read.
pub async fn show(state: &AppState, order_id: &OrderId) -> Result<()> {
    let order = state.checkout().sink().get(order_id).await?;
    emit(&render(&order));
    Ok(())
}

/// Move an order to a new status.
///
/// # Errors
///
/// Returns an error if there is no such order or the history cannot be
/// written.
pub async fn set_status(state: &AppState, order_id: &OrderId, status: OrderStatus) -> Result<()> {
    let order = state
        .checkout()
        .sink()
        .update_status(order_id, status)
        .await?;
    info!(order = %order.number(), %status, "Order status changed");
    emit(&format!("Order {} is now {}.", order.number(), order.details.status));
    Ok(())
}
