//! Checkout commands.
//!
//! Orders are recorded in the order history under the data directory and
//! reported on stdout; the cart is cleared once the order is accepted. Look
//! an order up again with `mp-cli order show <id>`.

use std::fmt::Write as _;

use marketpulse_storefront::checkout::{OrderSummary, ShippingAddress};
use marketpulse_storefront::error::Result;
use marketpulse_storefront::state::AppState;
use tracing::info;

use super::{emit, money};

/// Render a priced summary.
pub fn render(summary: &OrderSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Items:     {}", summary.item_count);
    let _ = writeln!(out, "Subtotal:  {}", money(summary.subtotal));
    if summary.ships_free() {
        let _ = writeln!(out, "Shipping:  FREE");
    } else {
        let _ = writeln!(out, "Shipping:  {}", money(summary.shipping));
    }
    let _ = writeln!(out, "Tax:       {}", money(summary.tax));
    let _ = write!(out, "Total:     {}", money(summary.total));
    if !summary.free_shipping_remaining.is_zero() && summary.item_count > 0 {
        let _ = write!(
            out,
            "\nAdd {} more for free shipping ({}% there).",
            money(summary.free_shipping_remaining),
            summary.free_shipping_progress.normalize()
        );
    }
    out
}

/// Show what checkout would charge for the current cart.
pub async fn summary(state: &AppState) {
    let summary = state.checkout().summary(state.cart()).await;
    emit(&render(&summary));
}

/// Place an order for the current cart.
///
/// # Errors
///
/// Returns an error if the cart is empty, the address is incomplete, or the
/// order is rejected.
pub async fn place(state: &AppState, address: ShippingAddress) -> Result<()> {
    let order = state.checkout().place_order(state.cart(), address).await?;
    info!(order = %order.number(), lines = order.details.items.len(), "Checkout complete");

    emit(&format!(
        "Order {} placed for {} ({}).",
        order.number(),
        order.details.shipping_address.full_name(),
        order.details.status
    ));
    emit(&render(&order.details.summary));
    Ok(())
}

#[cfg(test)]
mod tests {
    use marketpulse_storefront::cart::CartState;
    use marketpulse_storefront::checkout::CheckoutPolicy;

    use super::*;

    #[test]
    fn test_render_empty_cart() {
        let summary = OrderSummary::from_state(&CartState::default(), &CheckoutPolicy::default());
        let text = render(&summary);
        assert!(text.contains("Shipping:  FREE"));
        assert!(text.ends_with("Total:     $0.00"));
    }
}
