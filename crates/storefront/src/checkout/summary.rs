//! Order summary pricing: shipping, tax, and the free-shipping nudge.

use marketpulse_core::price::round_cents;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartState;

/// Shipping and tax rules applied at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutPolicy {
    /// Subtotal at or above which shipping is free.
    pub free_shipping_threshold: Decimal,
    /// Shipping charged below the threshold.
    pub flat_shipping: Decimal,
    /// Tax rate applied to the subtotal (0.08 = 8%).
    pub tax_rate: Decimal,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::new(50, 0),
            flat_shipping: Decimal::new(999, 2),
            tax_rate: Decimal::new(8, 2),
        }
    }
}

/// Priced breakdown of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub item_count: u64,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    /// How much more the customer must add for free shipping (0 once reached).
    pub free_shipping_remaining: Decimal,
    /// Progress toward free shipping as a percentage, 0 to 100.
    pub free_shipping_progress: Decimal,
}

impl OrderSummary {
    /// Price a cart view under `policy`.
    ///
    /// An empty cart is free of shipping and tax so the summary reads as
    /// all zeros rather than a lone shipping charge.
    #[must_use]
    pub fn from_state(state: &CartState, policy: &CheckoutPolicy) -> Self {
        let subtotal = state.total;

        let shipping = if state.is_empty() || subtotal >= policy.free_shipping_threshold {
            Decimal::ZERO
        } else {
            policy.flat_shipping
        };
        let tax = round_cents(subtotal * policy.tax_rate);

        let free_shipping_remaining = (policy.free_shipping_threshold - subtotal).max(Decimal::ZERO);
        let free_shipping_progress = if policy.free_shipping_threshold.is_zero() {
            Decimal::ONE_HUNDRED
        } else {
            (subtotal / policy.free_shipping_threshold * Decimal::ONE_HUNDRED)
                .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
                .round_dp(2)
        };

        Self {
            item_count: state.count,
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
            free_shipping_remaining,
            free_shipping_progress,
        }
    }

    /// Whether the order ships free.
    #[must_use]
    pub fn ships_free(&self) -> bool {
        self.shipping.is_zero()
    }
}
