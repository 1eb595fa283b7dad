//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are `rust_decimal::Decimal` in the currency's standard unit
//! (dollars, not cents). Floating point never touches a money value.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price from an amount in the smallest currency unit.
    #[must_use]
    pub fn from_cents(cents: i64, currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::new(cents, 2), currency_code)
    }

    /// Create a USD price.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::USD)
    }

    /// The amount rounded to cents, midpoint away from zero.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        round_cents(self.amount)
    }
}

impl fmt::Display for Price {
    /// Formats as symbol plus two decimals, e.g. `$19.99` or `-$5.00`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded();
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        write!(
            f,
            "{sign}{}{:.2}",
            self.currency_code.symbol(),
            rounded.abs()
        )
    }
}

/// Round a money amount to two decimal places, midpoint away from zero.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "\u{20ac}",
            Self::GBP => "\u{a3}",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        let price = Price::usd(Decimal::new(10, 0));
        assert_eq!(price.to_string(), "$10.00");
    }

    #[test]
    fn test_display_rounds_half_up() {
        let price = Price::usd(Decimal::new(12_345, 3));
        assert_eq!(price.to_string(), "$12.35");
    }

    #[test]
    fn test_display_negative() {
        let price = Price::from_cents(-500, CurrencyCode::USD);
        assert_eq!(price.to_string(), "-$5.00");
    }

    #[test]
    fn test_display_other_currency() {
        let price = Price::from_cents(1999, CurrencyCode::GBP);
        assert_eq!(price.to_string(), "\u{a3}19.99");
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(Decimal::new(7992, 4)), Decimal::new(80, 2));
        assert_eq!(round_cents(Decimal::new(125, 3)), Decimal::new(13, 2));
    }

    #[test]
    fn test_currency_code_default() {
        assert_eq!(CurrencyCode::default().code(), "USD");
    }
}
