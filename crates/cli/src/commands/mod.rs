//! CLI subcommand implementations.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod order;

use marketpulse_core::Price;
use rust_decimal::Decimal;

/// Write command output to stdout.
#[allow(clippy::print_stdout)] // CLI output is the product of these commands
fn emit(text: &str) {
    println!("{text}");
}

/// Format an amount as US dollars.
fn money(amount: Decimal) -> String {
    Price::usd(amount).to_string()
}
