//! MarketPulse storefront library.
//!
//! The shopping cart engine and the services around it: the product
//! catalog and its reviews, checkout with a durable order history,
//! configuration, and telemetry. The `mp-cli` binary
//! drives this crate; integration tests exercise it directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod reviews;
pub mod state;
pub mod telemetry;
