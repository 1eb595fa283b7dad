//! MarketPulse Core - Shared types library.
//!
//! This crate provides common types used across all MarketPulse components:
//! - `storefront` - Cart engine, catalog lookup, and checkout pricing
//! - `cli` - Command-line tools for driving a cart against local storage
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, products, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
