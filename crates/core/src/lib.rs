//! Ecomfront Core - Shared cart and checkout types.
//!
//! This crate provides the value types shared by the cart synchronization
//! core and its callers:
//! - `storefront` - Cart engine, durable cache, remote client, checkout
//! - `integration-tests` - Cross-component scenarios
//!
//! # Architecture
//!
//! The core crate contains only types and pure arithmetic - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Identifiers, money, cart lines, payment methods and totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
