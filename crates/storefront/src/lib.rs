//! Ecomfront storefront library.
//!
//! Cart reconciliation and checkout for the Ecomfront storefront: a local
//! cart that is the source of truth for the shopper, a durable cache that
//! survives restarts, best-effort replication to the user's server cart, and
//! a checkout orchestrator that turns the cart into a cash-on-delivery order.
//!
//! The crate is a library so that the HTTP surface and the engine can be
//! exercised from tests; `main.rs` only wires configuration to it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod middleware;
pub mod remote;
pub mod routes;
pub mod session;
pub mod state;
