//! Core types for Ecomfront.
//!
//! This module provides type-safe wrappers for cart and checkout concepts.

pub mod id;
pub mod line;
pub mod money;
pub mod payment;
pub mod product;
pub mod totals;

pub use id::*;
pub use line::{CartLine, ProductMeta};
pub use money::Money;
pub use payment::PaymentMethod;
pub use product::{ProductId, ProductIdError};
pub use totals::{OrderTotals, TAX_RATE_PERCENT};
