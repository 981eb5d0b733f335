//! Order total computation.

use serde::{Deserialize, Serialize};

use super::{CartLine, Money};

/// Flat tax applied to the subtotal, in percent.
pub const TAX_RATE_PERCENT: u32 = 10;

/// Totals for an order.
///
/// Shipping is free, so `total = subtotal + tax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Compute totals for a set of cart lines.
    #[must_use]
    pub fn for_lines(lines: &[CartLine]) -> Self {
        let subtotal: Money = lines.iter().map(CartLine::line_total).sum();
        let tax = subtotal.percent(TAX_RATE_PERCENT);
        let shipping = Money::ZERO;
        Self {
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }
}
