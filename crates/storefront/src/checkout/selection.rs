//! Address and payment selection for checkout, and the order summary.

use ecomfront_core::{AddressId, CartLine, OrderTotals, PaymentMethod};
use serde::{Deserialize, Serialize};

/// A shipping address as the address service returns it.
///
/// Only `address_id` matters for placing an order; the rest is shown back in
/// the order summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub address_id: Option<AddressId>,
    pub building_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pincode: String,
}

/// Address and payment method chosen for the next order.
#[derive(Debug, Clone, Default)]
pub struct CheckoutSelection {
    address: Option<ShippingAddress>,
    payment_method: PaymentMethod,
}

impl CheckoutSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_address(&mut self, address: ShippingAddress) {
        self.address = Some(address);
    }

    pub fn clear_address(&mut self) {
        self.address = None;
    }

    /// Select a payment method by code. Blank input falls back to COD.
    pub fn select_payment_method(&mut self, code: &str) {
        self.payment_method = PaymentMethod::new(code);
    }

    #[must_use]
    pub const fn address(&self) -> Option<&ShippingAddress> {
        self.address.as_ref()
    }

    /// The selected address's identifier, if both exist.
    #[must_use]
    pub fn address_id(&self) -> Option<AddressId> {
        self.address.as_ref().and_then(|a| a.address_id)
    }

    #[must_use]
    pub const fn payment_method(&self) -> &PaymentMethod {
        &self.payment_method
    }

    /// Summarize an order for the given cart lines.
    #[must_use]
    pub fn summary(&self, lines: &[CartLine]) -> OrderSummary {
        OrderSummary {
            lines: lines.to_vec(),
            totals: OrderTotals::for_lines(lines),
            address: self.address.clone(),
            payment_method: self.payment_method.clone(),
            can_place_order: !lines.is_empty()
                && self.address_id().is_some()
                && self.payment_method.is_cash_on_delivery(),
        }
    }
}

/// What the order review step shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub lines: Vec<CartLine>,
    pub totals: OrderTotals,
    pub address: Option<ShippingAddress>,
    pub payment_method: PaymentMethod,
    /// Whether the "place order" action should be enabled.
    pub can_place_order: bool,
}
