//! Payment method selection.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The payment method chosen at checkout.
///
/// Kept as the backend's free-form string. Only cash on delivery is placed
/// through the order endpoint today, which is also the default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethod(String);

impl PaymentMethod {
    /// Code for cash on delivery.
    pub const CASH_ON_DELIVERY: &'static str = "COD";

    /// Create a payment method from its code. Blank input selects the default.
    #[must_use]
    pub fn new(code: &str) -> Self {
        let code = code.trim();
        if code.is_empty() {
            Self::default()
        } else {
            Self(code.to_owned())
        }
    }

    /// Returns the method code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is cash on delivery.
    #[must_use]
    pub fn is_cash_on_delivery(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::CASH_ON_DELIVERY)
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self(Self::CASH_ON_DELIVERY.to_owned())
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
