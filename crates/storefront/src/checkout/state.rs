//! Checkout state machine.

use std::fmt;

use serde::Serialize;

/// Where the current checkout attempt stands.
///
/// `Idle -> Submitting -> Succeeded | Failed`. A new attempt starts again
/// from `Idle`; nothing retries automatically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum CheckoutState {
    /// No attempt in progress.
    #[default]
    Idle,

    /// The order request is in flight.
    Submitting,

    /// The order was accepted and the cart cleared.
    Succeeded,

    /// The attempt failed; the cart is untouched.
    Failed(String),
}

impl CheckoutState {
    /// Returns true if a new attempt may start.
    #[must_use]
    pub const fn can_submit(&self) -> bool {
        !matches!(self, Self::Submitting)
    }

    /// Returns true if the last attempt has finished either way.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }

    /// The failure reason, if the last attempt failed.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Returns the state name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Submitting => "Submitting",
            Self::Succeeded => "Succeeded",
            Self::Failed(_) => "Failed",
        }
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
