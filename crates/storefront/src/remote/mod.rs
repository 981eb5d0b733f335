//! Clients for the remote cart, order and catalog endpoints.
//!
//! # Architecture
//!
//! - The local cart is the source of truth for the UI; remote cart calls are
//!   advisory replication and their failures never roll back local state
//! - Order placement is the one remote call whose failure reaches the user
//! - Each concern is a trait so the engine and orchestrator can be driven by
//!   [`HttpBackend`] in production and [`InMemoryBackend`] in tests
//!
//! # Endpoints
//!
//! ```text
//! POST   carts/products/{productId}/quantity/{n}   set quantity
//! GET    carts/users/cart                          fetch authoritative cart
//! POST   cart/create                               push a guest cart
//! DELETE carts/{cartId}/product/{productId}        remove one product
//! POST   order/users/cod                           place cash-on-delivery order
//! GET    public/products?pageNumber=&pageSize=     catalog stock listing
//! ```

mod http;
mod memory;

pub use http::HttpBackend;
pub use memory::{InMemoryBackend, RemoteCall};

use async_trait::async_trait;
use ecomfront_core::{AddressId, CartId, CartLine, Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogEntry;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Backend answered with a non-success status.
    #[error("Backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The `message` field of a JSON error body.
        message: Option<String>,
        /// Raw body prefix, for logs only.
        body: String,
    },

    /// Endpoint URL could not be built.
    #[error("Invalid endpoint URL: {0}")]
    Url(String),

    /// Backend is unreachable (used by the in-memory backend).
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Error body shape returned by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Longest raw body prefix kept on a status error.
const ERROR_BODY_PREFIX: usize = 200;

impl RemoteError {
    /// Build a status error from a non-success response body.
    ///
    /// Only a JSON `message` field is treated as user-facing; anything else
    /// (field maps, proxy HTML) is kept for logging.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());
        Self::Status {
            status,
            message,
            body: body.chars().take(ERROR_BODY_PREFIX).collect(),
        }
    }

    /// A status error carrying a user-facing message.
    #[must_use]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Status {
            status,
            body: message.clone(),
            message: Some(message),
        }
    }

    /// The message the backend reported for the user, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// The backend's view of the signed-in user's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartSnapshot {
    /// Server cart id.
    #[serde(default)]
    pub cart_id: Option<CartId>,
    /// Server-computed cart total.
    #[serde(default)]
    pub total_price: Money,
    /// Cart lines.
    #[serde(default)]
    pub products: Vec<CartLine>,
}

/// Result of a successful order placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlacement {
    /// Confirmation message, when the backend sends one.
    #[serde(default)]
    pub message: Option<String>,
    /// Created order id.
    #[serde(default)]
    pub order_id: Option<OrderId>,
    /// Amount the backend charged.
    #[serde(default)]
    pub total_amount: Option<Money>,
    /// Backend order status text.
    #[serde(default)]
    pub order_status: Option<String>,
}

/// Cart replication endpoints.
#[async_trait]
pub trait RemoteCart: Send + Sync {
    /// Set the server-side quantity of one product.
    async fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<(), RemoteError>;

    /// Fetch the authoritative cart.
    async fn fetch_cart(&self) -> Result<RemoteCartSnapshot, RemoteError>;

    /// Push a full line list as the user's server cart.
    async fn create_cart(&self, lines: &[CartLine]) -> Result<(), RemoteError>;

    /// Remove one product from a server cart.
    async fn remove_product(&self, cart_id: CartId, product_id: &ProductId)
    -> Result<(), RemoteError>;
}

/// Order placement endpoint.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Place a cash-on-delivery order shipped to `address_id`.
    async fn place_cod_order(&self, address_id: AddressId) -> Result<OrderPlacement, RemoteError>;
}

/// Catalog stock listing.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch available stock for every listed product.
    async fn fetch_stock(&self) -> Result<Vec<CatalogEntry>, RemoteError>;
}
