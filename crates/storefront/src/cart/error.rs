//! Cart mutation errors.

use ecomfront_core::ProductId;
use thiserror::Error;

/// Reasons a cart mutation is refused. The cart is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Requested quantity exceeds known availability.
    #[error("Product {product_id} is out of stock: requested {requested}, available {available}")]
    OutOfStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Increase blocked at the stock ceiling.
    #[error("Quantity limit reached for product {product_id}: {available} available")]
    QuantityLimitReached {
        product_id: ProductId,
        available: u32,
    },

    /// The catalog does not list the product, so its stock is unknown.
    #[error("Product {0} not found in catalog")]
    ProductNotFound(ProductId),

    /// The product has no line in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    /// A line cannot be set to zero units; removal is a separate action.
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
}

impl CartError {
    /// Short message suitable for a toast notification.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::OutOfStock { .. } => "Out of stock",
            Self::QuantityLimitReached { .. } => "Quantity reached the available limit",
            Self::ProductNotFound(_) => "Product not found",
            Self::NotInCart(_) => "Item is no longer in your cart",
            Self::InvalidQuantity => "Quantity must be at least 1",
        }
    }
}
