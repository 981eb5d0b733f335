//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::cart::CartError;
use crate::checkout::CheckoutError;
use crate::remote::RemoteError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart mutation refused.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout refused or order submission failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Backend call failed.
    #[error("Backend error: {0}")]
    Remote(#[from] RemoteError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Feature not available in this deployment.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    notice: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Cart(err) => match err {
                CartError::OutOfStock { .. }
                | CartError::QuantityLimitReached { .. }
                | CartError::ProductNotFound(_) => StatusCode::CONFLICT,
                CartError::NotInCart(_) => StatusCode::NOT_FOUND,
                CartError::InvalidQuantity => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::Checkout(err) => match err {
                CheckoutError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::OrderSubmission(_) => StatusCode::BAD_GATEWAY,
                CheckoutError::AlreadySubmitting => StatusCode::CONFLICT,
            },
            Self::Remote(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the shopper.
    fn notice(&self) -> String {
        match self {
            Self::Cart(err) => err.user_message().to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Remote(_) => "Could not reach the cart service".to_string(),
            Self::BadRequest(msg) | Self::Unavailable(msg) => msg.clone(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Remote(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let notice = self.notice();

        // Don't expose internal error details to clients
        let error = match &self {
            Self::Remote(_) | Self::Internal(_) => notice.clone(),
            _ => self.to_string(),
        };

        (status, Json(ErrorBody { error, notice })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
