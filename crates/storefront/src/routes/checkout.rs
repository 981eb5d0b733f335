//! Checkout route handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::checkout::{CheckoutState, OrderConfirmation, OrderSummary, ShippingAddress};
use crate::error::{AppError, Result};
use crate::session::CartSession;
use crate::state::AppState;

/// Checkout page data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub summary: OrderSummary,
    pub state: CheckoutState,
    pub last_confirmation: Option<OrderConfirmation>,
}

impl From<&CartSession> for CheckoutView {
    fn from(session: &CartSession) -> Self {
        Self {
            summary: session.summary(),
            state: session.checkout.state().clone(),
            last_confirmation: session.checkout.last_confirmation().cloned(),
        }
    }
}

/// Response to a checkout selection change.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub notice: String,
    pub checkout: CheckoutView,
}

/// Response to a placed order.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub notice: String,
    pub order: OrderConfirmation,
}

/// Payment method selection request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub payment_method: String,
}

/// Show the order summary and checkout state.
pub async fn show(State(state): State<AppState>) -> Json<CheckoutView> {
    let session = state.session().await;
    Json(CheckoutView::from(&*session))
}

/// Select the shipping address.
#[instrument(skip_all, fields(address_id = ?address.address_id))]
pub async fn select_address(
    State(state): State<AppState>,
    Json(address): Json<ShippingAddress>,
) -> Json<CheckoutResponse> {
    let mut session = state.session().await;
    session.selection.select_address(address);
    session.checkout.reset();
    Json(CheckoutResponse {
        notice: "Address selected".to_string(),
        checkout: CheckoutView::from(&*session),
    })
}

/// Select the payment method.
#[instrument(skip(state))]
pub async fn select_payment(
    State(state): State<AppState>,
    Json(request): Json<PaymentRequest>,
) -> Json<CheckoutResponse> {
    let mut session = state.session().await;
    session.selection.select_payment_method(&request.payment_method);
    session.checkout.reset();
    let notice = format!("Payment method set to {}", session.selection.payment_method());
    Json(CheckoutResponse {
        notice,
        checkout: CheckoutView::from(&*session),
    })
}

/// Place the order.
///
/// Submission runs in its own task so a dropped connection cannot leave the
/// checkout stuck in `Submitting`.
#[instrument(skip(state))]
pub async fn place_order(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let mut session = state.session_owned().await;
    let confirmation = tokio::spawn(async move { session.place_order().await })
        .await
        .map_err(|e| AppError::Internal(format!("Order task failed: {e}")))??;

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            notice: confirmation.message.clone(),
            order: confirmation,
        }),
    ))
}
