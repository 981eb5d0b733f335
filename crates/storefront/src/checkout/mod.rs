//! Checkout orchestration.
//!
//! [`CheckoutOrchestrator::place_order`] validates the cart and address,
//! submits exactly one cash-on-delivery order and, only on success, clears
//! the cart together with its cache. A failed submission leaves both intact
//! so the user can retry.

mod selection;
mod state;

pub use selection::{CheckoutSelection, OrderSummary, ShippingAddress};
pub use state::CheckoutState;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ecomfront_core::{AddressId, OrderId, OrderTotals, PaymentMethod};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::cart::CartEngine;
use crate::remote::OrderService;

/// Reason shown when the server gives none.
pub const ORDER_FAILED_FALLBACK: &str = "Failed to place order";

/// Message used when the server accepts an order without one.
const ORDER_PLACED_DEFAULT: &str = "Order placed successfully";

/// Checkout preconditions that failed before any request was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Please select a shipping address")]
    MissingAddress,

    #[error("Payment method {0} is not supported")]
    UnsupportedPaymentMethod(String),
}

/// Errors from placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The order service refused or could not be reached.
    #[error("{0}")]
    OrderSubmission(String),

    #[error("An order is already being submitted")]
    AlreadySubmitting,
}

/// A successfully placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub message: String,
    pub order_id: Option<OrderId>,
    pub totals: OrderTotals,
    pub address_id: AddressId,
    pub payment_method: PaymentMethod,
    pub placed_at: DateTime<Utc>,
}

/// Drives one checkout attempt at a time against the order service.
pub struct CheckoutOrchestrator {
    orders: Arc<dyn OrderService>,
    state: CheckoutState,
    last_confirmation: Option<OrderConfirmation>,
}

impl CheckoutOrchestrator {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderService>) -> Self {
        Self {
            orders,
            state: CheckoutState::Idle,
            last_confirmation: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Confirmation of the most recent successful order.
    #[must_use]
    pub const fn last_confirmation(&self) -> Option<&OrderConfirmation> {
        self.last_confirmation.as_ref()
    }

    /// Return a finished attempt to `Idle`.
    pub fn reset(&mut self) {
        if self.state.is_terminal() {
            self.state = CheckoutState::Idle;
        }
    }

    /// Place a cash-on-delivery order for the cart.
    ///
    /// Totals are taken from the live cart at submission time. On success the
    /// cart and its cache are cleared; on failure neither is touched.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::AlreadySubmitting`] while an attempt is in flight
    /// - [`CheckoutError::Validation`] for an empty cart, a missing address
    ///   identifier, or a payment method other than cash on delivery; no
    ///   request is sent
    /// - [`CheckoutError::OrderSubmission`] with the server's message, or
    ///   [`ORDER_FAILED_FALLBACK`] when it has none
    #[instrument(skip_all, fields(lines = engine.lines().len()))]
    pub async fn place_order(
        &mut self,
        engine: &mut CartEngine,
        selection: &CheckoutSelection,
    ) -> Result<OrderConfirmation, CheckoutError> {
        if !self.state.can_submit() {
            return Err(CheckoutError::AlreadySubmitting);
        }
        self.state = CheckoutState::Idle;

        let address_id = match validate(engine, selection) {
            Ok(address_id) => address_id,
            Err(e) => {
                self.state = CheckoutState::Failed(e.to_string());
                return Err(e.into());
            }
        };

        let totals = engine.totals();
        self.state = CheckoutState::Submitting;
        info!(address_id = %address_id, total = %totals.total, "Submitting order");

        match self.orders.place_cod_order(address_id).await {
            Ok(placement) => {
                engine.clear();
                let confirmation = OrderConfirmation {
                    message: placement
                        .message
                        .unwrap_or_else(|| ORDER_PLACED_DEFAULT.to_string()),
                    order_id: placement.order_id,
                    totals,
                    address_id,
                    payment_method: selection.payment_method().clone(),
                    placed_at: Utc::now(),
                };
                info!(order_id = ?confirmation.order_id, "Order placed");
                self.state = CheckoutState::Succeeded;
                self.last_confirmation = Some(confirmation.clone());
                Ok(confirmation)
            }
            Err(e) => {
                warn!(error = %e, "Order submission failed, cart kept");
                let reason = e
                    .server_message()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(ORDER_FAILED_FALLBACK)
                    .to_string();
                self.state = CheckoutState::Failed(reason.clone());
                Err(CheckoutError::OrderSubmission(reason))
            }
        }
    }
}

fn validate(engine: &CartEngine, selection: &CheckoutSelection) -> Result<AddressId, ValidationError> {
    if engine.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    let address_id = selection.address_id().ok_or(ValidationError::MissingAddress)?;
    let method = selection.payment_method();
    if !method.is_cash_on_delivery() {
        return Err(ValidationError::UnsupportedPaymentMethod(method.to_string()));
    }
    Ok(address_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ecomfront_core::{Money, ProductId, ProductMeta};

    use super::*;
    use crate::cache::{CartCache, MemoryCartCache};
    use crate::catalog::Catalog;
    use crate::remote::{InMemoryBackend, OrderPlacement, RemoteCall, RemoteError};

    /// Order service answering every request with a fixed error body.
    struct RawErrorOrders(&'static str);

    #[async_trait::async_trait]
    impl OrderService for RawErrorOrders {
        async fn place_cod_order(&self, _: AddressId) -> Result<OrderPlacement, RemoteError> {
            Err(RemoteError::from_response(400, self.0))
        }
    }

    struct Fixture {
        backend: InMemoryBackend,
        cache: Arc<MemoryCartCache>,
        engine: CartEngine,
        selection: CheckoutSelection,
        checkout: CheckoutOrchestrator,
    }

    fn fixture() -> Fixture {
        let backend = InMemoryBackend::new();
        let cache = Arc::new(MemoryCartCache::new());
        let engine = CartEngine::restore(Catalog::default(), cache.clone());
        let checkout = CheckoutOrchestrator::new(Arc::new(backend.clone()));
        Fixture {
            backend,
            cache,
            engine,
            selection: CheckoutSelection::new(),
            checkout,
        }
    }

    fn fill(engine: &mut CartEngine) {
        let meta = ProductMeta {
            special_price: Money::from_units(500),
            ..ProductMeta::default()
        };
        engine.add_or_set_line(ProductId::from(1_i64), 3, &meta).unwrap();
    }

    fn address(id: i64) -> ShippingAddress {
        ShippingAddress {
            address_id: Some(AddressId::new(id)),
            ..ShippingAddress::default()
        }
    }

    #[tokio::test]
    async fn test_empty_cart_fails_without_request() {
        let mut f = fixture();
        f.selection.select_address(address(1));

        let err = f.checkout.place_order(&mut f.engine, &f.selection).await.unwrap_err();
        assert_eq!(err, CheckoutError::Validation(ValidationError::EmptyCart));
        assert_eq!(f.checkout.state(), &CheckoutState::Failed("Your cart is empty".into()));
        assert_eq!(f.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_address_id_fails_without_request() {
        let mut f = fixture();
        fill(&mut f.engine);
        f.selection.select_address(ShippingAddress::default());

        let err = f.checkout.place_order(&mut f.engine, &f.selection).await.unwrap_err();
        assert_eq!(err, CheckoutError::Validation(ValidationError::MissingAddress));
        assert!(f.checkout.state().failure_reason().is_some());
        assert_eq!(f.backend.call_count(), 0);
        assert_eq!(f.engine.item_count(), 3);
    }

    #[tokio::test]
    async fn test_unsupported_payment_method() {
        let mut f = fixture();
        fill(&mut f.engine);
        f.selection.select_address(address(1));
        f.selection.select_payment_method("Stripe");

        let err = f.checkout.place_order(&mut f.engine, &f.selection).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Validation(ValidationError::UnsupportedPaymentMethod(_))
        ));
        assert_eq!(f.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_clears_cart_and_cache() {
        let mut f = fixture();
        fill(&mut f.engine);
        f.selection.select_address(address(9));

        let confirmation = f
            .checkout
            .place_order(&mut f.engine, &f.selection)
            .await
            .unwrap();

        assert_eq!(f.checkout.state(), &CheckoutState::Succeeded);
        assert!(f.engine.is_empty());
        assert!(f.cache.load().is_empty());
        assert_eq!(confirmation.address_id, AddressId::new(9));
        assert_eq!(confirmation.totals.total, Money::from_units(1650));
        assert!(confirmation.payment_method.is_cash_on_delivery());
        assert_eq!(confirmation.message, "Order placed successfully");
        assert_eq!(f.checkout.last_confirmation(), Some(&confirmation));
        assert_eq!(
            f.backend.calls(),
            [RemoteCall::PlaceOrder {
                address_id: AddressId::new(9)
            }]
        );
    }

    #[tokio::test]
    async fn test_server_rejection_keeps_cart() {
        let mut f = fixture();
        fill(&mut f.engine);
        f.selection.select_address(address(9));
        f.backend.set_order_failure(Some("Address not found"));

        let err = f.checkout.place_order(&mut f.engine, &f.selection).await.unwrap_err();

        assert_eq!(err, CheckoutError::OrderSubmission("Address not found".into()));
        assert_eq!(f.checkout.state(), &CheckoutState::Failed("Address not found".into()));
        assert_eq!(f.engine.item_count(), 3);
        assert_eq!(f.cache.load().len(), 1);
        assert!(f.backend.placed_orders().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server_uses_fallback_message() {
        let mut f = fixture();
        fill(&mut f.engine);
        f.selection.select_address(address(9));
        f.backend.set_fail_requests(true);

        let err = f.checkout.place_order(&mut f.engine, &f.selection).await.unwrap_err();
        assert_eq!(err, CheckoutError::OrderSubmission(ORDER_FAILED_FALLBACK.into()));
        assert_eq!(f.engine.item_count(), 3);
    }

    #[tokio::test]
    async fn test_retry_after_failure_starts_over() {
        let mut f = fixture();
        fill(&mut f.engine);
        f.selection.select_address(address(9));
        f.backend.set_order_failure(Some("Try again"));
        assert!(f.checkout.place_order(&mut f.engine, &f.selection).await.is_err());

        f.backend.set_order_failure(None);
        f.checkout.place_order(&mut f.engine, &f.selection).await.unwrap();
        assert_eq!(f.checkout.state(), &CheckoutState::Succeeded);
        assert_eq!(f.backend.placed_orders(), [AddressId::new(9)]);

        f.checkout.reset();
        assert_eq!(f.checkout.state(), &CheckoutState::Idle);
    }

    #[tokio::test]
    async fn test_error_body_without_message_uses_fallback() {
        for body in [
            r#"{"addressId":"must not be null"}"#,
            "<html><body>502 Bad Gateway</body></html>",
        ] {
            let mut f = fixture();
            fill(&mut f.engine);
            f.selection.select_address(address(9));
            let mut checkout = CheckoutOrchestrator::new(Arc::new(RawErrorOrders(body)));

            let err = checkout.place_order(&mut f.engine, &f.selection).await.unwrap_err();
            assert_eq!(err, CheckoutError::OrderSubmission(ORDER_FAILED_FALLBACK.into()));
            assert_eq!(
                checkout.state(),
                &CheckoutState::Failed(ORDER_FAILED_FALLBACK.into())
            );
            assert_eq!(f.engine.item_count(), 3);
        }
    }
}
