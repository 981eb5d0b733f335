//! The per-storefront cart session.

use std::sync::Arc;

use crate::cart::CartEngine;
use crate::checkout::{
    CheckoutError, CheckoutOrchestrator, CheckoutSelection, OrderConfirmation, OrderSummary,
};
use crate::remote::OrderService;

/// Everything one shopper's checkout flow needs, owned together so that a
/// single lock serializes every mutation in dispatch order.
pub struct CartSession {
    pub engine: CartEngine,
    pub selection: CheckoutSelection,
    pub checkout: CheckoutOrchestrator,
}

impl CartSession {
    #[must_use]
    pub fn new(engine: CartEngine, orders: Arc<dyn OrderService>) -> Self {
        Self {
            engine,
            selection: CheckoutSelection::new(),
            checkout: CheckoutOrchestrator::new(orders),
        }
    }

    /// The order review for the current cart and selection.
    #[must_use]
    pub fn summary(&self) -> OrderSummary {
        self.selection.summary(self.engine.lines())
    }

    /// Place an order for the current cart.
    ///
    /// # Errors
    ///
    /// See [`CheckoutOrchestrator::place_order`].
    pub async fn place_order(&mut self) -> Result<OrderConfirmation, CheckoutError> {
        self.checkout
            .place_order(&mut self.engine, &self.selection)
            .await
    }
}
