//! In-memory backend for tests and local development.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use ecomfront_core::{AddressId, CartId, CartLine, Money, OrderId, ProductId, ProductMeta};

use super::{
    CatalogSource, OrderPlacement, OrderService, RemoteCart, RemoteCartSnapshot, RemoteError,
};
use crate::catalog::CatalogEntry;

/// A call received by the in-memory backend, recorded even when it fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    SetQuantity {
        product_id: ProductId,
        quantity: u32,
    },
    FetchCart,
    CreateCart {
        lines: usize,
    },
    RemoveProduct {
        cart_id: CartId,
        product_id: ProductId,
    },
    PlaceOrder {
        address_id: AddressId,
    },
    FetchStock,
}

#[derive(Debug, Default)]
struct InMemoryState {
    stock: HashMap<ProductId, u32>,
    cart: Vec<CartLine>,
    cart_id: Option<CartId>,
    calls: Vec<RemoteCall>,
    orders: Vec<AddressId>,
    next_order_id: i64,
    fail_requests: bool,
    order_failure: Option<String>,
}

impl InMemoryState {
    fn snapshot(&self) -> RemoteCartSnapshot {
        RemoteCartSnapshot {
            cart_id: self.cart_id,
            total_price: self.cart.iter().map(CartLine::line_total).sum(),
            products: self.cart.clone(),
        }
    }

    fn ensure_cart(&mut self) -> CartId {
        *self.cart_id.get_or_insert(CartId::new(1))
    }
}

/// In-memory backend implementing every remote trait.
///
/// Clones share state, so a test can hand one clone to the engine and keep
/// another to inspect recorded calls.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call, then fail it if the backend is configured to be down.
    fn record(&self, call: RemoteCall) -> Result<MutexGuard<'_, InMemoryState>, RemoteError> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.fail_requests {
            return Err(RemoteError::Unavailable("connection refused".to_string()));
        }
        Ok(state)
    }

    /// Make every subsequent request fail (or succeed again).
    pub fn set_fail_requests(&self, fail: bool) {
        self.lock().fail_requests = fail;
    }

    /// Make order placement fail with a server message (or succeed again).
    pub fn set_order_failure(&self, message: Option<&str>) {
        self.lock().order_failure = message.map(String::from);
    }

    /// Set listed stock for a product.
    ///
    /// # Panics
    ///
    /// Panics if `product_id` is empty.
    #[allow(clippy::expect_used)]
    pub fn set_stock(&self, product_id: &str, quantity: u32) {
        let id = ProductId::parse(product_id).expect("test product id must not be empty");
        self.lock().stock.insert(id, quantity);
    }

    /// Replace the server-side cart.
    pub fn set_server_cart(&self, lines: Vec<CartLine>, cart_id: Option<CartId>) {
        let mut state = self.lock();
        state.cart = lines;
        state.cart_id = cart_id;
    }

    /// Current server-side cart.
    #[must_use]
    pub fn server_cart(&self) -> RemoteCartSnapshot {
        self.lock().snapshot()
    }

    /// Every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Addresses of orders successfully placed.
    #[must_use]
    pub fn placed_orders(&self) -> Vec<AddressId> {
        self.lock().orders.clone()
    }
}

#[async_trait]
impl RemoteCart for InMemoryBackend {
    async fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<(), RemoteError> {
        let mut state = self.record(RemoteCall::SetQuantity {
            product_id: product_id.clone(),
            quantity,
        })?;
        state.ensure_cart();
        if let Some(line) = state.cart.iter_mut().find(|l| &l.product_id == product_id) {
            line.quantity = quantity;
        } else {
            let line = ProductMeta::default().to_line(product_id.clone(), quantity);
            state.cart.push(line);
        }
        Ok(())
    }

    async fn fetch_cart(&self) -> Result<RemoteCartSnapshot, RemoteError> {
        let state = self.record(RemoteCall::FetchCart)?;
        if state.cart_id.is_none() {
            return Err(RemoteError::rejected(404, "Cart not found"));
        }
        Ok(state.snapshot())
    }

    async fn create_cart(&self, lines: &[CartLine]) -> Result<(), RemoteError> {
        let mut state = self.record(RemoteCall::CreateCart { lines: lines.len() })?;
        state.ensure_cart();
        for line in lines {
            if let Some(existing) = state
                .cart
                .iter_mut()
                .find(|l| l.product_id == line.product_id)
            {
                existing.quantity = line.quantity;
            } else {
                state.cart.push(line.clone());
            }
        }
        Ok(())
    }

    async fn remove_product(
        &self,
        cart_id: CartId,
        product_id: &ProductId,
    ) -> Result<(), RemoteError> {
        let mut state = self.record(RemoteCall::RemoveProduct {
            cart_id,
            product_id: product_id.clone(),
        })?;
        if state.cart_id != Some(cart_id) {
            return Err(RemoteError::rejected(
                404,
                format!("Cart not found with cartId: {cart_id}"),
            ));
        }
        state.cart.retain(|l| &l.product_id != product_id);
        Ok(())
    }
}

#[async_trait]
impl OrderService for InMemoryBackend {
    async fn place_cod_order(&self, address_id: AddressId) -> Result<OrderPlacement, RemoteError> {
        let mut state = self.record(RemoteCall::PlaceOrder { address_id })?;
        if let Some(message) = state.order_failure.clone() {
            return Err(RemoteError::rejected(400, message));
        }

        let total: Money = state.cart.iter().map(CartLine::line_total).sum();
        for line in std::mem::take(&mut state.cart) {
            if let Some(stock) = state.stock.get_mut(&line.product_id) {
                *stock = stock.saturating_sub(line.quantity);
            }
        }
        state.next_order_id += 1;
        state.orders.push(address_id);

        Ok(OrderPlacement {
            message: Some("Order placed successfully".to_string()),
            order_id: Some(OrderId::new(state.next_order_id)),
            total_amount: Some(total),
            order_status: Some("Order Accepted !".to_string()),
        })
    }
}

#[async_trait]
impl CatalogSource for InMemoryBackend {
    async fn fetch_stock(&self) -> Result<Vec<CatalogEntry>, RemoteError> {
        let state = self.record(RemoteCall::FetchStock)?;
        Ok(state
            .stock
            .iter()
            .map(|(product_id, &available_quantity)| CatalogEntry {
                product_id: product_id.clone(),
                available_quantity,
            })
            .collect())
    }
}
