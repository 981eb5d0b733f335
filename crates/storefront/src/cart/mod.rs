//! Cart reconciliation engine.
//!
//! [`CartEngine`] owns the session's canonical cart. Every mutation is
//! validated against the catalog stock ceiling, applied to the in-memory
//! lines, written through to the durable cache and then, when a user session
//! is active, replicated to the remote cart as a detached task.
//!
//! The remote cart is advisory: replication failures are logged and never
//! roll back a local change. The one place the remote wins is
//! [`CartEngine::hydrate_from_remote`], used at session bootstrap.

mod error;
mod replication;

pub use error::CartError;

use std::sync::Arc;

use ecomfront_core::{CartId, CartLine, Money, OrderTotals, ProductId, ProductMeta};
use tracing::{debug, info, instrument, warn};

use crate::cache::CartCache;
use crate::catalog::Catalog;
use crate::remote::{RemoteCart, RemoteError};
use replication::Replicator;

/// The session's cart and the rules for changing it.
pub struct CartEngine {
    lines: Vec<CartLine>,
    catalog: Catalog,
    cache: Arc<dyn CartCache>,
    replicator: Replicator,
    server_cart_id: Option<CartId>,
    server_total_price: Option<Money>,
}

impl CartEngine {
    /// Start a session, resuming whatever cart the cache holds.
    #[must_use]
    pub fn restore(catalog: Catalog, cache: Arc<dyn CartCache>) -> Self {
        let lines = normalize(cache.load());
        if !lines.is_empty() {
            info!(lines = lines.len(), "Restored cart from cache");
        }
        Self {
            lines,
            catalog,
            cache,
            replicator: Replicator::default(),
            server_cart_id: None,
            server_total_price: None,
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Cart lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of `special_price * quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Totals computed from the current lines.
    #[must_use]
    pub fn totals(&self) -> OrderTotals {
        OrderTotals::for_lines(&self.lines)
    }

    /// Server cart id learned at the last hydration.
    #[must_use]
    pub const fn server_cart_id(&self) -> Option<CartId> {
        self.server_cart_id
    }

    /// Server-computed total learned at the last hydration.
    #[must_use]
    pub const fn server_total_price(&self) -> Option<Money> {
        self.server_total_price
    }

    /// Whether a user session is active, i.e. changes are replicated.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.replicator.is_active()
    }

    /// Replication tasks still running.
    #[must_use]
    pub fn pending_sync(&self) -> usize {
        self.replicator.in_flight()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert a line, or replace the existing line for the product.
    ///
    /// Sets the absolute quantity: adding quantity 2 twice leaves 2, not 4.
    /// Availability comes from the catalog snapshot, then from the stock hint
    /// in `meta`; with neither, the requested quantity is assumed available.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] if `quantity` is 0
    /// - [`CartError::OutOfStock`] if `quantity` exceeds availability
    #[instrument(skip(self, meta))]
    pub fn add_or_set_line(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        meta: &ProductMeta,
    ) -> Result<&[CartLine], CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let available = self
            .catalog
            .available(&product_id)
            .or(meta.quantity)
            .unwrap_or(quantity);
        if available < quantity {
            debug!(requested = quantity, available, "Add refused, out of stock");
            return Err(CartError::OutOfStock {
                product_id,
                requested: quantity,
                available,
            });
        }

        self.set_line(meta.to_line(product_id, quantity));
        Ok(&self.lines)
    }

    /// Add one unit to an existing line.
    ///
    /// The ceiling is the catalog's availability; a product the catalog does
    /// not list cannot be increased.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotInCart`] if the product has no line
    /// - [`CartError::ProductNotFound`] if the catalog has no entry for it
    /// - [`CartError::QuantityLimitReached`] if one more unit exceeds stock
    pub fn increase_line(&mut self, product_id: &ProductId) -> Result<&[CartLine], CartError> {
        let line = self
            .line(product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.clone()))?;
        let Some(available) = self.catalog.available(product_id) else {
            debug!(product_id = %product_id, "Increase refused, product not in catalog");
            return Err(CartError::ProductNotFound(product_id.clone()));
        };

        let next = line.quantity.saturating_add(1);
        if next > available {
            debug!(product_id = %product_id, available, "Increase refused at stock limit");
            return Err(CartError::QuantityLimitReached {
                product_id: product_id.clone(),
                available,
            });
        }

        let meta = ProductMeta::from(line);
        self.add_or_set_line(product_id.clone(), next, &meta)
    }

    /// Remove one unit from a line. A line at 1 is left unchanged.
    ///
    /// Never fails on stock: a lower quantity is always acceptable.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if the product has no line.
    pub fn decrease_line(&mut self, product_id: &ProductId) -> Result<&[CartLine], CartError> {
        let line = self
            .line(product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.clone()))?;
        if line.quantity <= 1 {
            return Ok(&self.lines);
        }

        let mut lowered = line.clone();
        lowered.quantity -= 1;
        self.set_line(lowered);
        Ok(&self.lines)
    }

    /// Delete a product's line. Returns the removed line for user feedback.
    #[instrument(skip(self))]
    pub fn remove_line(&mut self, product_id: &ProductId) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| &l.product_id == product_id)?;
        let removed = self.lines.remove(index);
        self.cache.save(&self.lines);

        match self.server_cart_id {
            Some(cart_id) => {
                let id = product_id.clone();
                self.replicator
                    .dispatch("remove_product", product_id, move |remote| async move {
                        remote.remove_product(cart_id, &id).await
                    });
            }
            None if self.has_session() => {
                debug!("No server cart id yet, remote remove skipped");
            }
            None => {}
        }

        Some(removed)
    }

    /// Empty the cart and the durable cache.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.server_cart_id = None;
        self.server_total_price = None;
        self.cache.clear();
        debug!("Cart cleared");
    }

    /// Replace the whole cart with the server's lines.
    ///
    /// This is the one path where the remote is authoritative. Duplicate
    /// products collapse to their last occurrence and zero-quantity lines are
    /// dropped, so the stored cart always satisfies the line invariants.
    pub fn hydrate_from_remote(
        &mut self,
        lines: Vec<CartLine>,
        total_price: Money,
        cart_id: Option<CartId>,
    ) {
        self.lines = normalize(lines);
        self.server_total_price = Some(total_price);
        self.server_cart_id = cart_id;
        self.cache.save(&self.lines);
        info!(lines = self.lines.len(), cart_id = ?cart_id, "Cart hydrated from remote");
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Mark a user session active; later changes are replicated to `remote`.
    pub fn attach_remote(&mut self, remote: Arc<dyn RemoteCart>) {
        self.replicator.attach(remote);
    }

    /// End the user session. The local cart is kept.
    pub fn detach_remote(&mut self) {
        self.replicator.detach();
        self.server_cart_id = None;
        self.server_total_price = None;
    }

    /// Bootstrap a signed-in session against the remote cart.
    ///
    /// Pushes a non-empty local cart first (best effort), then adopts the
    /// server cart wholesale.
    ///
    /// # Errors
    ///
    /// Returns the fetch error if the server cart cannot be read; the local
    /// cart is kept in that case and the session stays attached.
    #[instrument(skip_all)]
    pub async fn bootstrap_session(&mut self, remote: Arc<dyn RemoteCart>) -> Result<(), RemoteError> {
        self.flush_replication().await;
        self.attach_remote(Arc::clone(&remote));

        if !self.lines.is_empty()
            && let Err(e) = remote.create_cart(&self.lines).await
        {
            warn!(error = %e, "Failed to push local cart to remote");
        }

        match remote.fetch_cart().await {
            Ok(snapshot) => {
                self.hydrate_from_remote(snapshot.products, snapshot.total_price, snapshot.cart_id);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch remote cart, keeping local cart");
                Err(e)
            }
        }
    }

    /// Wait for in-flight replication tasks to finish.
    pub async fn flush_replication(&mut self) {
        self.replicator.flush().await;
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Insert or replace a line, persist, and replicate its quantity.
    fn set_line(&mut self, line: CartLine) {
        let product_id = line.product_id.clone();
        let quantity = line.quantity;

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(existing) => *existing = line,
            None => self.lines.push(line),
        }
        self.cache.save(&self.lines);

        let id = product_id.clone();
        self.replicator
            .dispatch("set_quantity", &product_id, move |remote| async move {
                remote.set_quantity(&id, quantity).await
            });
    }
}

/// Enforce the line invariants on lines from an external source.
fn normalize(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut out: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            continue;
        }
        match out.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => *existing = line,
            None => out.push(line),
        }
    }
    out
}
