//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::catalog::{Catalog, CatalogFeed};
use crate::remote::RemoteCart;
use crate::session::CartSession;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog snapshot, the cart session and the remote cart used for session
/// bootstrap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    catalog: Catalog,
    catalog_feed: CatalogFeed,
    session: Arc<Mutex<CartSession>>,
    remote: Option<Arc<dyn RemoteCart>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `catalog` - Shared stock snapshot, also held by the cart engine
    /// * `catalog_feed` - Which writer owns the snapshot
    /// * `session` - The cart session
    /// * `remote` - Remote cart for `/cart/sync`; `None` when no user session
    ///   can be established
    #[must_use]
    pub fn new(
        catalog: Catalog,
        catalog_feed: CatalogFeed,
        session: CartSession,
        remote: Option<Arc<dyn RemoteCart>>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                catalog,
                catalog_feed,
                session: Arc::new(Mutex::new(session)),
                remote,
            }),
        }
    }

    /// Get a reference to the catalog snapshot.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Which writer owns the catalog snapshot.
    #[must_use]
    pub fn catalog_feed(&self) -> CatalogFeed {
        self.inner.catalog_feed
    }

    /// Lock the cart session.
    pub async fn session(&self) -> tokio::sync::MutexGuard<'_, CartSession> {
        self.inner.session.lock().await
    }

    /// Lock the cart session with a guard that can move into a spawned task.
    pub async fn session_owned(&self) -> OwnedMutexGuard<CartSession> {
        Arc::clone(&self.inner.session).lock_owned().await
    }

    /// Remote cart used to bootstrap a signed-in session.
    #[must_use]
    pub fn remote(&self) -> Option<Arc<dyn RemoteCart>> {
        self.inner.remote.clone()
    }
}
