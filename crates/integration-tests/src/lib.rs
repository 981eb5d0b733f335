//! Integration tests for Ecomfront.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process scenarios (no services needed)
//! cargo test -p ecomfront-integration-tests
//!
//! # Live checks against a running storefront
//! STOREFRONT_BASE_URL=http://localhost:3000 cargo test -p ecomfront-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - cart survives restarts through the file cache
//! - `session_bootstrap` - guest cart merged into the server cart
//! - `checkout_flow` - order placement end to end
//! - `live_storefront` - HTTP checks against a running binary

use std::path::PathBuf;
use std::sync::Arc;

use ecomfront_core::{Money, ProductId, ProductMeta};
use ecomfront_storefront::cache::FileCartCache;
use ecomfront_storefront::cart::CartEngine;
use ecomfront_storefront::catalog::{Catalog, CatalogEntry, CatalogSnapshot, refresh_once};
use ecomfront_storefront::remote::InMemoryBackend;
use ecomfront_storefront::session::CartSession;
use uuid::Uuid;

/// A fresh cache directory under the system temp dir.
#[must_use]
pub fn temp_cache_dir() -> PathBuf {
    std::env::temp_dir().join(format!("ecomfront-it-{}", Uuid::new_v4()))
}

/// Product attributes for a test product.
#[must_use]
pub fn product(name: &str, special_price: i64) -> ProductMeta {
    ProductMeta {
        product_name: name.to_string(),
        unit_price: Money::from_units(special_price),
        special_price: Money::from_units(special_price),
        ..ProductMeta::default()
    }
}

/// Parse a test product id.
///
/// # Panics
///
/// Panics if `id` is empty.
#[must_use]
#[allow(clippy::expect_used)]
pub fn pid(id: &str) -> ProductId {
    ProductId::parse(id).expect("test product id must not be empty")
}

/// One storefront process worth of state: a file-backed cart, a catalog and
/// an in-memory backend standing in for the REST service.
pub struct Harness {
    pub cache_dir: PathBuf,
    pub backend: InMemoryBackend,
    pub catalog: Catalog,
}

impl Harness {
    /// A harness whose backend lists the given stock.
    #[must_use]
    pub fn with_stock(stock: &[(&str, u32)]) -> Self {
        let backend = InMemoryBackend::new();
        for &(id, quantity) in stock {
            backend.set_stock(id, quantity);
        }
        let catalog = Catalog::new(CatalogSnapshot::from_entries(
            stock.iter().map(|&(id, quantity)| CatalogEntry {
                product_id: pid(id),
                available_quantity: quantity,
            }),
        ));
        Self {
            cache_dir: temp_cache_dir(),
            backend,
            catalog,
        }
    }

    /// Start (or restart) the cart engine over the harness cache.
    #[must_use]
    pub fn start_engine(&self) -> CartEngine {
        CartEngine::restore(
            self.catalog.clone(),
            Arc::new(FileCartCache::new(&self.cache_dir)),
        )
    }

    /// Start a full session whose orders go to the harness backend.
    #[must_use]
    pub fn start_session(&self) -> CartSession {
        CartSession::new(self.start_engine(), Arc::new(self.backend.clone()))
    }

    /// Pull the backend's stock into the catalog.
    pub async fn refresh_catalog(&self) -> bool {
        refresh_once(&self.catalog, &self.backend).await
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.cache_dir);
    }
}
