//! Product catalog snapshot: available stock per product.
//!
//! The snapshot has exactly one writer, chosen by [`CatalogFeed`]: the
//! refresher task, or explicit replaces through the API when no refresher
//! runs. The cart engine reads it as the ceiling for line quantities.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use ecomfront_core::ProductId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::remote::CatalogSource;

/// Which writer owns the catalog snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogFeed {
    /// The background refresher pulls stock from the backend listing.
    Refresher,
    /// Entries are replaced through `PUT /catalog`.
    Manual,
}

impl CatalogFeed {
    /// Whether the snapshot may be replaced through the API.
    #[must_use]
    pub const fn accepts_updates(self) -> bool {
        matches!(self, Self::Manual)
    }
}

/// Authoritative stock figure for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub product_id: ProductId,
    /// Units available. The listing endpoint calls this `quantity`.
    #[serde(alias = "quantity")]
    pub available_quantity: u32,
}

/// Stock levels keyed by product id.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    stock: HashMap<ProductId, u32>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    /// Build a snapshot from a list of entries. Later duplicates win.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut snapshot = Self::default();
        snapshot.replace(entries);
        snapshot
    }

    /// Replace every entry with a freshly fetched list.
    pub fn replace(&mut self, entries: impl IntoIterator<Item = CatalogEntry>) {
        self.stock = entries
            .into_iter()
            .map(|e| (e.product_id, e.available_quantity))
            .collect();
        self.refreshed_at = Some(Utc::now());
    }

    /// Units available for a product, if the catalog knows it.
    #[must_use]
    pub fn available(&self, product_id: &ProductId) -> Option<u32> {
        self.stock.get(product_id).copied()
    }

    /// Number of products in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stock.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stock.is_empty()
    }

    /// When the snapshot was last replaced.
    #[must_use]
    pub const fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}

/// Shared, cheaply cloneable handle to the catalog snapshot.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    inner: Arc<RwLock<CatalogSnapshot>>,
}

impl Catalog {
    /// Wrap an initial snapshot.
    #[must_use]
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Units available for a product, if known.
    #[must_use]
    pub fn available(&self, product_id: &ProductId) -> Option<u32> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .available(product_id)
    }

    /// Replace the snapshot contents.
    pub fn replace(&self, entries: impl IntoIterator<Item = CatalogEntry>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(entries);
    }

    /// Number of products known.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no products are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// When the snapshot was last replaced.
    #[must_use]
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .refreshed_at()
    }
}

/// Fetch stock once and replace the snapshot. Failures keep the old snapshot.
#[instrument(skip_all)]
pub async fn refresh_once(catalog: &Catalog, source: &dyn CatalogSource) -> bool {
    match source.fetch_stock().await {
        Ok(entries) => {
            let count = entries.len();
            catalog.replace(entries);
            debug!(products = count, "Catalog snapshot refreshed");
            true
        }
        Err(e) => {
            warn!(error = %e, "Catalog refresh failed, keeping previous snapshot");
            false
        }
    }
}

/// Spawn a background task that refreshes the catalog on an interval.
///
/// The first refresh runs immediately.
pub fn spawn_refresher(
    catalog: Catalog,
    source: Arc<dyn CatalogSource>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    info!(interval_secs = every.as_secs(), "Spawning catalog refresh task");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            refresh_once(&catalog, source.as_ref()).await;
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::remote::InMemoryBackend;

    fn entry(id: &str, qty: u32) -> CatalogEntry {
        CatalogEntry {
            product_id: id.parse().unwrap(),
            available_quantity: qty,
        }
    }

    #[test]
    fn test_snapshot_lookup() {
        let snapshot = CatalogSnapshot::from_entries([entry("A1", 5), entry("B2", 0)]);
        assert_eq!(snapshot.available(&"A1".parse().unwrap()), Some(5));
        assert_eq!(snapshot.available(&"B2".parse().unwrap()), Some(0));
        assert_eq!(snapshot.available(&"C3".parse().unwrap()), None);
        assert!(snapshot.refreshed_at().is_some());
    }

    #[test]
    fn test_listing_payload_uses_quantity_and_numeric_ids() {
        let e: CatalogEntry =
            serde_json::from_str(r#"{"productId": 12, "quantity": 4}"#).unwrap();
        assert_eq!(e, entry("12", 4));
    }

    #[test]
    fn test_replace_drops_missing_products() {
        let catalog = Catalog::new(CatalogSnapshot::from_entries([entry("A1", 5)]));
        catalog.replace([entry("B2", 1)]);
        assert_eq!(catalog.available(&"A1".parse().unwrap()), None);
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_once_keeps_snapshot_on_failure() {
        let catalog = Catalog::new(CatalogSnapshot::from_entries([entry("A1", 5)]));
        let backend = InMemoryBackend::new();
        backend.set_fail_requests(true);

        assert!(!refresh_once(&catalog, &backend).await);
        assert_eq!(catalog.available(&"A1".parse().unwrap()), Some(5));

        backend.set_fail_requests(false);
        backend.set_stock("A1", 2);
        assert!(refresh_once(&catalog, &backend).await);
        assert_eq!(catalog.available(&"A1".parse().unwrap()), Some(2));
    }
}
