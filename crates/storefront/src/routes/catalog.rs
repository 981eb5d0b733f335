//! Catalog snapshot handlers.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use crate::catalog::{CatalogEntry, CatalogFeed};
use crate::state::AppState;

/// Catalog snapshot status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub products: usize,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub feed: CatalogFeed,
}

/// Show how many products the snapshot knows and when it was last replaced.
pub async fn show(State(state): State<AppState>) -> Json<CatalogView> {
    let catalog = state.catalog();
    Json(CatalogView {
        products: catalog.len(),
        refreshed_at: catalog.refreshed_at(),
        feed: state.catalog_feed(),
    })
}

/// Response to a catalog replacement.
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub notice: String,
    pub products: usize,
}

/// Replace the stock snapshot with the given entries.
#[instrument(skip_all, fields(entries = entries.len()))]
pub async fn replace(
    State(state): State<AppState>,
    Json(entries): Json<Vec<CatalogEntry>>,
) -> Json<CatalogResponse> {
    state.catalog().replace(entries);
    let products = state.catalog().len();
    info!(products, "Catalog snapshot replaced");
    Json(CatalogResponse {
        notice: "Catalog updated".to_string(),
        products,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use ecomfront_core::ProductId;
    use serde_json::json;

    use crate::catalog::CatalogFeed;
    use crate::remote::InMemoryBackend;
    use crate::routes::test_support::{app, app_with_feed, send};

    #[tokio::test]
    async fn test_replace_catalog() {
        let (app, state) = app(&InMemoryBackend::new());
        let (status, body) = send(
            &app,
            "PUT",
            "/catalog",
            Some(json!([
                {"productId": 1, "quantity": 4},
                {"productId": "2", "availableQuantity": 0}
            ])),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["products"], 2);
        assert_eq!(state.catalog().available(&ProductId::from(1_i64)), Some(4));
        assert_eq!(state.catalog().available(&ProductId::from(2_i64)), Some(0));
    }

    #[tokio::test]
    async fn test_replace_drops_missing_products() {
        let (app, state) = app(&InMemoryBackend::new());
        send(&app, "PUT", "/catalog", Some(json!([{"productId": 1, "quantity": 4}]))).await;
        send(&app, "PUT", "/catalog", Some(json!([{"productId": 2, "quantity": 1}]))).await;

        assert_eq!(state.catalog().available(&ProductId::from(1_i64)), None);
    }

    #[tokio::test]
    async fn test_show_reports_freshness() {
        let (app, _) = app(&InMemoryBackend::new());
        let (status, body) = send(&app, "GET", "/catalog", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["products"], 0);
        assert!(body["refreshedAt"].is_null());
        assert_eq!(body["feed"], "manual");

        send(&app, "PUT", "/catalog", Some(json!([{"productId": 1, "quantity": 4}]))).await;
        let (_, body) = send(&app, "GET", "/catalog", None).await;
        assert_eq!(body["products"], 1);
        assert!(body["refreshedAt"].is_string());
    }

    #[tokio::test]
    async fn test_replace_not_mounted_while_refresher_runs() {
        let (app, state) = app_with_feed(&InMemoryBackend::new(), CatalogFeed::Refresher);
        let (status, _) = send(
            &app,
            "PUT",
            "/catalog",
            Some(json!([{"productId": 1, "quantity": 999}])),
        )
        .await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(state.catalog().is_empty());

        let (status, body) = send(&app, "GET", "/catalog", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["feed"], "refresher");
    }
}
