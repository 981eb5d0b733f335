//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                              - Liveness check
//!
//! # Cart
//! GET    /cart                                - Cart view
//! POST   /cart/lines                          - Add or set a line
//! POST   /cart/lines/{product_id}/increase    - One more unit
//! POST   /cart/lines/{product_id}/decrease    - One fewer unit
//! DELETE /cart/lines/{product_id}             - Remove a line
//! DELETE /cart                                - Clear the cart
//! POST   /cart/sync                           - Bootstrap against the remote cart
//!
//! # Catalog
//! GET    /catalog                             - Snapshot size and freshness
//! PUT    /catalog                             - Replace stock entries (manual feed only)
//!
//! # Checkout
//! GET    /checkout                            - Order summary and state
//! PUT    /checkout/address                    - Select shipping address
//! PUT    /checkout/payment                    - Select payment method
//! POST   /checkout/orders                     - Place order
//! ```
//!
//! Every mutation answers with a `notice` for toast-style feedback.

pub mod cart;
pub mod catalog;
pub mod checkout;

use std::time::Duration;

use axum::{
    Router,
    http::{Request, Response},
    routing::{delete, get, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::catalog::CatalogFeed;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create all API routes.
///
/// `PUT /catalog` is mounted only when the snapshot is fed manually, so no
/// client can race the refresher or raise stock ceilings.
pub fn routes(catalog_feed: CatalogFeed) -> Router<AppState> {
    let catalog_routes = if catalog_feed.accepts_updates() {
        get(catalog::show).put(catalog::replace)
    } else {
        get(catalog::show)
    };

    Router::new()
        // Cart
        .route("/cart", get(cart::show).delete(cart::clear))
        .route("/cart/lines", post(cart::add_line))
        .route("/cart/lines/{product_id}", delete(cart::remove_line))
        .route("/cart/lines/{product_id}/increase", post(cart::increase))
        .route("/cart/lines/{product_id}/decrease", post(cart::decrease))
        .route("/cart/sync", post(cart::sync))
        // Catalog
        .route("/catalog", catalog_routes)
        // Checkout
        .route("/checkout", get(checkout::show))
        .route("/checkout/address", put(checkout::select_address))
        .route("/checkout/payment", put(checkout::select_payment))
        .route("/checkout/orders", post(checkout::place_order))
}

/// Build the full application with middleware.
///
/// Sentry layers are added by the binary, outermost.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes(state.catalog_feed()))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::create_app;
    use crate::cache::MemoryCartCache;
    use crate::cart::CartEngine;
    use crate::catalog::{Catalog, CatalogFeed};
    use crate::remote::InMemoryBackend;
    use crate::session::CartSession;
    use crate::state::AppState;

    /// An app wired to an in-memory backend, with remote sync available and
    /// a manually fed catalog.
    pub fn app(backend: &InMemoryBackend) -> (Router, AppState) {
        app_with_feed(backend, CatalogFeed::Manual)
    }

    pub fn app_with_feed(backend: &InMemoryBackend, feed: CatalogFeed) -> (Router, AppState) {
        let catalog = Catalog::default();
        let engine = CartEngine::restore(catalog.clone(), Arc::new(MemoryCartCache::new()));
        let session = CartSession::new(engine, Arc::new(backend.clone()));
        let state = AppState::new(catalog, feed, session, Some(Arc::new(backend.clone())));
        (create_app(state.clone()), state)
    }

    /// Send a request with an optional JSON body and decode the JSON reply.
    pub async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::test_support;
    use crate::middleware::REQUEST_ID_HEADER;
    use crate::remote::InMemoryBackend;

    #[tokio::test]
    async fn test_health_check() {
        let (app, _) = test_support::app(&InMemoryBackend::new());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let (app, _) = test_support::app(&InMemoryBackend::new());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/cart")
                    .header(REQUEST_ID_HEADER, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-42");
    }
}
