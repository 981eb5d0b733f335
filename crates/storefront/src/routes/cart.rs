//! Cart route handlers.
//!
//! Every handler locks the cart session, so mutations apply in the order
//! requests are dispatched. Remote replication runs in the background and
//! never delays or fails a response.

use axum::{
    Json,
    extract::{Path, State},
};
use ecomfront_core::{CartId, CartLine, Money, ProductId, ProductMeta};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cart::{CartEngine, CartError};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub item_count: u32,
    pub subtotal: Money,
    /// Server cart id, once a session has been bootstrapped.
    pub server_cart_id: Option<CartId>,
    pub server_total_price: Option<Money>,
    /// Whether changes are replicated to a user's server cart.
    pub session_active: bool,
    /// Replication calls still in flight.
    pub pending_sync: usize,
}

impl From<&CartEngine> for CartView {
    fn from(engine: &CartEngine) -> Self {
        Self {
            lines: engine.lines().to_vec(),
            item_count: engine.item_count(),
            subtotal: engine.subtotal(),
            server_cart_id: engine.server_cart_id(),
            server_total_price: engine.server_total_price(),
            session_active: engine.has_session(),
            pending_sync: engine.pending_sync(),
        }
    }
}

/// Response to a cart mutation.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub notice: String,
    pub cart: CartView,
}

impl CartResponse {
    fn new(notice: impl Into<String>, engine: &CartEngine) -> Json<Self> {
        Json(Self {
            notice: notice.into(),
            cart: CartView::from(engine),
        })
    }
}

/// Add-to-cart request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Product card attributes copied onto the line.
    #[serde(default)]
    pub product: ProductMeta,
}

fn parse_product_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn display_name(line: &CartLine) -> &str {
    if line.product_name.is_empty() {
        "Item"
    } else {
        &line.product_name
    }
}

/// Show the cart.
pub async fn show(State(state): State<AppState>) -> Json<CartView> {
    let session = state.session().await;
    Json(CartView::from(&session.engine))
}

/// Add a line, or set the quantity of an existing one.
#[instrument(skip(state, request), fields(product_id = %request.product_id, quantity = request.quantity))]
pub async fn add_line(
    State(state): State<AppState>,
    Json(request): Json<AddLineRequest>,
) -> Result<Json<CartResponse>> {
    let mut session = state.session().await;
    let engine = &mut session.engine;
    engine.add_or_set_line(request.product_id.clone(), request.quantity, &request.product)?;

    let notice = engine
        .line(&request.product_id)
        .map_or_else(|| "Added to cart".to_string(), |l| format!("{} added to cart", display_name(l)));
    Ok(CartResponse::new(notice, engine))
}

/// Add one unit.
#[instrument(skip(state))]
pub async fn increase(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<CartResponse>> {
    let product_id = parse_product_id(&product_id)?;
    let mut session = state.session().await;
    session.engine.increase_line(&product_id)?;
    Ok(CartResponse::new("Quantity updated", &session.engine))
}

/// Remove one unit, stopping at 1.
#[instrument(skip(state))]
pub async fn decrease(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<CartResponse>> {
    let product_id = parse_product_id(&product_id)?;
    let mut session = state.session().await;
    session.engine.decrease_line(&product_id)?;
    Ok(CartResponse::new("Quantity updated", &session.engine))
}

/// Remove a line.
#[instrument(skip(state))]
pub async fn remove_line(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<CartResponse>> {
    let product_id = parse_product_id(&product_id)?;
    let mut session = state.session().await;
    let removed = session
        .engine
        .remove_line(&product_id)
        .ok_or(CartError::NotInCart(product_id))?;
    let notice = format!("{} removed from cart", display_name(&removed));
    Ok(CartResponse::new(notice, &session.engine))
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Json<CartResponse> {
    let mut session = state.session().await;
    session.engine.clear();
    CartResponse::new("Cart cleared", &session.engine)
}

/// Bootstrap the signed-in session: push the local cart, adopt the server's.
#[instrument(skip(state))]
pub async fn sync(State(state): State<AppState>) -> Result<Json<CartResponse>> {
    let remote = state
        .remote()
        .ok_or_else(|| AppError::Unavailable("No user session is configured".to_string()))?;
    let mut session = state.session().await;
    session.engine.bootstrap_session(remote).await?;
    Ok(CartResponse::new("Cart synced", &session.engine))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::remote::InMemoryBackend;
    use crate::routes::test_support::{app, send};

    fn add_body(id: serde_json::Value, quantity: u32, stock: Option<u32>) -> serde_json::Value {
        json!({
            "productId": id,
            "quantity": quantity,
            "product": {
                "productName": "Desk Lamp",
                "price": "650.00",
                "specialPrice": "500.00",
                "quantity": stock,
            }
        })
    }

    #[tokio::test]
    async fn test_add_line_returns_cart_and_notice() {
        let (app, _) = app(&InMemoryBackend::new());
        let (status, body) = send(&app, "POST", "/cart/lines", Some(add_body(json!(7), 2, Some(5)))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["notice"], "Desk Lamp added to cart");
        assert_eq!(body["cart"]["itemCount"], 2);
        assert_eq!(body["cart"]["lines"][0]["productId"], "7");
        let subtotal: f64 = body["cart"]["subtotal"].as_str().unwrap().parse().unwrap();
        assert!((subtotal - 1000.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_add_line_out_of_stock_is_conflict() {
        let (app, _) = app(&InMemoryBackend::new());
        let (status, body) = send(&app, "POST", "/cart/lines", Some(add_body(json!(7), 3, Some(1)))).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["notice"], "Out of stock");

        let (_, cart) = send(&app, "GET", "/cart", None).await;
        assert_eq!(cart["itemCount"], 0);
    }

    #[tokio::test]
    async fn test_add_zero_is_unprocessable() {
        let (app, _) = app(&InMemoryBackend::new());
        let (status, _) = send(&app, "POST", "/cart/lines", Some(add_body(json!(7), 0, None))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_increase_to_catalog_limit() {
        let (app, _) = app(&InMemoryBackend::new());
        send(&app, "PUT", "/catalog", Some(json!([{"productId": "A1", "quantity": 3}]))).await;
        send(&app, "POST", "/cart/lines", Some(add_body(json!("A1"), 2, None))).await;

        let (status, body) = send(&app, "POST", "/cart/lines/A1/increase", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cart"]["lines"][0]["quantity"], 3);

        let (status, body) = send(&app, "POST", "/cart/lines/A1/increase", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["notice"], "Quantity reached the available limit");
    }

    #[tokio::test]
    async fn test_decrease_and_remove() {
        let (app, _) = app(&InMemoryBackend::new());
        send(&app, "POST", "/cart/lines", Some(add_body(json!(7), 2, None))).await;

        let (_, body) = send(&app, "POST", "/cart/lines/7/decrease", None).await;
        assert_eq!(body["cart"]["itemCount"], 1);
        let (_, body) = send(&app, "POST", "/cart/lines/7/decrease", None).await;
        assert_eq!(body["cart"]["itemCount"], 1);

        let (status, body) = send(&app, "DELETE", "/cart/lines/7", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["notice"], "Desk Lamp removed from cart");
        assert_eq!(body["cart"]["lines"], json!([]));

        let (status, _) = send(&app, "DELETE", "/cart/lines/7", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_increase_unknown_line_is_not_found() {
        let (app, _) = app(&InMemoryBackend::new());
        let (status, _) = send(&app, "POST", "/cart/lines/99/increase", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_increase_uncatalogued_product_is_refused() {
        let (app, _) = app(&InMemoryBackend::new());
        send(&app, "POST", "/cart/lines", Some(add_body(json!(7), 3, Some(3)))).await;

        let (status, body) = send(&app, "POST", "/cart/lines/7/increase", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["notice"], "Product not found");

        let (_, cart) = send(&app, "GET", "/cart", None).await;
        assert_eq!(cart["itemCount"], 3);
    }

    #[tokio::test]
    async fn test_clear() {
        let (app, _) = app(&InMemoryBackend::new());
        send(&app, "POST", "/cart/lines", Some(add_body(json!(7), 2, None))).await;
        let (status, body) = send(&app, "DELETE", "/cart", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["notice"], "Cart cleared");
        assert_eq!(body["cart"]["itemCount"], 0);
    }

    #[tokio::test]
    async fn test_sync_adopts_server_cart() {
        let backend = InMemoryBackend::new();
        let (app, state) = app(&backend);
        send(&app, "POST", "/cart/lines", Some(add_body(json!(7), 2, None))).await;

        let (status, body) = send(&app, "POST", "/cart/sync", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cart"]["sessionActive"], true);
        assert_eq!(body["cart"]["serverCartId"], 1);
        assert_eq!(body["cart"]["itemCount"], 2);

        // Later changes replicate
        send(&app, "POST", "/cart/lines/7/decrease", None).await;
        state.session().await.engine.flush_replication().await;
        assert_eq!(backend.server_cart().products[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_sync_failure_is_bad_gateway_and_keeps_cart() {
        let backend = InMemoryBackend::new();
        let (app, _) = app(&backend);
        send(&app, "POST", "/cart/lines", Some(add_body(json!(7), 2, None))).await;
        backend.set_fail_requests(true);

        let (status, _) = send(&app, "POST", "/cart/sync", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (_, cart) = send(&app, "GET", "/cart", None).await;
        assert_eq!(cart["itemCount"], 2);
    }
}
