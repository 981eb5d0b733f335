//! `reqwest` implementation of the backend traits.

use std::sync::Arc;

use async_trait::async_trait;
use ecomfront_core::{AddressId, CartId, CartLine, ProductId};
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::{
    CatalogSource, OrderPlacement, OrderService, RemoteCart, RemoteCartSnapshot, RemoteError,
};
use crate::catalog::CatalogEntry;
use crate::config::BackendConfig;

/// Page size used when walking the product listing.
const CATALOG_PAGE_SIZE: u32 = 100;

/// Upper bound on listing pages, in case `lastPage` is never reported.
const CATALOG_MAX_PAGES: u32 = 1000;

/// Client for the REST backend.
///
/// Cheaply cloneable; clones share one connection pool.
#[derive(Clone)]
pub struct HttpBackend {
    inner: Arc<HttpBackendInner>,
}

struct HttpBackendInner {
    client: reqwest::Client,
    base_url: Url,
    access_token: Option<SecretString>,
}

/// Line payload for `cart/create`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CartItemRequest<'a> {
    product_id: &'a ProductId,
    quantity: u32,
}

/// Order payload for `order/users/cod`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CodOrderRequest {
    address_id: AddressId,
}

/// One page of `public/products`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductPage {
    #[serde(default)]
    content: Vec<CatalogEntry>,
    #[serde(default)]
    last_page: bool,
}

impl HttpBackend {
    /// Create a backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpBackendInner {
                client,
                base_url: config.base_url.clone(),
                access_token: config.access_token.clone(),
            }),
        })
    }

    /// Whether a user token is configured, i.e. cart replication applies.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.inner.access_token.is_some()
    }

    /// Build an endpoint URL from path segments, escaping each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Url(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match &self.inner.access_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, builder: RequestBuilder) -> Result<String, RemoteError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = RemoteError::from_response(status.as_u16(), &body);
            tracing::warn!(
                status = %status,
                error = %err,
                "Backend returned non-success status"
            );
            return Err(err);
        }

        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, RemoteError> {
        let body = self.send(builder).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            RemoteError::Parse(e)
        })
    }
}

#[async_trait]
impl RemoteCart for HttpBackend {
    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<(), RemoteError> {
        let quantity_segment = quantity.to_string();
        let url = self.endpoint(&[
            "carts",
            "products",
            product_id.as_str(),
            "quantity",
            &quantity_segment,
        ])?;
        self.send(self.request(Method::POST, url)).await?;
        debug!("Remote quantity set");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<RemoteCartSnapshot, RemoteError> {
        let url = self.endpoint(&["carts", "users", "cart"])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    async fn create_cart(&self, lines: &[CartLine]) -> Result<(), RemoteError> {
        let url = self.endpoint(&["cart", "create"])?;
        let items: Vec<CartItemRequest<'_>> = lines
            .iter()
            .map(|line| CartItemRequest {
                product_id: &line.product_id,
                quantity: line.quantity,
            })
            .collect();
        self.send(self.request(Method::POST, url).json(&items)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, product_id = %product_id))]
    async fn remove_product(
        &self,
        cart_id: CartId,
        product_id: &ProductId,
    ) -> Result<(), RemoteError> {
        let cart_segment = cart_id.to_string();
        let url = self.endpoint(&["carts", &cart_segment, "product", product_id.as_str()])?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderService for HttpBackend {
    #[instrument(skip(self), fields(address_id = %address_id))]
    async fn place_cod_order(&self, address_id: AddressId) -> Result<OrderPlacement, RemoteError> {
        let url = self.endpoint(&["order", "users", "cod"])?;
        let body = CodOrderRequest { address_id };
        self.send_json(self.request(Method::POST, url).json(&body))
            .await
    }
}

#[async_trait]
impl CatalogSource for HttpBackend {
    #[instrument(skip(self))]
    async fn fetch_stock(&self) -> Result<Vec<CatalogEntry>, RemoteError> {
        let mut entries = Vec::new();

        for page_number in 0..CATALOG_MAX_PAGES {
            let mut url = self.endpoint(&["public", "products"])?;
            url.query_pairs_mut()
                .append_pair("pageNumber", &page_number.to_string())
                .append_pair("pageSize", &CATALOG_PAGE_SIZE.to_string());

            let page: ProductPage = self.send_json(self.request(Method::GET, url)).await?;
            let empty = page.content.is_empty();
            entries.extend(page.content);

            if page.last_page || empty {
                break;
            }
        }

        debug!(products = entries.len(), "Fetched catalog stock");
        Ok(entries)
    }
}
