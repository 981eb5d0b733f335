//! Ecomfront storefront: cart synchronization and checkout service.
//!
//! This binary serves the cart and checkout JSON API on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework, one cart session per process
//! - Local cart persisted to `CART_CACHE_DIR` (memory only when unset)
//! - REST backend for the server cart, order placement and catalog stock
//! - Replication to the server cart only when `CART_API_TOKEN` is set

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use ecomfront_storefront::cache::{CartCache, FileCartCache, MemoryCartCache};
use ecomfront_storefront::cart::CartEngine;
use ecomfront_storefront::catalog::{Catalog, CatalogFeed, spawn_refresher};
use ecomfront_storefront::config::StorefrontConfig;
use ecomfront_storefront::remote::{HttpBackend, RemoteCart};
use ecomfront_storefront::routes;
use ecomfront_storefront::session::CartSession;
use ecomfront_storefront::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Pick the durable cache for the configured directory.
fn create_cache(config: &StorefrontConfig) -> Arc<dyn CartCache> {
    match &config.cache_dir {
        Some(dir) => {
            let cache = FileCartCache::new(dir);
            tracing::info!(path = %cache.path().display(), "Using file cart cache");
            Arc::new(cache)
        }
        None => {
            tracing::warn!("CART_CACHE_DIR not set, cart will not survive restarts");
            Arc::new(MemoryCartCache::new())
        }
    }
}

#[tokio::main]
#[allow(clippy::expect_used)]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ecomfront_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let backend = HttpBackend::new(&config.backend).expect("Failed to create backend client");
    tracing::info!(base_url = %config.backend.base_url, "Backend client created");

    let catalog = Catalog::default();
    let catalog_feed = if let Some(every) = config.catalog_refresh {
        spawn_refresher(catalog.clone(), Arc::new(backend.clone()), every);
        CatalogFeed::Refresher
    } else {
        tracing::info!("Catalog refresh disabled, accepting manual updates");
        CatalogFeed::Manual
    };

    let mut engine = CartEngine::restore(catalog.clone(), create_cache(&config));

    // Only a signed-in user has a server cart to replicate to
    let remote: Option<Arc<dyn RemoteCart>> = if backend.has_session() {
        Some(Arc::new(backend.clone()))
    } else {
        tracing::info!("CART_API_TOKEN not set, running as guest");
        None
    };
    if let Some(remote) = &remote
        && engine.bootstrap_session(Arc::clone(remote)).await.is_err()
    {
        tracing::warn!("Session bootstrap failed, continuing with local cart");
    }

    let session = CartSession::new(engine, Arc::new(backend));
    let state = AppState::new(catalog, catalog_feed, session, remote);

    let app = routes::create_app(state.clone())
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // Let in-flight cart replication finish before exiting
    state.session().await.engine.flush_replication().await;
    tracing::info!("Shutdown complete");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
