//! REST API for the bookshelf daemon.
//!
//! Provides HTTP endpoints for:
//! - Listing and fetching books (joined with author/category/cover)
//! - Creating, updating, and deleting books
//! - Health checks

pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::store::CatalogStore;

/// Shared state for API handlers.
pub struct ApiState {
    /// The catalog database. The sqlite connection is Send but not Sync,
    /// so access goes through a mutex rather than a reader-writer lock.
    pub store: Mutex<CatalogStore>,
}

impl ApiState {
    /// Create new API state around an opened store.
    pub fn new(store: CatalogStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }
}

/// Build the API router with all routes.
pub fn router(state: Arc<ApiState>) -> Router {
    // CORS configuration - allow requests from any origin for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status/health
        .route("/health", get(handlers::status::health))
        // Books
        .route(
            "/books",
            get(handlers::books::list_books).post(handlers::books::create_book),
        )
        .route(
            "/books/:id",
            get(handlers::books::get_book)
                .put(handlers::books::update_book)
                .delete(handlers::books::delete_book),
        )
        // Middleware
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                // Only log requests/responses that are NOT 200 OK
                .on_request(())
                .on_response(|response: &axum::http::Response<_>, latency: std::time::Duration, _span: &tracing::Span| {
                    let status = response.status();
                    if !status.is_success() {
                        tracing::warn!(
                            status = %status,
                            latency_ms = latency.as_millis(),
                            "request failed"
                        );
                    }
                })
        )
        .with_state(state)
}

/// Start the API server.
pub async fn serve(state: Arc<ApiState>, bind_addr: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    tracing::info!("Bookshelf API listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
