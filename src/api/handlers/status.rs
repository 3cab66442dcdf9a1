//! Status and health check handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::ApiState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,

    /// Number of books in the catalog.
    pub books: usize,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let store = state.store.lock().await;

    let books = store.count_books().unwrap_or_default();

    Json(HealthResponse {
        status: "ok".to_string(),
        books,
    })
}
