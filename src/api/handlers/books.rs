//! Book CRUD handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::ApiState;
use crate::catalog::{Book, BookDraft, DeleteConfirmation};
use crate::store::StoreError;

/// Map a store failure to a response. Missing rows become 404; anything
/// else is logged and surfaced as 500.
fn store_error(err: StoreError) -> (StatusCode, String) {
    match &err {
        StoreError::BookNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        StoreError::Database(_) => {
            tracing::error!(error = %err, "catalog store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

/// List all books.
pub async fn list_books(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<Book>>, (StatusCode, String)> {
    let store = state.store.lock().await;

    let books = store.list_books().map_err(store_error)?;

    Ok(Json(books))
}

/// Get a specific book.
pub async fn get_book(
    State(state): State<Arc<ApiState>>,
    Path(book_id): Path<String>,
) -> Result<Json<Book>, (StatusCode, String)> {
    let store = state.store.lock().await;

    let book = store.get_book(&book_id).map_err(store_error)?;

    Ok(Json(book))
}

/// Create a new book.
pub async fn create_book(
    State(state): State<Arc<ApiState>>,
    Json(draft): Json<BookDraft>,
) -> Result<(StatusCode, Json<Book>), (StatusCode, String)> {
    let invalid = draft.invalid_fields();
    if !invalid.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("missing or invalid fields: {}", invalid.join(", ")),
        ));
    }

    let book = {
        let mut store = state.store.lock().await;
        store.create_book(&draft).map_err(store_error)?
    };

    Ok((StatusCode::CREATED, Json(book)))
}

/// Overwrite an existing book.
pub async fn update_book(
    State(state): State<Arc<ApiState>>,
    Path(book_id): Path<String>,
    Json(draft): Json<BookDraft>,
) -> Result<Json<Book>, (StatusCode, String)> {
    let invalid = draft.invalid_fields();
    if !invalid.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("missing or invalid fields: {}", invalid.join(", ")),
        ));
    }

    let book = {
        let mut store = state.store.lock().await;
        store.update_book(&book_id, &draft).map_err(store_error)?
    };

    Ok(Json(book))
}

/// Delete a book and its cover image.
pub async fn delete_book(
    State(state): State<Arc<ApiState>>,
    Path(book_id): Path<String>,
) -> Result<Json<DeleteConfirmation>, (StatusCode, String)> {
    {
        let mut store = state.store.lock().await;
        store.delete_book(&book_id).map_err(store_error)?;
    }

    Ok(Json(DeleteConfirmation {
        success: true,
        id: book_id,
    }))
}
