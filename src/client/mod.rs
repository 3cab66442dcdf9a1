//! HTTP client for the catalog API.
//!
//! The only configuration that affects behavior is the base URL. Every
//! failure comes back as a typed `ClientError`; nothing panics past this
//! boundary and nothing is cached locally.

use reqwest::StatusCode;
use thiserror::Error;

use crate::catalog::{Book, BookDraft, DeleteConfirmation};

/// Classified failures from the remote catalog.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Caller-supplied data failed the required-field check. Recoverable by
    /// prompting the user; no request reaches the server.
    #[error("invalid book data: {0}")]
    Validation(String),

    /// The referenced id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport failure or unclassified server error. The caller may retry
    /// the same operation manually.
    #[error("remote error: {0}")]
    Remote(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Remote(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Typed access to the five catalog operations.
pub struct CatalogClient {
    base_url: String,
    http: reqwest::Client,
}

impl CatalogClient {
    /// Create a client against `base_url` (e.g. `http://localhost:7878`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Fetch all books with their relations.
    pub async fn list_books(&self) -> Result<Vec<Book>> {
        let url = format!("{}/books", self.base_url);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        Ok(response.json().await?)
    }

    /// Fetch a single book by id.
    pub async fn get_book(&self, id: &str) -> Result<Book> {
        let url = format!("{}/books/{}", self.base_url, id);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        Ok(response.json().await?)
    }

    /// Persist a new book. Required fields are checked locally first; a
    /// draft that fails the check never reaches the server.
    pub async fn create_book(&self, draft: &BookDraft) -> Result<Book> {
        let body = validated(draft)?;
        let url = format!("{}/books", self.base_url);
        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        Ok(response.json().await?)
    }

    /// Overwrite an existing book.
    pub async fn update_book(&self, id: &str, draft: &BookDraft) -> Result<Book> {
        let body = validated(draft)?;
        let url = format!("{}/books/{}", self.base_url, id);
        let response = self.http.put(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        Ok(response.json().await?)
    }

    /// Remove a book (and its cover image).
    pub async fn delete_book(&self, id: &str) -> Result<DeleteConfirmation> {
        let url = format!("{}/books/{}", self.base_url, id);
        let response = self.http.delete(&url).send().await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        Ok(response.json().await?)
    }
}

/// Run the required-field check and apply defaults before the draft goes on
/// the wire.
fn validated(draft: &BookDraft) -> Result<BookDraft> {
    let invalid = draft.invalid_fields();
    if !invalid.is_empty() {
        return Err(ClientError::Validation(format!(
            "missing or invalid fields: {}",
            invalid.join(", ")
        )));
    }
    Ok(draft.normalized())
}

/// Map a non-success response to the error taxonomy.
async fn error_from(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let message = response
        .text()
        .await
        .ok()
        .filter(|body| !body.is_empty())
        .unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::BAD_REQUEST => ClientError::Validation(message),
        _ => ClientError::Remote(message),
    }
}
