//! Bookshelf - catalog management for a small book library.
//!
//! A single daemon owns the relational catalog (SQLite) and exposes it over
//! a REST API. Clients hold a synchronized in-memory view of the collection
//! that mutates optimistically the moment an operation starts and
//! reconciles when the remote call settles.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         CLIENT SIDE                          │
//! │  sync::BookCollection  - optimistic collection state         │
//! │  client::CatalogClient - typed access to the five operations │
//! │  form::BookForm        - add-book draft fields               │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ HTTP (JSON, camelCase)
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │                         DAEMON SIDE                          │
//! │  api::router     - GET/POST /books, GET/PUT/DELETE /books/:id│
//! │  store::CatalogStore - SQLite rows, upsert-by-name relations │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Properties
//!
//! - **Optimistic first**: every mutation is visible locally before the
//!   server confirms it
//! - **Reconciled always**: confirmations replace temporary entries;
//!   failures roll the optimistic change back
//! - **Typed failures**: validation, not-found, and remote errors are
//!   distinct values, never panics

// === Core Modules ===

/// Catalog entities and drafts.
pub mod catalog;

/// SQLite-backed persistent catalog.
pub mod store;

/// REST API.
pub mod api;

/// HTTP client for the REST API.
pub mod client;

/// Client-side synchronized collection.
pub mod sync;

/// Add-book form state.
pub mod form;

// === Re-exports ===

pub use catalog::{Author, Book, BookDraft, Category, CoverImage, DeleteConfirmation};
pub use client::{CatalogClient, ClientError};
pub use form::BookForm;
pub use store::{CatalogStore, StoreError};
pub use sync::{BookCollection, SyncedCatalog};
