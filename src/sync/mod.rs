//! Client-side synchronized view of the catalog.
//!
//! `BookCollection` holds the in-memory list a front end renders, plus the
//! loading flag and the most recent operation error. Mutations are applied
//! optimistically the moment an operation starts and reconciled when the
//! remote call settles: a confirmed create replaces the temporary entry
//! with the server entity, a failed delete puts the removed book back at
//! its old position, a failed update restores the previous value.
//!
//! Each operation is a begin/settle pair so several remote calls can be in
//! flight at once; operations against the same id are not coordinated and
//! the last settlement wins. `SyncedCatalog` drives one pair per call
//! around a `CatalogClient` for callers that want one operation at a time.

use uuid::Uuid;

use crate::catalog::{Author, Book, BookDraft, Category, CoverImage, DeleteConfirmation};
use crate::client::{CatalogClient, ClientError};

/// In-memory collection state.
///
/// `loading` is true exactly while a fetch (all or one) is outstanding;
/// optimistic mutations never touch it. `error` holds at most the latest
/// failure message and is cleared when the next full fetch begins.
#[derive(Debug, Default)]
pub struct BookCollection {
    items: Vec<Book>,
    loading: bool,
    error: Option<String>,
}

/// A book removed optimistically, remembered so a failed delete can put it
/// back where it was.
#[derive(Debug, Clone)]
pub struct RemovedBook {
    book: Book,
    index: usize,
}

impl BookCollection {
    /// The empty initial state.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Book] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // === Fetch-all ===

    pub fn begin_fetch_all(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Wholesale replacement: unconfirmed local entries are superseded by
    /// the authoritative list.
    pub fn complete_fetch_all(&mut self, books: Vec<Book>) {
        self.loading = false;
        self.items = books;
    }

    pub fn fail_fetch_all(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    // === Fetch-one ===

    pub fn begin_fetch_one(&mut self) {
        self.loading = true;
    }

    /// Replace the matching item in place, or append when it is new.
    /// Unrelated items are never cleared.
    pub fn complete_fetch_one(&mut self, book: Book) {
        self.loading = false;
        match self.items.iter_mut().find(|b| b.id == book.id) {
            Some(slot) => *slot = book,
            None => self.items.push(book),
        }
    }

    pub fn fail_fetch_one(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    // === Create ===

    /// Synthesize a temporary book from the draft and prepend it, so the
    /// pending entry is visible immediately. Returns the temporary id used
    /// to reconcile the entry at settlement.
    pub fn begin_create(&mut self, draft: &BookDraft) -> String {
        let temp = unconfirmed_book(draft);
        let temp_id = temp.id.clone();
        self.items.insert(0, temp);
        temp_id
    }

    /// Swap the temporary entry for the server entity, keyed by either id
    /// in case a full refetch already confirmed it. Exactly one entry for
    /// the logical book remains.
    pub fn complete_create(&mut self, temp_id: &str, book: Book) {
        match self
            .items
            .iter_mut()
            .find(|b| b.id == temp_id || b.id == book.id)
        {
            Some(slot) => *slot = book,
            None => self.items.insert(0, book),
        }
    }

    pub fn fail_create(&mut self, temp_id: &str, message: impl Into<String>) {
        self.items.retain(|b| b.id != temp_id);
        self.error = Some(message.into());
    }

    // === Delete ===

    /// Remove the matching item immediately. Returns the removed book with
    /// its position, or None when the id is not present locally.
    pub fn begin_delete(&mut self, id: &str) -> Option<RemovedBook> {
        let index = self.items.iter().position(|b| b.id == id)?;
        let book = self.items.remove(index);
        Some(RemovedBook { book, index })
    }

    /// Roll the optimistic removal back, restoring the book at its prior
    /// position.
    pub fn fail_delete(&mut self, removed: Option<RemovedBook>, message: impl Into<String>) {
        if let Some(RemovedBook { book, index }) = removed {
            let index = index.min(self.items.len());
            self.items.insert(index, book);
        }
        self.error = Some(message.into());
    }

    // === Update ===

    /// Overwrite the matching item with the locally edited value. Returns
    /// the prior value for rollback, or None when the id is not present.
    pub fn begin_update(&mut self, book: Book) -> Option<Book> {
        let slot = self.items.iter_mut().find(|b| b.id == book.id)?;
        Some(std::mem::replace(slot, book))
    }

    /// Settle with the server entity.
    pub fn complete_update(&mut self, book: Book) {
        if let Some(slot) = self.items.iter_mut().find(|b| b.id == book.id) {
            *slot = book;
        }
    }

    /// Roll the optimistic overwrite back.
    pub fn fail_update(&mut self, prior: Option<Book>, message: impl Into<String>) {
        if let Some(prior) = prior {
            if let Some(slot) = self.items.iter_mut().find(|b| b.id == prior.id) {
                *slot = prior;
            }
        }
        self.error = Some(message.into());
    }
}

/// Build the optimistic entry for a draft: a fresh local id, the draft's
/// field values, defaults applied, relations carrying names but no ids
/// until the server confirms them.
fn unconfirmed_book(draft: &BookDraft) -> Book {
    Book {
        id: Uuid::new_v4().to_string(),
        title: draft.title.clone(),
        description: draft.description_or_default(),
        price: draft.price,
        isbn: draft.isbn.clone(),
        available: draft.available_or_default(),
        website: draft.website_or_none().map(str::to_string),
        published_at: draft.published_at_or_now(),
        author: Author {
            id: String::new(),
            name: draft.author_name.clone(),
            bio: None,
        },
        category: Category {
            id: String::new(),
            name: draft.category_name.clone(),
        },
        cover_image: draft.cover_url_or_none().map(|url| CoverImage {
            id: String::new(),
            url: url.to_string(),
            book_id: String::new(),
        }),
    }
}

/// A collection kept in step with a remote catalog.
///
/// Each method runs one begin/settle pair around the matching client call.
pub struct SyncedCatalog {
    client: CatalogClient,
    collection: BookCollection,
}

impl SyncedCatalog {
    pub fn new(client: CatalogClient) -> Self {
        Self {
            client,
            collection: BookCollection::new(),
        }
    }

    pub fn books(&self) -> &[Book] {
        self.collection.items()
    }

    pub fn is_loading(&self) -> bool {
        self.collection.is_loading()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.collection.last_error()
    }

    /// Refetch the whole collection.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        self.collection.begin_fetch_all();
        match self.client.list_books().await {
            Ok(books) => {
                self.collection.complete_fetch_all(books);
                Ok(())
            }
            Err(err) => {
                self.collection.fail_fetch_all(err.to_string());
                Err(err)
            }
        }
    }

    /// Fetch one book and fold it into the collection.
    pub async fn fetch_book(&mut self, id: &str) -> Result<Book, ClientError> {
        self.collection.begin_fetch_one();
        match self.client.get_book(id).await {
            Ok(book) => {
                self.collection.complete_fetch_one(book.clone());
                Ok(book)
            }
            Err(err) => {
                self.collection.fail_fetch_one(err.to_string());
                Err(err)
            }
        }
    }

    /// Add a book optimistically.
    pub async fn create(&mut self, draft: &BookDraft) -> Result<Book, ClientError> {
        let temp_id = self.collection.begin_create(draft);
        match self.client.create_book(draft).await {
            Ok(book) => {
                self.collection.complete_create(&temp_id, book.clone());
                Ok(book)
            }
            Err(err) => {
                self.collection.fail_create(&temp_id, err.to_string());
                Err(err)
            }
        }
    }

    /// Overwrite a book optimistically.
    pub async fn update(&mut self, id: &str, draft: &BookDraft) -> Result<Book, ClientError> {
        let edited = {
            let mut book = unconfirmed_book(draft);
            book.id = id.to_string();
            book
        };
        let prior = self.collection.begin_update(edited);
        match self.client.update_book(id, draft).await {
            Ok(book) => {
                self.collection.complete_update(book.clone());
                Ok(book)
            }
            Err(err) => {
                self.collection.fail_update(prior, err.to_string());
                Err(err)
            }
        }
    }

    /// Remove a book optimistically.
    pub async fn delete(&mut self, id: &str) -> Result<DeleteConfirmation, ClientError> {
        let removed = self.collection.begin_delete(id);
        match self.client.delete_book(id).await {
            Ok(confirmation) => Ok(confirmation),
            Err(err) => {
                self.collection.fail_delete(removed, err.to_string());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::{self, ApiState};
    use crate::store::CatalogStore;

    fn book(id: &str, title: &str) -> Book {
        Book {
            id: id.to_string(),
            title: title.to_string(),
            description: "A book.".to_string(),
            price: 10.0,
            isbn: "0000000000".to_string(),
            available: true,
            website: None,
            published_at: "2020-01-01T00:00:00Z".to_string(),
            author: Author {
                id: "author-1".to_string(),
                name: "Some Author".to_string(),
                bio: None,
            },
            category: Category {
                id: "category-1".to_string(),
                name: "Some Category".to_string(),
            },
            cover_image: None,
        }
    }

    fn dune_draft() -> BookDraft {
        BookDraft {
            title: "Dune".to_string(),
            price: 19.99,
            isbn: "9780441013593".to_string(),
            author_name: "Frank Herbert".to_string(),
            category_name: "Science Fiction".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_fetch_all_lifecycle() {
        let mut collection = BookCollection::new();
        collection.fail_fetch_one("stale error");

        collection.begin_fetch_all();
        assert!(collection.is_loading());
        assert!(collection.last_error().is_none());

        collection.complete_fetch_all(vec![book("1", "Dune")]);
        assert!(!collection.is_loading());
        assert_eq!(collection.items().len(), 1);
    }

    #[test]
    fn test_failed_fetch_all_keeps_items() {
        let mut collection = BookCollection::new();
        collection.complete_fetch_all(vec![book("1", "Dune")]);

        collection.begin_fetch_all();
        collection.fail_fetch_all("connection refused");

        assert!(!collection.is_loading());
        assert_eq!(collection.last_error(), Some("connection refused"));
        assert_eq!(collection.items().len(), 1);
    }

    #[test]
    fn test_fetch_all_is_idempotent() {
        let mut collection = BookCollection::new();
        let listing = vec![book("1", "Dune"), book("2", "Hyperion")];

        collection.begin_fetch_all();
        collection.complete_fetch_all(listing.clone());
        let first = collection.items().to_vec();

        collection.begin_fetch_all();
        collection.complete_fetch_all(listing);

        assert_eq!(collection.items(), first.as_slice());
    }

    #[test]
    fn test_fetch_one_replaces_or_appends() {
        let mut collection = BookCollection::new();
        collection.complete_fetch_all(vec![book("1", "Dune"), book("2", "Hyperion")]);

        // Known id: replaced in place, neighbors untouched.
        collection.begin_fetch_one();
        collection.complete_fetch_one(book("1", "Dune (updated)"));
        assert_eq!(collection.items().len(), 2);
        assert_eq!(collection.items()[0].title, "Dune (updated)");
        assert_eq!(collection.items()[1].title, "Hyperion");

        // Unknown id: appended.
        collection.begin_fetch_one();
        collection.complete_fetch_one(book("3", "Foundation"));
        assert_eq!(collection.items().len(), 3);
        assert_eq!(collection.items()[2].title, "Foundation");
    }

    #[test]
    fn test_optimistic_create_then_confirm() {
        let mut collection = BookCollection::new();
        collection.complete_fetch_all(vec![book("1", "Hyperion")]);

        let temp_id = collection.begin_create(&dune_draft());

        // Pending entry is visible immediately, at the front.
        assert_eq!(collection.items().len(), 2);
        assert_eq!(collection.items()[0].id, temp_id);
        assert_eq!(collection.items()[0].title, "Dune");
        assert!(collection.items()[0].author.id.is_empty());

        let mut confirmed = book("server-1", "Dune");
        confirmed.price = 19.99;
        collection.complete_create(&temp_id, confirmed);

        // Exactly one entry for the logical book, now carrying the server id.
        assert_eq!(collection.items().len(), 2);
        assert_eq!(collection.items()[0].id, "server-1");
        assert!(collection.items().iter().all(|b| b.id != temp_id));
    }

    #[test]
    fn test_confirm_after_refetch_does_not_duplicate() {
        let mut collection = BookCollection::new();

        let temp_id = collection.begin_create(&dune_draft());

        // A full refetch lands before the create settles and already
        // carries the confirmed row.
        collection.begin_fetch_all();
        collection.complete_fetch_all(vec![book("server-1", "Dune")]);

        collection.complete_create(&temp_id, book("server-1", "Dune"));

        assert_eq!(collection.items().len(), 1);
        assert_eq!(collection.items()[0].id, "server-1");
    }

    #[test]
    fn test_failed_create_rolls_back() {
        let mut collection = BookCollection::new();
        collection.complete_fetch_all(vec![book("1", "Hyperion")]);

        let temp_id = collection.begin_create(&dune_draft());
        collection.fail_create(&temp_id, "server exploded");

        assert_eq!(collection.items().len(), 1);
        assert_eq!(collection.items()[0].id, "1");
        assert_eq!(collection.last_error(), Some("server exploded"));
    }

    #[test]
    fn test_failed_delete_restores_position() {
        let mut collection = BookCollection::new();
        collection.complete_fetch_all(vec![
            book("1", "Dune"),
            book("2", "Hyperion"),
            book("3", "Foundation"),
        ]);

        let removed = collection.begin_delete("2");
        assert_eq!(collection.items().len(), 2);

        collection.fail_delete(removed, "not today");

        let ids: Vec<&str> = collection.items().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(collection.last_error(), Some("not today"));
    }

    #[test]
    fn test_delete_of_unknown_id_changes_nothing() {
        let mut collection = BookCollection::new();
        collection.complete_fetch_all(vec![book("1", "Dune")]);

        let removed = collection.begin_delete("nonexistent-id");
        assert!(removed.is_none());
        assert_eq!(collection.items().len(), 1);

        collection.fail_delete(removed, "not found: nonexistent-id");
        assert_eq!(collection.items().len(), 1);
        assert!(collection.last_error().is_some());
    }

    #[test]
    fn test_failed_update_restores_prior_value() {
        let mut collection = BookCollection::new();
        collection.complete_fetch_all(vec![book("1", "Dune")]);

        let mut edited = book("1", "Dune, Revised");
        edited.price = 42.0;
        let prior = collection.begin_update(edited);

        assert_eq!(collection.items()[0].title, "Dune, Revised");

        collection.fail_update(prior, "conflict");

        assert_eq!(collection.items()[0].title, "Dune");
        assert_eq!(collection.items()[0].price, 10.0);
        assert_eq!(collection.last_error(), Some("conflict"));
    }

    #[test]
    fn test_mutation_does_not_clear_fetch_error() {
        let mut collection = BookCollection::new();
        collection.begin_fetch_all();
        collection.fail_fetch_all("fetch failed");

        let temp_id = collection.begin_create(&dune_draft());
        collection.complete_create(&temp_id, book("server-1", "Dune"));

        // Mutations leave the last error in place; the next full fetch
        // clears it.
        assert_eq!(collection.last_error(), Some("fetch failed"));
        collection.begin_fetch_all();
        assert!(collection.last_error().is_none());
    }

    #[test]
    fn test_interleaved_operations() {
        let mut collection = BookCollection::new();
        collection.complete_fetch_all(vec![book("1", "Dune"), book("2", "Hyperion")]);

        // Two operations in flight at once.
        let temp_id = collection.begin_create(&dune_draft());
        let removed = collection.begin_delete("2");
        assert_eq!(collection.items().len(), 2);

        // They settle in the opposite order.
        collection.fail_delete(removed, "delete failed");
        collection.complete_create(&temp_id, book("server-9", "Dune Messiah"));

        let ids: Vec<&str> = collection.items().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["server-9", "1", "2"]);
    }

    #[test]
    fn test_optimistic_mutations_do_not_touch_loading() {
        let mut collection = BookCollection::new();
        collection.complete_fetch_all(vec![book("1", "Dune")]);

        let temp_id = collection.begin_create(&dune_draft());
        assert!(!collection.is_loading());
        collection.fail_create(&temp_id, "nope");
        assert!(!collection.is_loading());

        let removed = collection.begin_delete("1");
        assert!(!collection.is_loading());
        collection.fail_delete(removed, "nope");
        assert!(!collection.is_loading());
    }

    // === SyncedCatalog against a live API ===

    async fn spawn_catalog() -> SyncedCatalog {
        let store = CatalogStore::open_in_memory().unwrap();
        let state = Arc::new(ApiState::new(store));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, api::router(state)).await.unwrap();
        });
        SyncedCatalog::new(CatalogClient::new(format!("http://{addr}")))
    }

    #[tokio::test]
    async fn test_synced_create_and_refresh() {
        let mut catalog = spawn_catalog().await;

        let created = catalog.create(&dune_draft()).await.unwrap();

        // The collection carries the confirmed entity, no temp leftover.
        assert_eq!(catalog.books().len(), 1);
        assert_eq!(catalog.books()[0].id, created.id);
        assert_eq!(catalog.books()[0].author.name, "Frank Herbert");

        catalog.refresh().await.unwrap();
        assert_eq!(catalog.books().len(), 1);
        assert_eq!(catalog.books()[0].id, created.id);
    }

    #[tokio::test]
    async fn test_synced_delete_of_missing_id_rolls_back() {
        let mut catalog = spawn_catalog().await;
        catalog.create(&dune_draft()).await.unwrap();
        let before: Vec<String> = catalog.books().iter().map(|b| b.id.clone()).collect();

        let err = catalog.delete("nonexistent-id").await.unwrap_err();

        assert!(matches!(err, ClientError::NotFound(_)));
        let after: Vec<String> = catalog.books().iter().map(|b| b.id.clone()).collect();
        assert_eq!(before, after);
        assert!(catalog.last_error().is_some());
    }

    #[tokio::test]
    async fn test_synced_update_keeps_id() {
        let mut catalog = spawn_catalog().await;
        let created = catalog.create(&dune_draft()).await.unwrap();

        let updated = catalog
            .update(
                &created.id,
                &BookDraft {
                    title: "Clean Code".to_string(),
                    price: 29.99,
                    author_name: "Robert C. Martin".to_string(),
                    category_name: "Software Engineering".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.price, 29.99);
        assert_eq!(catalog.books()[0].price, 29.99);
    }

    #[tokio::test]
    async fn test_synced_failed_create_rolls_back() {
        let mut catalog = spawn_catalog().await;

        let err = catalog
            .create(&BookDraft {
                author_name: String::new(),
                ..dune_draft()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Validation(_)));
        assert!(catalog.books().is_empty());
        assert!(catalog.last_error().is_some());
    }
}
