//! SQLite-backed persistent catalog.
//!
//! The daemon owns a single `CatalogStore`; API handlers reach it through
//! the shared state lock. Authors and categories are resolved by display
//! name with create-if-absent-else-reuse semantics, so the same name never
//! produces two rows. Cover images are one-to-one with books and removed
//! with them.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::catalog::{Author, Book, BookDraft, Category, CoverImage};

/// Errors that can occur in store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("book not found: {0}")]
    BookNotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS authors (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    bio  TEXT
);

CREATE TABLE IF NOT EXISTS categories (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS books (
    id           TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL,
    price        REAL NOT NULL,
    isbn         TEXT NOT NULL,
    available    INTEGER NOT NULL DEFAULT 1,
    website      TEXT,
    published_at TEXT NOT NULL,
    author_id    TEXT NOT NULL REFERENCES authors(id),
    category_id  TEXT NOT NULL REFERENCES categories(id)
);

CREATE TABLE IF NOT EXISTS cover_images (
    id      TEXT PRIMARY KEY,
    url     TEXT NOT NULL,
    book_id TEXT NOT NULL UNIQUE REFERENCES books(id) ON DELETE CASCADE
);
";

const BOOK_SELECT: &str = "
SELECT b.id, b.title, b.description, b.price, b.isbn, b.available,
       b.website, b.published_at,
       a.id, a.name, a.bio,
       c.id, c.name,
       ci.id, ci.url
FROM books b
JOIN authors a ON a.id = b.author_id
JOIN categories c ON c.id = b.category_id
LEFT JOIN cover_images ci ON ci.book_id = b.id
";

/// The relational catalog.
pub struct CatalogStore {
    conn: Connection,
}

impl CatalogStore {
    /// Open (or create) the catalog database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory catalog (tests, throwaway runs).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// List all books with their relations, most recently added first.
    pub fn list_books(&self) -> Result<Vec<Book>> {
        let query = format!("{BOOK_SELECT} ORDER BY b.rowid DESC");
        let mut stmt = self.conn.prepare(&query)?;
        let books = stmt
            .query_map([], book_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(books)
    }

    /// Fetch a single book with its relations.
    pub fn get_book(&self, id: &str) -> Result<Book> {
        let query = format!("{BOOK_SELECT} WHERE b.id = ?1");
        self.conn
            .query_row(&query, params![id], book_from_row)
            .optional()?
            .ok_or_else(|| StoreError::BookNotFound(id.to_string()))
    }

    /// Persist a new book, resolving author and category by name and
    /// creating the cover image when a URL is supplied.
    pub fn create_book(&mut self, draft: &BookDraft) -> Result<Book> {
        let id = Uuid::new_v4().to_string();

        let tx = self.conn.transaction()?;
        let author_id = upsert_author(&tx, draft.author_name.trim())?;
        let category_id = upsert_category(&tx, draft.category_name.trim())?;

        tx.execute(
            "INSERT INTO books (id, title, description, price, isbn, available,
                                website, published_at, author_id, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                draft.title.trim(),
                draft.description_or_default(),
                draft.price,
                draft.isbn,
                draft.available_or_default(),
                draft.website_or_none(),
                draft.published_at_or_now(),
                author_id,
                category_id,
            ],
        )?;

        if let Some(url) = draft.cover_url_or_none() {
            tx.execute(
                "INSERT INTO cover_images (id, url, book_id) VALUES (?1, ?2, ?3)",
                params![Uuid::new_v4().to_string(), url, id],
            )?;
        }
        tx.commit()?;

        debug!(book_id = %id, title = %draft.title, "created book");

        self.get_book(&id)
    }

    /// Overwrite a book's scalar fields and relations. The cover image is
    /// upserted only when the draft carries a URL; an existing cover is
    /// otherwise left untouched.
    pub fn update_book(&mut self, id: &str, draft: &BookDraft) -> Result<Book> {
        let tx = self.conn.transaction()?;

        let exists: Option<String> = tx
            .query_row("SELECT id FROM books WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::BookNotFound(id.to_string()));
        }

        let author_id = upsert_author(&tx, draft.author_name.trim())?;
        let category_id = upsert_category(&tx, draft.category_name.trim())?;

        tx.execute(
            "UPDATE books SET title = ?1, description = ?2, price = ?3, isbn = ?4,
                              available = ?5, website = ?6, published_at = ?7,
                              author_id = ?8, category_id = ?9
             WHERE id = ?10",
            params![
                draft.title.trim(),
                draft.description_or_default(),
                draft.price,
                draft.isbn,
                draft.available_or_default(),
                draft.website_or_none(),
                draft.published_at_or_now(),
                author_id,
                category_id,
                id,
            ],
        )?;

        if let Some(url) = draft.cover_url_or_none() {
            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM cover_images WHERE book_id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            match existing {
                Some(cover_id) => {
                    tx.execute(
                        "UPDATE cover_images SET url = ?1 WHERE id = ?2",
                        params![url, cover_id],
                    )?;
                }
                None => {
                    tx.execute(
                        "INSERT INTO cover_images (id, url, book_id) VALUES (?1, ?2, ?3)",
                        params![Uuid::new_v4().to_string(), url, id],
                    )?;
                }
            }
        }
        tx.commit()?;

        debug!(book_id = %id, "updated book");

        self.get_book(id)
    }

    /// Remove a book; its cover image goes with it.
    pub fn delete_book(&mut self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM books WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::BookNotFound(id.to_string()));
        }

        debug!(book_id = %id, "deleted book");

        Ok(())
    }

    /// Number of books in the catalog.
    pub fn count_books(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Seed sample data into an empty catalog. Returns false when books
    /// already exist.
    pub fn seed(&mut self) -> Result<bool> {
        if self.count_books()? > 0 {
            return Ok(false);
        }

        {
            let tx = self.conn.transaction()?;
            for name in ["Science Fiction", "Mystery", "Fantasy", "Non-Fiction"] {
                upsert_category(&tx, name)?;
            }
            let author_id = upsert_author(&tx, "Frank Herbert")?;
            tx.execute(
                "UPDATE authors SET bio = ?1 WHERE id = ?2",
                params![
                    "Author of Dune and other science fiction novels.",
                    author_id
                ],
            )?;
            tx.commit()?;
        }

        self.create_book(&BookDraft {
            title: "Dune".to_string(),
            description: Some("A classic science fiction novel about a desert planet.".to_string()),
            price: 19.99,
            isbn: "9780441013593".to_string(),
            available: Some(true),
            website: Some("https://example.com/dune".to_string()),
            published_at: Some("1965-08-01T00:00:00Z".to_string()),
            author_name: "Frank Herbert".to_string(),
            category_name: "Science Fiction".to_string(),
            cover_url: Some("https://example.com/dune.jpg".to_string()),
        })?;

        Ok(true)
    }
}

/// Resolve an author id by name, creating the row when absent.
fn upsert_author(tx: &Transaction<'_>, name: &str) -> rusqlite::Result<String> {
    let existing: Option<String> = tx
        .query_row(
            "SELECT id FROM authors WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4().to_string();
    tx.execute(
        "INSERT INTO authors (id, name) VALUES (?1, ?2)",
        params![id, name],
    )?;
    Ok(id)
}

/// Resolve a category id by name, creating the row when absent.
fn upsert_category(tx: &Transaction<'_>, name: &str) -> rusqlite::Result<String> {
    let existing: Option<String> = tx
        .query_row(
            "SELECT id FROM categories WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4().to_string();
    tx.execute(
        "INSERT INTO categories (id, name) VALUES (?1, ?2)",
        params![id, name],
    )?;
    Ok(id)
}

fn book_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
    let id: String = row.get(0)?;

    let cover_id: Option<String> = row.get(13)?;
    let cover_url: Option<String> = row.get(14)?;
    let cover_image = match (cover_id, cover_url) {
        (Some(cover_id), Some(url)) => Some(CoverImage {
            id: cover_id,
            url,
            book_id: id.clone(),
        }),
        _ => None,
    };

    Ok(Book {
        id,
        title: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        isbn: row.get(4)?,
        available: row.get(5)?,
        website: row.get(6)?,
        published_at: row.get(7)?,
        author: Author {
            id: row.get(8)?,
            name: row.get(9)?,
            bio: row.get(10)?,
        },
        category: Category {
            id: row.get(11)?,
            name: row.get(12)?,
        },
        cover_image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dune_draft() -> BookDraft {
        BookDraft {
            title: "Dune".to_string(),
            price: 19.99,
            isbn: "9780441013593".to_string(),
            author_name: "Frank Herbert".to_string(),
            category_name: "Science Fiction".to_string(),
            cover_url: Some("https://example.com/dune.jpg".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_applies_defaults() {
        let mut store = CatalogStore::open_in_memory().unwrap();

        let book = store.create_book(&dune_draft()).unwrap();

        assert!(!book.id.is_empty());
        assert_eq!(book.title, "Dune");
        assert_eq!(book.description, crate::catalog::DEFAULT_DESCRIPTION);
        assert!(book.available);
        assert!(!book.published_at.is_empty());
        assert_eq!(book.author.name, "Frank Herbert");
        assert_eq!(book.category.name, "Science Fiction");
        assert_eq!(
            book.cover_image.as_ref().map(|c| c.url.as_str()),
            Some("https://example.com/dune.jpg")
        );
    }

    #[test]
    fn test_upsert_author_by_name() {
        let mut store = CatalogStore::open_in_memory().unwrap();

        let first = store.create_book(&dune_draft()).unwrap();
        let second = store
            .create_book(&BookDraft {
                title: "Children of Dune".to_string(),
                ..dune_draft()
            })
            .unwrap();

        assert_eq!(first.author.id, second.author.id);

        let authors: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM authors", [], |row| row.get(0))
            .unwrap();
        assert_eq!(authors, 1);
    }

    #[test]
    fn test_get_book_missing() {
        let store = CatalogStore::open_in_memory().unwrap();

        let err = store.get_book("nonexistent-id").unwrap_err();
        assert!(matches!(err, StoreError::BookNotFound(_)));
    }

    #[test]
    fn test_update_overwrites_scalars_and_keeps_id() {
        let mut store = CatalogStore::open_in_memory().unwrap();
        let book = store.create_book(&dune_draft()).unwrap();

        let updated = store
            .update_book(
                &book.id,
                &BookDraft {
                    title: "Clean Code".to_string(),
                    price: 29.99,
                    author_name: "Robert C. Martin".to_string(),
                    category_name: "Software Engineering".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.id, book.id);
        assert_eq!(updated.title, "Clean Code");
        assert_eq!(updated.price, 29.99);
        assert_eq!(updated.author.name, "Robert C. Martin");
    }

    #[test]
    fn test_update_upserts_cover_only_when_supplied() {
        let mut store = CatalogStore::open_in_memory().unwrap();
        let book = store.create_book(&dune_draft()).unwrap();
        let original_cover = book.cover_image.clone().unwrap();

        // No URL supplied: existing cover untouched.
        let updated = store
            .update_book(
                &book.id,
                &BookDraft {
                    cover_url: None,
                    ..dune_draft()
                },
            )
            .unwrap();
        assert_eq!(updated.cover_image, Some(original_cover.clone()));

        // New URL supplied: same row, new URL.
        let updated = store
            .update_book(
                &book.id,
                &BookDraft {
                    cover_url: Some("https://example.com/dune-2.jpg".to_string()),
                    ..dune_draft()
                },
            )
            .unwrap();
        let cover = updated.cover_image.unwrap();
        assert_eq!(cover.id, original_cover.id);
        assert_eq!(cover.url, "https://example.com/dune-2.jpg");
    }

    #[test]
    fn test_update_missing_book() {
        let mut store = CatalogStore::open_in_memory().unwrap();

        let err = store
            .update_book("nonexistent-id", &dune_draft())
            .unwrap_err();
        assert!(matches!(err, StoreError::BookNotFound(_)));
    }

    #[test]
    fn test_delete_cascades_cover() {
        let mut store = CatalogStore::open_in_memory().unwrap();
        let book = store.create_book(&dune_draft()).unwrap();

        store.delete_book(&book.id).unwrap();

        assert!(matches!(
            store.get_book(&book.id).unwrap_err(),
            StoreError::BookNotFound(_)
        ));
        let covers: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM cover_images", [], |row| row.get(0))
            .unwrap();
        assert_eq!(covers, 0);
    }

    #[test]
    fn test_delete_missing_book() {
        let mut store = CatalogStore::open_in_memory().unwrap();

        let err = store.delete_book("nonexistent-id").unwrap_err();
        assert!(matches!(err, StoreError::BookNotFound(_)));
    }

    #[test]
    fn test_list_most_recent_first() {
        let mut store = CatalogStore::open_in_memory().unwrap();
        store.create_book(&dune_draft()).unwrap();
        store
            .create_book(&BookDraft {
                title: "Children of Dune".to_string(),
                ..dune_draft()
            })
            .unwrap();

        let books = store.list_books().unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].title, "Children of Dune");
        assert_eq!(books[1].title, "Dune");
    }

    #[test]
    fn test_seed_is_idempotent() {
        let mut store = CatalogStore::open_in_memory().unwrap();

        assert!(store.seed().unwrap());
        assert!(!store.seed().unwrap());

        let books = store.list_books().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Dune");
        assert_eq!(
            books[0].author.bio.as_deref(),
            Some("Author of Dune and other science fiction novels.")
        );
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        {
            let mut store = CatalogStore::open(&path).unwrap();
            store.create_book(&dune_draft()).unwrap();
        }

        let store = CatalogStore::open(&path).unwrap();
        assert_eq!(store.count_books().unwrap(), 1);
    }
}
