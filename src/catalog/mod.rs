//! Catalog entities and drafts.
//!
//! These are the wire shapes shared by the store, the REST API, and the
//! client: camelCase JSON, books carrying their author, category, and
//! optional cover image inline. Field-level defaults live here and nowhere
//! else - the store, the optimistic temp entry, and the form all go through
//! the same accessors.

use serde::{Deserialize, Serialize};

/// Placeholder applied when a draft arrives without a description.
pub const DEFAULT_DESCRIPTION: &str = "No description provided.";

/// A book with its joined relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique book identifier (uuid string).
    pub id: String,

    pub title: String,

    pub description: String,

    /// Non-negative list price.
    pub price: f64,

    pub isbn: String,

    pub available: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Publication timestamp (RFC 3339).
    pub published_at: String,

    /// The book's author (exactly one).
    pub author: Author,

    /// The book's category (exactly one).
    pub category: Category,

    /// Optional one-to-one cover image, owned by this book.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<CoverImage>,
}

/// An author, unique by display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,

    /// Unique display name, used as the upsert key.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// A category, unique by display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,

    /// Unique display name, used as the upsert key.
    pub name: String,
}

/// A cover image, lifecycle-bound to its book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverImage {
    pub id: String,

    pub url: String,

    /// Owning book.
    pub book_id: String,
}

/// Confirmation payload returned by `DELETE /books/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub success: bool,

    /// Id of the deleted book.
    pub id: String,
}

/// Caller-supplied field values for a create or update request.
///
/// This is the POST/PUT body. Author and category are referenced by display
/// name; the store resolves them with create-if-absent-else-reuse semantics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookDraft {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub price: f64,

    pub isbn: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,

    pub author_name: String,

    pub category_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl BookDraft {
    /// Required fields that are empty, by wire name.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.author_name.trim().is_empty() {
            missing.push("authorName");
        }
        if self.category_name.trim().is_empty() {
            missing.push("categoryName");
        }
        missing
    }

    /// Fields that block persistence: the missing required set, plus a
    /// negative price.
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        let mut fields = self.missing_required();
        if self.price < 0.0 {
            fields.push("price");
        }
        fields
    }

    /// Description with the placeholder applied.
    pub fn description_or_default(&self) -> String {
        match self.description.as_deref() {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => DEFAULT_DESCRIPTION.to_string(),
        }
    }

    /// Availability defaults to true.
    pub fn available_or_default(&self) -> bool {
        self.available.unwrap_or(true)
    }

    /// Publication timestamp defaults to the time of persistence.
    pub fn published_at_or_now(&self) -> String {
        match self.published_at.as_deref() {
            Some(ts) if !ts.is_empty() => ts.to_string(),
            _ => chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Website with the empty string treated as absent.
    pub fn website_or_none(&self) -> Option<&str> {
        self.website.as_deref().filter(|url| !url.is_empty())
    }

    /// Cover URL with the empty string treated as absent.
    pub fn cover_url_or_none(&self) -> Option<&str> {
        self.cover_url.as_deref().filter(|url| !url.is_empty())
    }

    /// Copy of the draft with every default filled in, ready to go on the
    /// wire. The client applies this before issuing a request so the server
    /// never has to guess at defaults.
    pub fn normalized(&self) -> BookDraft {
        BookDraft {
            title: self.title.trim().to_string(),
            description: Some(self.description_or_default()),
            price: self.price,
            isbn: self.isbn.clone(),
            available: Some(self.available_or_default()),
            website: self.website_or_none().map(str::to_string),
            published_at: Some(self.published_at_or_now()),
            author_name: self.author_name.trim().to_string(),
            category_name: self.category_name.trim().to_string(),
            cover_url: self.cover_url_or_none().map(str::to_string),
        }
    }
}
