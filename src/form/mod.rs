//! Draft state for the add-book workflow.
//!
//! A flat set of typed field values with update and reset operations. No
//! validation happens here beyond reporting which required fields are still
//! empty; blocking submission is the caller's concern.

use thiserror::Error;

use crate::catalog::BookDraft;

/// Kind of input a field renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Url,
    Flag,
}

/// Static metadata for one form field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Wire name, matching the draft's camelCase keys.
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// The declared field set, in display order.
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "title", label: "Title", kind: FieldKind::Text, required: true },
    FieldSpec { name: "description", label: "Description", kind: FieldKind::Text, required: false },
    FieldSpec { name: "price", label: "Price", kind: FieldKind::Number, required: false },
    FieldSpec { name: "isbn", label: "ISBN", kind: FieldKind::Text, required: false },
    FieldSpec { name: "available", label: "Available", kind: FieldKind::Flag, required: false },
    FieldSpec { name: "website", label: "Website", kind: FieldKind::Url, required: false },
    FieldSpec { name: "authorName", label: "Author Name", kind: FieldKind::Text, required: true },
    FieldSpec { name: "categoryName", label: "Category Name", kind: FieldKind::Text, required: true },
    FieldSpec { name: "coverUrl", label: "Cover Image URL", kind: FieldKind::Url, required: false },
];

/// A field name outside the declared set.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown form field: {0}")]
pub struct UnknownField(pub String);

/// Current values of the add-book form.
#[derive(Debug, Clone, PartialEq)]
pub struct BookForm {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub isbn: String,
    pub available: bool,
    pub website: String,
    pub author_name: String,
    pub category_name: String,
    pub cover_url: String,
}

impl Default for BookForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            price: 0.0,
            isbn: String::new(),
            available: true,
            website: String::new(),
            author_name: String::new(),
            category_name: String::new(),
            cover_url: String::new(),
        }
    }
}

impl BookForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite one field from raw input, keyed by wire name. `price`
    /// parses as a number and falls back to zero on garbage; `available`
    /// parses as a bool and falls back to its default.
    pub fn set(&mut self, field: &str, value: &str) -> Result<(), UnknownField> {
        match field {
            "title" => self.title = value.to_string(),
            "description" => self.description = value.to_string(),
            "price" => self.price = value.parse().unwrap_or(0.0),
            "isbn" => self.isbn = value.to_string(),
            "available" => self.available = value.parse().unwrap_or(true),
            "website" => self.website = value.to_string(),
            "authorName" => self.author_name = value.to_string(),
            "categoryName" => self.category_name = value.to_string(),
            "coverUrl" => self.cover_url = value.to_string(),
            _ => return Err(UnknownField(field.to_string())),
        }
        Ok(())
    }

    /// Restore every field to its typed default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Required fields that are still empty, by wire name.
    pub fn missing_required(&self) -> Vec<&'static str> {
        self.to_draft().missing_required()
    }

    /// Build the submission body, stamping the publication timestamp at
    /// submit time.
    pub fn to_draft(&self) -> BookDraft {
        BookDraft {
            title: self.title.clone(),
            description: none_if_empty(&self.description),
            price: self.price,
            isbn: self.isbn.clone(),
            available: Some(self.available),
            website: none_if_empty(&self.website),
            published_at: Some(chrono::Utc::now().to_rfc3339()),
            author_name: self.author_name.clone(),
            category_name: self.category_name.clone(),
            cover_url: none_if_empty(&self.cover_url),
        }
    }
}

fn none_if_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
