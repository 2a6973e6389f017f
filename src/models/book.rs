//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: String,
    pub copies_total: i32,
    pub copies_available: i32,
    /// Opaque cover image URL, owned by an external image-storage service
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

/// Compact book representation embedded in borrowing responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: String,
    pub cover_url: Option<String>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Author is required"))]
    pub author: String,
    #[validate(length(max = 50, message = "ISBN must be at most 50 characters"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Category is required"))]
    pub category: String,
    /// Total copies owned; must be at least 1
    #[validate(range(min = 1, message = "copies_total must be at least 1"))]
    pub copies_total: i32,
    /// Copies on the shelf; defaults to copies_total, must not exceed it
    pub copies_available: Option<i32>,
    pub cover_url: Option<String>,
}

/// Update book request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255, message = "Title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Author must not be empty"))]
    pub author: Option<String>,
    #[validate(length(max = 50, message = "ISBN must be at most 50 characters"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Category must not be empty"))]
    pub category: Option<String>,
    #[validate(range(min = 1, message = "copies_total must be at least 1"))]
    pub copies_total: Option<i32>,
    pub copies_available: Option<i32>,
    pub cover_url: Option<String>,
}

/// Book listing query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive substring match on title or author
    pub search: Option<String>,
    /// Case-insensitive substring match on category
    pub category: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<Book> for BookSummary {
    fn from(book: Book) -> Self {
        BookSummary {
            id: book.id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            category: book.category,
            cover_url: book.cover_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> CreateBook {
        CreateBook {
            title: "Laskar Pelangi".to_string(),
            author: "Andrea Hirata".to_string(),
            isbn: Some("978-979-3062-79-2".to_string()),
            category: "Fiction".to_string(),
            copies_total: 3,
            copies_available: None,
            cover_url: None,
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn empty_title_is_rejected() {
        let mut p = payload();
        p.title = String::new();
        assert!(p.validate().is_err());
    }

    #[test]
    fn zero_copies_total_is_rejected() {
        let mut p = payload();
        p.copies_total = 0;
        assert!(p.validate().is_err());
    }
}
