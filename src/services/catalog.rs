//! Catalog management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    models::page,
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List books with search and pagination
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let (_, per_page, offset) = page::page_window(query.page, query.limit);
        self.repository.books.search(query, per_page, offset).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book
    pub async fn create_book(&self, payload: CreateBook) -> AppResult<Book> {
        payload
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let copies_available = payload.copies_available.unwrap_or(payload.copies_total);
        if copies_available < 0 || copies_available > payload.copies_total {
            return Err(AppError::Validation(format!(
                "copies_available must be between 0 and {}",
                payload.copies_total
            )));
        }

        self.repository.books.create(&payload, copies_available).await
    }

    /// Update an existing book
    pub async fn update_book(&self, id: i32, payload: UpdateBook) -> AppResult<Book> {
        payload
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.repository.books.update(id, &payload).await
    }

    /// Delete a book. Fails while open borrowings reference it.
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await
    }
}
