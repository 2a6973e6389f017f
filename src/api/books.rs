//! Book catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookQuery, CreateBook, UpdateBook},
        page::{self, Page},
    },
};

use super::CallerIdentity;

/// List books with search and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Paginated book list", body = Page<Book>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Page<Book>>> {
    let (page_no, per_page, _) = page::page_window(query.page, query.limit);
    let (items, total) = state.services.catalog.list_books(&query).await?;

    Ok(Json(Page::new(items, page_no, total, per_page)))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    CallerIdentity(caller): CallerIdentity,
    Json(payload): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    caller.require_librarian()?;

    let created = state.services.catalog.create_book(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Librarian role required"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    caller.require_librarian()?;

    let updated = state.services.catalog.update_book(id, payload).await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 403, description = "Librarian role required"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Open borrowings reference this book")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    caller.require_librarian()?;

    state.services.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
