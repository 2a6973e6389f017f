//! Borrowing and history endpoints.
//!
//! The member-visibility rule lives here, at the boundary: a librarian may
//! query any member's records, every other caller is pinned to their own.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        borrowing::{BorrowingDetails, BorrowingQuery},
        page::{self, Page},
    },
};

use super::{Caller, CallerIdentity};

fn scope_to_caller(query: &mut BorrowingQuery, caller: &Caller) {
    if !caller.is_librarian() {
        query.member_id = Some(caller.member_id);
    }
}

/// Borrow a book for the calling member
#[utoipa::path(
    post,
    path = "/borrow/{book_id}",
    tag = "borrowings",
    params(
        ("book_id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 201, description = "Borrowing created", body = BorrowingDetails),
        (status = 404, description = "Book or member not found"),
        (status = 422, description = "No copies available, borrowing limit reached, or book already on loan to this member")
    )
)]
pub async fn borrow(
    State(state): State<crate::AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(book_id): Path<i32>,
) -> AppResult<(StatusCode, Json<BorrowingDetails>)> {
    let borrowing = state
        .services
        .lending
        .borrow(caller.member_id, book_id)
        .await?;

    Ok((StatusCode::CREATED, Json(borrowing)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/return/{borrowing_id}",
    tag = "borrowings",
    params(
        ("borrowing_id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = BorrowingDetails),
        (status = 404, description = "Borrowing not found"),
        (status = 422, description = "Already returned")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(borrowing_id): Path<i32>,
) -> AppResult<Json<BorrowingDetails>> {
    if !caller.is_librarian() {
        let borrowing = state.services.lending.get_borrowing(borrowing_id).await?;
        if borrowing.member_id != caller.member_id {
            return Err(AppError::Authorization(
                "Members may only return their own borrowings".to_string(),
            ));
        }
    }

    let returned = state.services.lending.return_book(borrowing_id).await?;
    Ok(Json(returned))
}

/// List borrowings with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/borrowings",
    tag = "borrowings",
    params(BorrowingQuery),
    responses(
        (status = 200, description = "Paginated borrowing list", body = Page<BorrowingDetails>)
    )
)]
pub async fn list_borrowings(
    State(state): State<crate::AppState>,
    CallerIdentity(caller): CallerIdentity,
    Query(mut query): Query<BorrowingQuery>,
) -> AppResult<Json<Page<BorrowingDetails>>> {
    scope_to_caller(&mut query, &caller);

    let (page_no, per_page, _) = page::page_window(query.page, query.limit);
    let (items, total) = state.services.lending.list_borrowings(&query).await?;

    Ok(Json(Page::new(items, page_no, total, per_page)))
}

/// Full borrowing history (open and returned records)
#[utoipa::path(
    get,
    path = "/history",
    tag = "borrowings",
    params(BorrowingQuery),
    responses(
        (status = 200, description = "Paginated borrowing history", body = Page<BorrowingDetails>)
    )
)]
pub async fn history(
    State(state): State<crate::AppState>,
    CallerIdentity(caller): CallerIdentity,
    Query(mut query): Query<BorrowingQuery>,
) -> AppResult<Json<Page<BorrowingDetails>>> {
    scope_to_caller(&mut query, &caller);

    let (page_no, per_page, _) = page::page_window(query.page, query.limit);
    let (items, total) = state.services.lending.history(&query).await?;

    Ok(Json(Page::new(items, page_no, total, per_page)))
}
