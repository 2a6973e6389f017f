//! Borrowing (loan) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::book::BookSummary;

/// Borrowing record from database. Append-only: a row is inserted on borrow
/// and mutated exactly once, at return, to set `return_date` and `fine`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Borrowing {
    pub id: i32,
    pub book_id: i32,
    pub member_id: i32,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    /// Fine in currency minor units, persisted at return time
    pub fine: i64,
}

/// Borrowing with embedded book summary for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowingDetails {
    pub id: i32,
    pub book: BookSummary,
    pub member_id: i32,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    /// Persisted fine for returned loans; for open overdue loans, the fine
    /// accrued so far if the book were returned now
    pub fine: i64,
    pub is_overdue: bool,
}

/// Borrowing status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowingStatus {
    Active,
    Returned,
    All,
}

/// Sort keys for borrowing listings; maps to a whitelisted ORDER BY column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BorrowingSort {
    BorrowDate,
    ReturnDate,
    Title,
    Fine,
}

impl BorrowingSort {
    /// SQL column for ORDER BY. Never built from raw caller input.
    pub fn as_sql(&self) -> &'static str {
        match self {
            BorrowingSort::BorrowDate => "b.borrow_date",
            BorrowingSort::ReturnDate => "b.return_date",
            BorrowingSort::Title => "bk.title",
            BorrowingSort::Fine => "b.fine",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Borrowing listing query parameters
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct BorrowingQuery {
    /// active | returned | all (default: all)
    pub status: Option<BorrowingStatus>,
    /// Restrict to one member; non-librarian callers are always restricted
    /// to their own id at the boundary
    pub member_id: Option<i32>,
    pub borrowed_from: Option<DateTime<Utc>>,
    pub borrowed_to: Option<DateTime<Utc>>,
    pub returned_from: Option<DateTime<Utc>>,
    pub returned_to: Option<DateTime<Utc>>,
    /// borrow_date | return_date | title | fine (default: borrow_date)
    pub sort: Option<BorrowingSort>,
    /// asc | desc (default: desc)
    pub order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
