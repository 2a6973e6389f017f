//! Borrowings repository for database operations.
//!
//! The borrowings table is an append-only ledger: rows are inserted on borrow
//! and mutated exactly once, at return. The state-changing methods take an
//! open transaction so the lending service can keep the limit/duplicate
//! checks, the counter update and the insert in one atomic unit.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookSummary,
        borrowing::{Borrowing, BorrowingQuery, BorrowingSort, BorrowingStatus, SortOrder},
    },
};

const BORROWING_COLUMNS: &str = "id, book_id, member_id, borrow_date, due_date, return_date, fine";

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrowing by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>(&format!(
            "SELECT {} FROM borrowings WHERE id = $1",
            BORROWING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))
    }

    /// Get borrowing by ID inside an open transaction, holding the row lock
    pub async fn get_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>(&format!(
            "SELECT {} FROM borrowings WHERE id = $1 FOR UPDATE",
            BORROWING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))
    }

    /// Count a member's open borrowings
    pub async fn count_open_for_member(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        member_id: i32,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowings WHERE member_id = $1 AND return_date IS NULL",
        )
        .bind(member_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(count)
    }

    /// Whether the member already holds an open borrowing of this book
    pub async fn has_open_for_book(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        member_id: i32,
        book_id: i32,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrowings
                WHERE member_id = $1 AND book_id = $2 AND return_date IS NULL
            )
            "#,
        )
        .bind(member_id)
        .bind(book_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(exists)
    }

    /// Insert a new open borrowing
    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        member_id: i32,
        book_id: i32,
        borrow_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> AppResult<Borrowing> {
        let created = sqlx::query_as::<_, Borrowing>(&format!(
            r#"
            INSERT INTO borrowings (member_id, book_id, borrow_date, due_date, fine)
            VALUES ($1, $2, $3, $4, 0)
            RETURNING {}
            "#,
            BORROWING_COLUMNS
        ))
        .bind(member_id)
        .bind(book_id)
        .bind(borrow_date)
        .bind(due_date)
        .fetch_one(&mut **tx)
        .await?;

        Ok(created)
    }

    /// Close a borrowing: set return_date and fine, guarded by
    /// `return_date IS NULL` so exactly one of several concurrent returns
    /// succeeds. Returns the number of rows affected (0 or 1).
    pub async fn mark_returned(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
        return_date: DateTime<Utc>,
        fine: i64,
    ) -> AppResult<u64> {
        let affected = sqlx::query(
            "UPDATE borrowings SET return_date = $1, fine = $2 WHERE id = $3 AND return_date IS NULL",
        )
        .bind(return_date)
        .bind(fine)
        .bind(id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        Ok(affected)
    }

    // =========================================================================
    // LISTING / HISTORY PROJECTIONS
    // =========================================================================

    /// Search the borrowing ledger with filters, sorting and pagination.
    /// Returns raw rows paired with their book summary; display-level fine
    /// accrual is the caller's concern.
    pub async fn search(
        &self,
        query: &BorrowingQuery,
        per_page: i64,
        offset: i64,
    ) -> AppResult<(Vec<(Borrowing, BookSummary)>, i64)> {
        let mut conditions: Vec<String> = Vec::new();
        let mut n = 0usize;

        match query.status.unwrap_or(BorrowingStatus::All) {
            BorrowingStatus::Active => conditions.push("b.return_date IS NULL".to_string()),
            BorrowingStatus::Returned => conditions.push("b.return_date IS NOT NULL".to_string()),
            BorrowingStatus::All => {}
        }
        if query.member_id.is_some() {
            n += 1;
            conditions.push(format!("b.member_id = ${}", n));
        }
        if query.borrowed_from.is_some() {
            n += 1;
            conditions.push(format!("b.borrow_date >= ${}", n));
        }
        if query.borrowed_to.is_some() {
            n += 1;
            conditions.push(format!("b.borrow_date <= ${}", n));
        }
        if query.returned_from.is_some() {
            n += 1;
            conditions.push(format!("b.return_date >= ${}", n));
        }
        if query.returned_to.is_some() {
            n += 1;
            conditions.push(format!("b.return_date <= ${}", n));
        }

        let where_clause = if conditions.is_empty() {
            "1=1".to_string()
        } else {
            conditions.join(" AND ")
        };

        let count_query = format!("SELECT COUNT(*) FROM borrowings b WHERE {}", where_clause);
        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(member_id) = query.member_id {
            count = count.bind(member_id);
        }
        if let Some(from) = query.borrowed_from {
            count = count.bind(from);
        }
        if let Some(to) = query.borrowed_to {
            count = count.bind(to);
        }
        if let Some(from) = query.returned_from {
            count = count.bind(from);
        }
        if let Some(to) = query.returned_to {
            count = count.bind(to);
        }
        let total: i64 = count.fetch_one(&self.pool).await?;

        let sort = query.sort.unwrap_or(BorrowingSort::BorrowDate).as_sql();
        let order = query.order.unwrap_or(SortOrder::Desc).as_sql();

        let select_query = format!(
            r#"
            SELECT b.id, b.book_id, b.member_id, b.borrow_date, b.due_date, b.return_date, b.fine,
                   bk.title, bk.author, bk.isbn, bk.category, bk.cover_url
            FROM borrowings b
            JOIN books bk ON b.book_id = bk.id
            WHERE {}
            ORDER BY {} {}, b.id {}
            LIMIT {} OFFSET {}
            "#,
            where_clause, sort, order, order, per_page, offset
        );

        let mut select = sqlx::query(&select_query);
        if let Some(member_id) = query.member_id {
            select = select.bind(member_id);
        }
        if let Some(from) = query.borrowed_from {
            select = select.bind(from);
        }
        if let Some(to) = query.borrowed_to {
            select = select.bind(to);
        }
        if let Some(from) = query.returned_from {
            select = select.bind(from);
        }
        if let Some(to) = query.returned_to {
            select = select.bind(to);
        }
        let rows = select.fetch_all(&self.pool).await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let borrowing = Borrowing {
                id: row.get("id"),
                book_id: row.get("book_id"),
                member_id: row.get("member_id"),
                borrow_date: row.get("borrow_date"),
                due_date: row.get("due_date"),
                return_date: row.get("return_date"),
                fine: row.get("fine"),
            };
            let book = BookSummary {
                id: row.get("book_id"),
                title: row.get("title"),
                author: row.get("author"),
                isbn: row.get("isbn"),
                category: row.get("category"),
                cover_url: row.get("cover_url"),
            };
            result.push((borrowing, book));
        }

        Ok((result, total))
    }
}
