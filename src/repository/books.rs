//! Books repository for database operations.
//!
//! Owns the `copies_available` counter: every mutation is either a single
//! conditional UPDATE or happens inside a caller-supplied transaction, so the
//! `0 <= copies_available <= copies_total` invariant is never observable as
//! broken.

use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

const BOOK_COLUMNS: &str = "id, title, author, isbn, category, copies_total, copies_available, \
     cover_url, created_at, updated_at, archived_at";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get book by ID (archived books are not found)
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = $1 AND archived_at IS NULL",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Get book by ID inside an open transaction
    pub async fn get_by_id_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = $1 AND archived_at IS NULL",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search books with pagination; matches title/author substring and
    /// category, ordered by title
    pub async fn search(&self, query: &BookQuery, per_page: i64, offset: i64) -> AppResult<(Vec<Book>, i64)> {
        let mut conditions = vec!["archived_at IS NULL".to_string()];
        let mut n = 0usize;

        let search = query.search.as_deref().filter(|s| !s.trim().is_empty());
        if search.is_some() {
            n += 1;
            conditions.push(format!("(LOWER(title) LIKE ${n} OR LOWER(author) LIKE ${n})", n = n));
        }
        let category = query.category.as_deref().filter(|s| !s.trim().is_empty());
        if category.is_some() {
            n += 1;
            conditions.push(format!("LOWER(category) LIKE ${}", n));
        }

        let where_clause = conditions.join(" AND ");

        let count_query = format!("SELECT COUNT(*) FROM books WHERE {}", where_clause);
        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(s) = search {
            count = count.bind(format!("%{}%", s.trim().to_lowercase()));
        }
        if let Some(c) = category {
            count = count.bind(format!("%{}%", c.trim().to_lowercase()));
        }
        let total: i64 = count.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT {} FROM books WHERE {} ORDER BY title LIMIT {} OFFSET {}",
            BOOK_COLUMNS, where_clause, per_page, offset
        );
        let mut select = sqlx::query_as::<_, Book>(&select_query);
        if let Some(s) = search {
            select = select.bind(format!("%{}%", s.trim().to_lowercase()));
        }
        if let Some(c) = category {
            select = select.bind(format!("%{}%", c.trim().to_lowercase()));
        }
        let books = select.fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    // =========================================================================
    // CREATE / UPDATE / DELETE
    // =========================================================================

    /// Create a new book. `copies_available` has already been resolved and
    /// validated against `copies_total` by the caller.
    pub async fn create(&self, book: &CreateBook, copies_available: i32) -> AppResult<Book> {
        let now = Utc::now();

        let created = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, author, isbn, category, copies_total, copies_available, cover_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.category)
        .bind(book.copies_total)
        .bind(copies_available)
        .bind(&book.cover_url)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update an existing book. Runs in a transaction holding the book row
    /// lock so the copy counters cannot race a concurrent borrow/return.
    pub async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<Book> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = $1 AND archived_at IS NULL FOR UPDATE",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        // open loans = copies checked out; must survive any copy-count edit
        let open_loans = current.copies_total - current.copies_available;
        let new_total = book.copies_total.unwrap_or(current.copies_total);
        if new_total < open_loans {
            return Err(AppError::Validation(format!(
                "copies_total cannot drop below {} open borrowing(s)",
                open_loans
            )));
        }

        // Shifting the total moves availability by the same delta
        let mut new_available = current.copies_available + (new_total - current.copies_total);
        if let Some(available) = book.copies_available {
            if available < 0 || available + open_loans > new_total {
                return Err(AppError::Validation(format!(
                    "copies_available must be between 0 and {}",
                    new_total - open_loans
                )));
            }
            new_available = available;
        }

        sqlx::query(
            r#"
            UPDATE books SET
                title = COALESCE($1, title),
                author = COALESCE($2, author),
                isbn = COALESCE($3, isbn),
                category = COALESCE($4, category),
                cover_url = COALESCE($5, cover_url),
                copies_total = $6,
                copies_available = $7,
                updated_at = $8
            WHERE id = $9
            "#,
        )
        .bind(book.title.as_deref())
        .bind(book.author.as_deref())
        .bind(book.isbn.as_deref())
        .bind(book.category.as_deref())
        .bind(book.cover_url.as_deref())
        .bind(new_total)
        .bind(new_available)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// Delete a book (soft delete, sets archived_at). Fails if any open
    /// borrowing still references it.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, i32>(
            "SELECT id FROM books WHERE id = $1 AND archived_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let open: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowings WHERE book_id = $1 AND return_date IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if open > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete: {} open borrowing(s) reference this book",
                open
            )));
        }

        sqlx::query("UPDATE books SET archived_at = $1, updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    // =========================================================================
    // AVAILABILITY COUNTER
    // =========================================================================

    /// Take one copy off the shelf. Single conditional UPDATE: two borrows
    /// racing for the last copy cannot both succeed.
    pub async fn decrement_availability(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> AppResult<()> {
        let affected = sqlx::query(
            r#"
            UPDATE books
            SET copies_available = copies_available - 1, updated_at = $2
            WHERE id = $1 AND archived_at IS NULL AND copies_available > 0
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if affected == 0 {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM books WHERE id = $1 AND archived_at IS NULL)",
            )
            .bind(id)
            .fetch_one(&mut **tx)
            .await?;

            if exists {
                return Err(AppError::OutOfStock(format!(
                    "No copies of book {} available",
                    id
                )));
            }
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        Ok(())
    }

    /// Put one copy back on the shelf. Refuses to exceed `copies_total`;
    /// under correct callers that branch is unreachable.
    pub async fn increment_availability(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> AppResult<()> {
        let affected = sqlx::query(
            r#"
            UPDATE books
            SET copies_available = copies_available + 1, updated_at = $2
            WHERE id = $1 AND copies_available < copies_total
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if affected == 0 {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut **tx)
                .await?;

            if exists {
                return Err(AppError::Overflow(format!(
                    "Increment would push book {} above copies_total",
                    id
                )));
            }
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        Ok(())
    }
}
