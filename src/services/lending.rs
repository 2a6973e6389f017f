//! Lending service: the borrowing state machine.
//!
//! A borrowing is OPEN until its single return transition closes it. Both
//! transitions run as one database transaction: the member-level checks, the
//! copy-counter update and the ledger write commit or roll back together, so
//! no partial state (a decremented counter without a borrowing row, or the
//! reverse) is ever observable.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Postgres, Transaction};

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    fine,
    models::{
        book::BookSummary,
        borrowing::{Borrowing, BorrowingDetails, BorrowingQuery, BorrowingStatus},
        member::MemberRole,
        page,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    config: LendingConfig,
}

impl LendingService {
    pub fn new(repository: Repository, config: LendingConfig) -> Self {
        Self { repository, config }
    }

    /// Open a transaction with a bounded lock wait. A lock that cannot be
    /// acquired within the configured window surfaces as a retryable
    /// conflict, never an indefinite block.
    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        let mut tx = self.repository.pool.begin().await?;
        // SET LOCAL takes no bind parameters; the value comes from config
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.config.lock_timeout_ms
        ))
        .execute(&mut *tx)
        .await?;
        Ok(tx)
    }

    /// Borrow a book for a member
    pub async fn borrow(&self, member_id: i32, book_id: i32) -> AppResult<BorrowingDetails> {
        let mut tx = self.begin().await?;

        // Member row lock serializes this member's concurrent borrow attempts
        let member = self
            .repository
            .members
            .lock_for_update(&mut tx, member_id)
            .await?;
        if member.role != MemberRole::Member {
            return Err(AppError::Authorization(
                "Only members may borrow books".to_string(),
            ));
        }

        let open = self
            .repository
            .borrowings
            .count_open_for_member(&mut tx, member_id)
            .await?;
        if open >= self.config.max_active_borrowings {
            return Err(AppError::LimitExceeded(format!(
                "Maximum active borrowings reached ({}/{})",
                open, self.config.max_active_borrowings
            )));
        }

        if self
            .repository
            .borrowings
            .has_open_for_book(&mut tx, member_id, book_id)
            .await?
        {
            return Err(AppError::DuplicateLoan(format!(
                "Member {} already has book {} on loan",
                member_id, book_id
            )));
        }

        self.repository
            .books
            .decrement_availability(&mut tx, book_id)
            .await?;

        let now = Utc::now();
        let due_date = now + Duration::days(self.config.loan_period_days);
        let borrowing = self
            .repository
            .borrowings
            .insert(&mut tx, member_id, book_id, now, due_date)
            .await?;
        let book = self.repository.books.get_by_id_tx(&mut tx, book_id).await?;

        tx.commit().await?;

        tracing::info!(member_id, book_id, borrowing_id = borrowing.id, "book borrowed");

        Ok(self.to_details(borrowing, book.into(), now))
    }

    /// Return a borrowed book, computing the fine
    pub async fn return_book(&self, borrowing_id: i32) -> AppResult<BorrowingDetails> {
        let mut tx = self.begin().await?;

        let borrowing = self
            .repository
            .borrowings
            .get_for_update(&mut tx, borrowing_id)
            .await?;
        if borrowing.return_date.is_some() {
            return Err(AppError::AlreadyReturned(format!(
                "Borrowing {} was already returned",
                borrowing_id
            )));
        }

        let now = Utc::now();
        let fine = fine::fine_on_return(borrowing.due_date, now, self.config.fine_rate_per_day);

        let affected = self
            .repository
            .borrowings
            .mark_returned(&mut tx, borrowing_id, now, fine)
            .await?;
        if affected == 0 {
            // Unreachable while we hold the row lock; second guard only
            return Err(AppError::AlreadyReturned(format!(
                "Borrowing {} was already returned",
                borrowing_id
            )));
        }

        self.repository
            .books
            .increment_availability(&mut tx, borrowing.book_id)
            .await?;
        let book = self
            .repository
            .books
            .get_by_id_tx(&mut tx, borrowing.book_id)
            .await?;

        tx.commit().await?;

        tracing::info!(borrowing_id, fine, "book returned");

        let closed = Borrowing {
            return_date: Some(now),
            fine,
            ..borrowing
        };
        Ok(self.to_details(closed, book.into(), now))
    }

    /// Get a single borrowing record (used by the boundary ownership check)
    pub async fn get_borrowing(&self, id: i32) -> AppResult<Borrowing> {
        self.repository.borrowings.get_by_id(id).await
    }

    /// List borrowings with filters, sorting and pagination
    pub async fn list_borrowings(
        &self,
        query: &BorrowingQuery,
    ) -> AppResult<(Vec<BorrowingDetails>, i64)> {
        let (_, per_page, offset) = page::page_window(query.page, query.limit);
        let (rows, total) = self
            .repository
            .borrowings
            .search(query, per_page, offset)
            .await?;

        let now = Utc::now();
        let details = rows
            .into_iter()
            .map(|(borrowing, book)| self.to_details(borrowing, book, now))
            .collect();

        Ok((details, total))
    }

    /// Full borrowing history: same projection with the status filter forced
    /// to all records
    pub async fn history(&self, query: &BorrowingQuery) -> AppResult<(Vec<BorrowingDetails>, i64)> {
        let mut query = query.clone();
        query.status = Some(BorrowingStatus::All);
        self.list_borrowings(&query).await
    }

    /// Returned loans carry their persisted fine; open overdue loans show
    /// the fine accrued so far, computed against now without touching state.
    fn to_details(
        &self,
        borrowing: Borrowing,
        book: BookSummary,
        now: DateTime<Utc>,
    ) -> BorrowingDetails {
        let (fine, is_overdue) = match borrowing.return_date {
            Some(returned) => (borrowing.fine, returned > borrowing.due_date),
            None => (
                fine::accrued_fine(borrowing.due_date, now, self.config.fine_rate_per_day),
                now > borrowing.due_date,
            ),
        };

        BorrowingDetails {
            id: borrowing.id,
            book,
            member_id: borrowing.member_id,
            borrow_date: borrowing.borrow_date,
            due_date: borrowing.due_date,
            return_date: borrowing.return_date,
            fine,
            is_overdue,
        }
    }
}
