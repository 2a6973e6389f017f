//! Statistics service

use crate::{api::stats::StatsResponse, error::AppResult, repository::Repository};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Library-wide counters for the dashboard. Pure read projection.
    pub async fn get_stats(&self) -> AppResult<StatsResponse> {
        let pool = &self.repository.pool;

        let (books_total, copies_total, copies_available): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(copies_total), 0)::bigint,
                   COALESCE(SUM(copies_available), 0)::bigint
            FROM books
            WHERE archived_at IS NULL
            "#,
        )
        .fetch_one(pool)
        .await?;

        let members_total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(pool)
            .await?;

        let borrowings_active: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM borrowings WHERE return_date IS NULL")
                .fetch_one(pool)
                .await?;

        let borrowings_overdue: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowings WHERE return_date IS NULL AND due_date < NOW()",
        )
        .fetch_one(pool)
        .await?;

        let fines_collected: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(fine), 0)::bigint FROM borrowings WHERE return_date IS NOT NULL",
        )
        .fetch_one(pool)
        .await?;

        Ok(StatsResponse {
            books_total,
            copies_total,
            copies_available,
            members_total,
            borrowings_active,
            borrowings_overdue,
            fines_collected,
        })
    }
}
