//! Members repository for database operations

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::member::Member,
};

const MEMBER_COLUMNS: &str = "id, name, email, role, created_at";

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Postgres>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get member by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(&format!(
            "SELECT {} FROM members WHERE id = $1",
            MEMBER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))
    }

    /// Lock the member row for the duration of the transaction. Serializes
    /// concurrent borrows by the same member so the open-loan count and
    /// duplicate checks cannot race.
    pub async fn lock_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(&format!(
            "SELECT {} FROM members WHERE id = $1 FOR UPDATE",
            MEMBER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))
    }

    /// List members with pagination, ordered by name
    pub async fn list(&self, per_page: i64, offset: i64) -> AppResult<(Vec<Member>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;

        let members = sqlx::query_as::<_, Member>(&format!(
            "SELECT {} FROM members ORDER BY name LIMIT {} OFFSET {}",
            MEMBER_COLUMNS, per_page, offset
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok((members, total))
    }
}
