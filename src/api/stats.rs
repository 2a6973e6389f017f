//! Statistics endpoint (librarian only)

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

use super::CallerIdentity;

/// Library-wide counters for the dashboard
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Catalog entries (excluding archived books)
    pub books_total: i64,
    /// Physical copies owned
    pub copies_total: i64,
    /// Copies currently on the shelf
    pub copies_available: i64,
    pub members_total: i64,
    /// Open borrowings
    pub borrowings_active: i64,
    /// Open borrowings past their due date
    pub borrowings_overdue: i64,
    /// Sum of fines on returned loans, in currency minor units
    pub fines_collected: i64,
}

/// Get library statistics
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Library statistics", body = StatsResponse),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    CallerIdentity(caller): CallerIdentity,
) -> AppResult<Json<StatsResponse>> {
    caller.require_librarian()?;

    let stats = state.services.stats.get_stats().await?;
    Ok(Json(stats))
}
