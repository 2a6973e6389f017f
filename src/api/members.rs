//! Member directory endpoints (librarian only)

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        member::{Member, MemberQuery},
        page::{self, Page},
    },
};

use super::CallerIdentity;

/// List members with pagination
#[utoipa::path(
    get,
    path = "/members",
    tag = "members",
    params(MemberQuery),
    responses(
        (status = 200, description = "Paginated member list", body = Page<Member>),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn list_members(
    State(state): State<crate::AppState>,
    CallerIdentity(caller): CallerIdentity,
    Query(query): Query<MemberQuery>,
) -> AppResult<Json<Page<Member>>> {
    caller.require_librarian()?;

    let (page_no, per_page, offset) = page::page_window(query.page, query.limit);
    let (items, total) = state.services.members.list(per_page, offset).await?;

    Ok(Json(Page::new(items, page_no, total, per_page)))
}

/// Get member details by ID
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "members",
    params(
        ("id" = i32, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Member details", body = Member),
        (status = 403, description = "Librarian role required"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn get_member(
    State(state): State<crate::AppState>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<i32>,
) -> AppResult<Json<Member>> {
    caller.require_librarian()?;

    let member = state.services.members.get(id).await?;
    Ok(Json(member))
}
