//! API handlers for Pustaka REST endpoints

pub mod books;
pub mod borrowings;
pub mod health;
pub mod members;
pub mod openapi;
pub mod stats;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, models::member::MemberRole, AppState};

/// Caller identity, pre-validated by the upstream auth gateway and carried
/// on trusted headers. This server never verifies credentials itself.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub member_id: i32,
    pub role: MemberRole,
}

impl Caller {
    pub fn is_librarian(&self) -> bool {
        self.role == MemberRole::Librarian
    }

    pub fn require_librarian(&self) -> Result<(), AppError> {
        if self.is_librarian() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Librarian role required".to_string(),
            ))
        }
    }
}

/// Extractor for the caller identity headers
pub struct CallerIdentity(pub Caller);

#[async_trait]
impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        let member_id = parts
            .headers
            .get("x-member-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<i32>().ok())
            .ok_or_else(|| {
                AppError::Authentication("Missing or invalid X-Member-Id header".to_string())
            })?;

        let role = parts
            .headers
            .get("x-member-role")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<MemberRole>().ok())
            .ok_or_else(|| {
                AppError::Authentication("Missing or invalid X-Member-Role header".to_string())
            })?;

        Ok(CallerIdentity(Caller { member_id, role }))
    }
}
