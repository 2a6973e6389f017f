//! Error types for Pustaka server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error codes surfaced in every error response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 4,
    BadValue = 5,
    ConflictingState = 6,
    BookNotAvailable = 7,
    MaxBorrowsReached = 8,
    AlreadyBorrowed = 9,
    AlreadyReturned = 10,
    StockOverflow = 11,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("No copies available: {0}")]
    OutOfStock(String),

    #[error("Borrowing limit reached: {0}")]
    LimitExceeded(String),

    #[error("Duplicate loan: {0}")]
    DuplicateLoan(String),

    #[error("Already returned: {0}")]
    AlreadyReturned(String),

    #[error("Inventory overflow: {0}")]
    Overflow(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Postgres lock/serialization failures surface as retryable conflicts;
/// everything else from the driver is a database failure.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            match db_err.code().as_deref() {
                // 55P03 = lock_not_available (lock_timeout), 40001 = serialization_failure
                Some("55P03") | Some("40001") => {
                    return AppError::Conflict(
                        "Operation timed out waiting for a concurrent transaction, retry".to_string(),
                    );
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::ConflictingState, msg.clone())
            }
            AppError::OutOfStock(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::BookNotAvailable, msg.clone())
            }
            AppError::LimitExceeded(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::MaxBorrowsReached, msg.clone())
            }
            AppError::DuplicateLoan(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::AlreadyBorrowed, msg.clone())
            }
            AppError::AlreadyReturned(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::AlreadyReturned, msg.clone())
            }
            AppError::Overflow(msg) => {
                // Invariant breach: never caused by user input, never exposed verbatim
                tracing::error!("Inventory overflow: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::StockOverflow,
                    "Internal server error".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn business_rule_rejections_are_unprocessable() {
        assert_eq!(
            status_of(AppError::OutOfStock("b".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(AppError::LimitExceeded("m".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(AppError::DuplicateLoan("m".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(AppError::AlreadyReturned("b".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn overflow_is_internal_and_not_exposed_verbatim() {
        let response = AppError::Overflow("book 7 exceeded copies_total".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn contention_maps_to_conflict() {
        assert_eq!(
            status_of(AppError::Conflict("lock timeout".into())),
            StatusCode::CONFLICT
        );
    }
}
