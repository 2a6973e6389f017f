//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrowings, health, members, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pustaka API",
        version = "0.1.0",
        description = "Library Lending Management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Borrowings
        borrowings::borrow,
        borrowings::return_book,
        borrowings::list_borrowings,
        borrowings::history,
        // Members
        members::list_members,
        members::get_member,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Borrowings
            crate::models::borrowing::BorrowingDetails,
            crate::models::borrowing::BorrowingStatus,
            crate::models::borrowing::BorrowingSort,
            crate::models::borrowing::SortOrder,
            // Members
            crate::models::member::Member,
            crate::models::member::MemberRole,
            // Stats
            stats::StatsResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog management"),
        (name = "borrowings", description = "Borrowing and return operations"),
        (name = "members", description = "Member directory"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
