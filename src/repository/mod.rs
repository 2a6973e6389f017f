//! Repository layer for database operations

pub mod books;
pub mod borrowings;
pub mod members;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub borrowings: borrowings::BorrowingsRepository,
    pub members: members::MembersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            borrowings: borrowings::BorrowingsRepository::new(pool.clone()),
            members: members::MembersRepository::new(pool.clone()),
            pool,
        }
    }
}
