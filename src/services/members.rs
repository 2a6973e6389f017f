//! Member directory service

use crate::{
    error::AppResult,
    models::member::Member,
    repository::Repository,
};

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
}

impl MembersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get member by ID
    pub async fn get(&self, id: i32) -> AppResult<Member> {
        self.repository.members.get_by_id(id).await
    }

    /// List members with pagination
    pub async fn list(&self, per_page: i64, offset: i64) -> AppResult<(Vec<Member>, i64)> {
        self.repository.members.list(per_page, offset).await
    }
}
