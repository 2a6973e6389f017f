//! Business logic services

pub mod catalog;
pub mod lending;
pub mod members;
pub mod stats;

use crate::{config::LendingConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub lending: lending::LendingService,
    pub members: members::MembersService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, lending_config: LendingConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            lending: lending::LendingService::new(repository.clone(), lending_config),
            members: members::MembersService::new(repository.clone()),
            stats: stats::StatsService::new(repository),
        }
    }
}
