//! Pustaka Library Lending Management System
//!
//! A Rust server for library lending management: book inventory with
//! concurrency-safe copy counters, an append-only borrowing ledger, late-fine
//! computation, and the REST boundary the catalog UI talks to.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod fine;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
