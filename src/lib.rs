//! Lendhood lending scheduler
//!
//! Neighbors publish availability windows for the items they own, others
//! request to borrow them for a date range, owners accept or reject, and
//! accepted requests become loans tracked until they are returned.
//! Exposed as a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
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
