//! CMMS Maintenance Management System
//!
//! A Rust implementation of a maintenance-management backend, providing a
//! REST JSON API for tracking machines, components, preventive-maintenance
//! schedules and repair work orders with role-gated access.

use std::sync::Arc;

pub mod api;
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
    /// Kept alongside the repository for readiness probes
    pub db: sqlx::PgPool,
}
