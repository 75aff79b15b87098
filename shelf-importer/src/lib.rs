//! shelf-importer library interface
//!
//! Imports book metadata from external sources into a user's library.
//! Exposes the router and state so integration tests can drive the service
//! in-process.

pub mod api;
pub mod db;
pub mod error;
pub mod isbn;
pub mod models;
pub mod projection;
pub mod providers;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use axum::{middleware, Router};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::providers::ProviderRegistry;
use crate::services::ImportService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Immutable after startup
    pub registry: Arc<ProviderRegistry>,
    pub importer: Arc<ImportService>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        registry: Arc<ProviderRegistry>,
        importer: Arc<ImportService>,
    ) -> Self {
        Self {
            db,
            registry,
            importer,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Importer routes live under `/api/v1` and require an acting user;
/// `/health` does not.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(api::importer_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::require_user,
        ));

    Router::new()
        .nest("/api/v1", api)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
