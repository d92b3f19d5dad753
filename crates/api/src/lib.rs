//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes for committing and querying postings
//! - JSON error responses carrying stable error codes

pub mod error;
pub mod routes;

use axum::Router;
use oasis_core::posting::PostingService;
use oasis_db::PostingRepository;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Posting commit and query service.
    pub postings: Arc<PostingService<PostingRepository>>,
}

impl AppState {
    /// Builds the state over a database connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            postings: Arc::new(PostingService::new(Arc::new(PostingRepository::new(db)))),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
