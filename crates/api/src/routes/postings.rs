//! Posting routes.
//!
//! - `POST /postings` commits a posting and returns it with its assigned ids
//! - `GET /postings?days=N` lists postings of the trailing window
//! - `GET /postings/{year}/{month}` lists postings of a calendar month

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use oasis_core::posting::{NewPosting, PostingHeader, Postings};
use serde::Deserialize;
use tracing::info;

use crate::{AppState, error::ApiError};

/// Trailing window used when `days` is not given.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Creates the posting routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/postings", get(find_recent_postings).post(commit_posting))
        .route("/postings/{year}/{month}", get(find_postings_for_month))
}

/// Query parameters for the trailing window listing.
#[derive(Debug, Deserialize)]
pub struct RecentPostingsQuery {
    /// Number of days back from today.
    pub days: Option<u32>,
}

async fn commit_posting(
    State(state): State<AppState>,
    Json(payload): Json<NewPosting>,
) -> Result<(StatusCode, Json<PostingHeader>), ApiError> {
    let header = state.postings.commit_posting(payload).await?;
    Ok((StatusCode::CREATED, Json(header)))
}

async fn find_recent_postings(
    State(state): State<AppState>,
    Query(query): Query<RecentPostingsQuery>,
) -> Result<Json<Vec<PostingHeader>>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_WINDOW_DAYS);
    let postings = state.postings.find_recent_postings(days).await?;
    let headers = collect(postings)?;

    info!(days, postings = headers.len(), "Listed recent postings");
    Ok(Json(headers))
}

async fn find_postings_for_month(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<Vec<PostingHeader>>, ApiError> {
    let postings = state.postings.find_postings_for_month(month, year).await?;
    let headers = collect(postings)?;

    info!(year, month, postings = headers.len(), "Listed postings for month");
    Ok(Json(headers))
}

fn collect(postings: Postings) -> Result<Vec<PostingHeader>, ApiError> {
    Ok(postings.collect::<Result<Vec<_>, _>>()?)
}
