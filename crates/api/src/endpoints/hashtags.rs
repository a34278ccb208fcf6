//! Hashtag endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use matrix_common::AppResult;
use matrix_db::entities::hashtag;
use serde::Deserialize;

use crate::{middleware::AppState, response::ApiResponse};

const DEFAULT_LIMIT: u64 = 10;

/// Hashtag lookup query.
#[derive(Debug, Deserialize)]
pub struct HashtagQuery {
    /// Name prefix. Without one the trending hashtags are returned.
    pub q: Option<String>,
    pub limit: Option<u64>,
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<HashtagQuery>,
) -> AppResult<ApiResponse<Vec<hashtag::Model>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    let hashtags = match query.q.as_deref().map(str::trim) {
        Some(prefix) if !prefix.is_empty() => state.hashtag_service.search(prefix, limit).await?,
        _ => state.hashtag_service.trending(limit).await?,
    };
    Ok(ApiResponse::ok(hashtags))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(search))
}
