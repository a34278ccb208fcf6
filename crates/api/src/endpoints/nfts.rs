//! NFT showcase endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
};
use matrix_common::AppResult;
use matrix_core::AddNftInput;
use matrix_db::entities::nft;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

async fn add(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<AddNftInput>,
) -> AppResult<ApiResponse<nft::Model>> {
    let nft = state.nft_service.add_nft(&user.person_id, req).await?;
    Ok(ApiResponse::created(nft))
}

async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.nft_service.remove_nft(&id, &user.person_id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add))
        .route("/{id}", delete(remove))
}
