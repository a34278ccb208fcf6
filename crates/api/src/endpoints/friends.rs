//! Friendship endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use matrix_common::{AppResult, Paged};
use matrix_core::FriendshipStatusView;
use matrix_db::entities::{friendship, person};
use serde::Deserialize;

use crate::{
    endpoints::{PageQuery, persons::hydrate_persons},
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Friend request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub receiver_id: String,
}

async fn send_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FriendRequestBody>,
) -> AppResult<ApiResponse<friendship::Model>> {
    let request = state
        .friendship_service
        .send_friend_request(&user.person_id, &req.receiver_id)
        .await?;
    Ok(ApiResponse::created(request))
}

async fn accept(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<friendship::Model>> {
    let request = state
        .friendship_service
        .accept_friend_request(&id, &user.person_id)
        .await?;
    Ok(ApiResponse::ok(request))
}

async fn reject(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<friendship::Model>> {
    let request = state
        .friendship_service
        .reject_friend_request(&id, &user.person_id)
        .await?;
    Ok(ApiResponse::ok(request))
}

/// Incoming pending requests.
async fn pending(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Paged<friendship::Model>>> {
    let requests = state
        .friendship_service
        .get_pending_requests(&user.person_id, query.page_request())
        .await?;
    Ok(ApiResponse::ok(requests))
}

async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Paged<person::Model>>> {
    let ids = state
        .friendship_service
        .get_friends(&user.person_id, query.page_request())
        .await?;
    Ok(ApiResponse::ok(hydrate_persons(&state, ids).await?))
}

async fn status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<FriendshipStatusView>> {
    let status = state
        .friendship_service
        .get_status(&user.person_id, &id)
        .await?;
    Ok(ApiResponse::ok(status))
}

async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state
        .friendship_service
        .remove_friend(&user.person_id, &id)
        .await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/requests", get(pending).post(send_request))
        .route("/requests/{id}/accept", post(accept))
        .route("/requests/{id}/reject", post(reject))
        .route("/{id}/status", get(status))
        .route("/{id}", delete(remove))
}
