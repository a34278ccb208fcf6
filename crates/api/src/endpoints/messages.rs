//! Direct message endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use matrix_common::{AppResult, Paged};
use matrix_core::SendMessageInput;
use matrix_db::entities::message;
use serde::Serialize;

use crate::{
    endpoints::PageQuery,
    extractors::AuthUser,
    middleware::AppState,
    response::{Affected, ApiResponse},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub count: u64,
}

async fn send(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SendMessageInput>,
) -> AppResult<ApiResponse<message::Model>> {
    let message = state
        .messaging_service
        .send_message(&user.person_id, req)
        .await?;
    Ok(ApiResponse::created(message))
}

/// Messages exchanged with `person_id`, newest first.
async fn conversation(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(person_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Paged<message::Model>>> {
    let messages = state
        .messaging_service
        .get_conversation(&user.person_id, &person_id, query.page_request())
        .await?;
    Ok(ApiResponse::ok(messages))
}

async fn mark_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(person_id): Path<String>,
) -> AppResult<ApiResponse<Affected>> {
    let affected = state
        .messaging_service
        .mark_conversation_read(&user.person_id, &person_id)
        .await?;
    Ok(ApiResponse::ok(affected.into()))
}

async fn unread_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UnreadCountResponse>> {
    let count = state.messaging_service.unread_count(&user.person_id).await?;
    Ok(ApiResponse::ok(UnreadCountResponse { count }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(send))
        .route("/unread-count", get(unread_count))
        .route("/{person_id}", get(conversation))
        .route("/{person_id}/read", post(mark_read))
}
