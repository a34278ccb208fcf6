//! Notification endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use matrix_common::{AppError, AppResult, PageRequest, Paged};
use matrix_db::entities::notification;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{Affected, ApiResponse},
};

/// Largest batch accepted by the bulk read endpoint.
const MAX_BATCH: usize = 100;

/// Notification list query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    #[serde(default)]
    pub unread_only: bool,
}

/// Bulk mark-as-read body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub notification_ids: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub count: u64,
}

async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Paged<notification::Model>>> {
    let page = PageRequest::from_query(query.page, query.page_size);
    let notifications = state
        .notification_service
        .get_notifications(&user.person_id, query.unread_only, page)
        .await?;
    Ok(ApiResponse::ok(notifications))
}

async fn unread_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UnreadCountResponse>> {
    let count = state
        .notification_service
        .get_unread_count(&user.person_id)
        .await?;
    Ok(ApiResponse::ok(UnreadCountResponse { count }))
}

async fn mark_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Affected>> {
    let affected = state
        .notification_service
        .mark_as_read(&id, &user.person_id)
        .await?;
    Ok(ApiResponse::ok(affected.into()))
}

async fn mark_unread(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Affected>> {
    let affected = state
        .notification_service
        .mark_as_unread(&id, &user.person_id)
        .await?;
    Ok(ApiResponse::ok(affected.into()))
}

async fn mark_many_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<MarkReadRequest>,
) -> AppResult<ApiResponse<Affected>> {
    if req.notification_ids.len() > MAX_BATCH {
        return Err(AppError::validation(
            "notificationIds",
            format!("at most {MAX_BATCH} ids per request"),
        ));
    }

    let affected = state
        .notification_service
        .mark_multiple_as_read(&req.notification_ids, &user.person_id)
        .await?;
    Ok(ApiResponse::ok(affected.into()))
}

async fn mark_all_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Affected>> {
    let affected = state
        .notification_service
        .mark_all_as_read(&user.person_id)
        .await?;
    Ok(ApiResponse::ok(affected.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/unread-count", get(unread_count))
        .route("/read", post(mark_many_read))
        .route("/read-all", post(mark_all_read))
        .route("/{id}/read", post(mark_read))
        .route("/{id}/unread", post(mark_unread))
}
