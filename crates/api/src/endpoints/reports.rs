//! Report endpoints.

use axum::{Json, Router, extract::State, routing::post};
use matrix_common::AppResult;
use matrix_core::CreateReportInput;
use matrix_db::entities::report;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// File a report against a person or an article.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateReportInput>,
) -> AppResult<ApiResponse<report::Model>> {
    let report = state
        .report_service
        .create_report(&user.person_id, req)
        .await?;
    Ok(ApiResponse::created(report))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create))
}
