//! Admin dashboard endpoints.
//!
//! Every handler takes [`AdminUser`]; every request, allowed or not, is
//! written to the admin activity log.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use matrix_common::{AppError, AppResult, PageRequest, Paged};
use matrix_core::{DashboardStats, ReportView};
use matrix_db::{
    entities::{
        admin_activity_log,
        notification::kind,
        report::{self, ReportStatus, ReportType},
    },
    repositories::{ActivityLogFilter, ReportFilter},
};
use serde::Deserialize;

use crate::{
    extractors::AdminUser,
    middleware::{AppState, activity_log_middleware},
    response::{Affected, ApiResponse},
};

/// Moderation queue query.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// `pending`, `processed`, `rejected` or the numeric code.
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<ReportType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub keyword: Option<String>,
    pub reporter_id: Option<String>,
    pub target_id: Option<String>,
}

impl ReportQuery {
    fn filter(&self) -> AppResult<ReportFilter> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(parse_status)
            .transpose()?;

        Ok(ReportFilter {
            status,
            report_type: self.report_type,
            keyword: non_empty(self.keyword.as_deref()),
            from: self.from,
            to: self.to,
            reporter_id: non_empty(self.reporter_id.as_deref()),
            target_id: non_empty(self.target_id.as_deref()),
        })
    }
}

/// Activity log query.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub user_id: Option<String>,
    pub action_type: Option<String>,
    pub success: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Retention request for the cleanup endpoints.
#[derive(Debug, Deserialize)]
pub struct CleanupRequest {
    pub days: i64,
}

/// System notification fan-out.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    pub receiver_ids: Vec<String>,
    pub content: String,
    #[serde(default = "default_notification_type")]
    pub notification_type: i32,
    pub related_id: Option<String>,
}

const fn default_notification_type() -> i32 {
    kind::SYSTEM
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

fn parse_status(value: &str) -> AppResult<ReportStatus> {
    let status = match value.trim().to_lowercase().as_str() {
        "pending" => Some(ReportStatus::Pending),
        "processed" => Some(ReportStatus::Processed),
        "rejected" => Some(ReportStatus::Rejected),
        other => other.parse::<i16>().ok().and_then(ReportStatus::from_code),
    };

    status.ok_or_else(|| AppError::validation("status", format!("unknown status '{value}'")))
}

async fn reports(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<ApiResponse<Paged<ReportView>>> {
    let filter = query.filter()?;
    let page = PageRequest::from_query(query.page, query.page_size);
    let reports = state.report_service.get_reports(&filter, page).await?;
    Ok(ApiResponse::ok(reports))
}

async fn report(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ReportView>> {
    let report = state
        .report_service
        .get_report(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {id} not found")))?;
    Ok(ApiResponse::ok(report))
}

async fn process_report(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<report::Model>> {
    let report = state
        .report_service
        .process_report(&id, &admin.person_id)
        .await?;
    Ok(ApiResponse::ok(report))
}

async fn reject_report(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<report::Model>> {
    let report = state
        .report_service
        .reject_report(&id, &admin.person_id)
        .await?;
    Ok(ApiResponse::ok(report))
}

async fn logs(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> AppResult<ApiResponse<Paged<admin_activity_log::Model>>> {
    let filter = ActivityLogFilter {
        user_id: non_empty(query.user_id.as_deref()),
        action_type: non_empty(query.action_type.as_deref()),
        success: query.success,
        from: query.from,
        to: query.to,
    };
    let page = PageRequest::from_query(query.page, query.page_size);
    let logs = state.activity_log_service.get_logs(&filter, page).await?;
    Ok(ApiResponse::ok(logs))
}

async fn cleanup_logs(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<CleanupRequest>,
) -> AppResult<ApiResponse<Affected>> {
    let deleted = state.activity_log_service.cleanup_old_logs(req.days).await?;
    Ok(ApiResponse::ok(deleted.into()))
}

async fn broadcast(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<BroadcastRequest>,
) -> AppResult<ApiResponse<Affected>> {
    let sent = state
        .notification_service
        .broadcast_system_notification(
            &req.receiver_ids,
            req.notification_type,
            &req.content,
            req.related_id.as_deref(),
        )
        .await?;
    Ok(ApiResponse::ok(sent.into()))
}

async fn cleanup_notifications(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<CleanupRequest>,
) -> AppResult<ApiResponse<Affected>> {
    let deleted = state
        .notification_service
        .cleanup_old_notifications(req.days)
        .await?;
    Ok(ApiResponse::ok(deleted.into()))
}

async fn stats(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardStats>> {
    Ok(ApiResponse::ok(state.dashboard_service.get_stats().await?))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/reports", get(reports))
        .route("/reports/{id}", get(report))
        .route("/reports/{id}/process", post(process_report))
        .route("/reports/{id}/reject", post(reject_report))
        .route("/logs", get(logs))
        .route("/logs/cleanup", post(cleanup_logs))
        .route("/notifications", post(broadcast))
        .route("/notifications/cleanup", post(cleanup_notifications))
        .route("/stats", get(stats))
        .route_layer(middleware::from_fn_with_state(
            state,
            activity_log_middleware,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert!(matches!(parse_status("pending"), Ok(ReportStatus::Pending)));
        assert!(matches!(parse_status("Processed"), Ok(ReportStatus::Processed)));
        assert!(matches!(parse_status("2"), Ok(ReportStatus::Rejected)));
        assert!(matches!(parse_status("9"), Err(AppError::Validation(_))));
        assert!(matches!(parse_status("done"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_report_query_filter() {
        let query = ReportQuery {
            status: Some("0".to_string()),
            keyword: Some("  ".to_string()),
            reporter_id: Some("p1".to_string()),
            ..ReportQuery::default()
        };

        let filter = query.filter().unwrap_or_default();
        assert_eq!(filter.status, Some(ReportStatus::Pending));
        assert_eq!(filter.keyword, None);
        assert_eq!(filter.reporter_id.as_deref(), Some("p1"));
    }
}
