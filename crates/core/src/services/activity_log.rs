//! Admin activity log service.

use crate::services::retention_cutoff;
use chrono::Utc;
use matrix_common::{AppResult, IdGenerator, PageRequest, Paged};
use matrix_db::{
    entities::admin_activity_log::{self, ACTION_LOGIN},
    repositories::{ActivityLogFilter, AdminActivityLogRepository},
};
use sea_orm::Set;

const MAX_ACTION_CHARS: usize = 256;
const MAX_ERROR_CHARS: usize = 2000;

/// One recorded admin request or login attempt.
#[derive(Debug, Clone)]
pub struct RecordActivityInput {
    pub user_id: Option<String>,
    pub action_type: String,
    pub ip_address: Option<String>,
    pub is_successful: bool,
    pub page_path: String,
    pub duration_ms: i64,
    pub error_message: Option<String>,
}

/// Activity log service for business logic.
#[derive(Clone)]
pub struct ActivityLogService {
    log_repo: AdminActivityLogRepository,
    id_gen: IdGenerator,
}

impl ActivityLogService {
    /// Create a new activity log service.
    #[must_use]
    pub const fn new(log_repo: AdminActivityLogRepository) -> Self {
        Self {
            log_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Append an entry.
    pub async fn record(&self, input: RecordActivityInput) -> AppResult<admin_activity_log::Model> {
        let model = admin_activity_log::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(input.user_id),
            action_type: Set(truncate(&input.action_type, MAX_ACTION_CHARS)),
            action_time: Set(Utc::now().into()),
            ip_address: Set(input.ip_address),
            is_successful: Set(input.is_successful),
            page_path: Set(truncate(&input.page_path, MAX_ACTION_CHARS)),
            duration_ms: Set(input.duration_ms.max(0)),
            error_message: Set(input
                .error_message
                .map(|e| truncate(&e, MAX_ERROR_CHARS))),
        };

        self.log_repo.create(model).await
    }

    /// Record a login attempt. Failures to write are only logged.
    pub async fn record_login(
        &self,
        user_id: Option<String>,
        ip_address: Option<String>,
        page_path: &str,
        duration_ms: i64,
        error_message: Option<String>,
    ) {
        let input = RecordActivityInput {
            user_id,
            action_type: ACTION_LOGIN.to_string(),
            ip_address,
            is_successful: error_message.is_none(),
            page_path: page_path.to_string(),
            duration_ms,
            error_message,
        };

        if let Err(e) = self.record(input).await {
            tracing::warn!(error = %e, "Failed to record login attempt");
        }
    }

    /// Entries matching `filter`, newest first.
    pub async fn get_logs(
        &self,
        filter: &ActivityLogFilter,
        page: PageRequest,
    ) -> AppResult<Paged<admin_activity_log::Model>> {
        let (items, total) = self.log_repo.find_filtered(filter, page).await?;
        Ok(Paged::new(items, page, total))
    }

    /// Delete entries older than `days` days.
    pub async fn cleanup_old_logs(&self, days: i64) -> AppResult<u64> {
        let cutoff = retention_cutoff(days)?;
        let deleted = self.log_repo.delete_before(cutoff).await?;

        tracing::info!(days, deleted, "Cleaned up admin activity logs");
        Ok(deleted)
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_log(action_type: &str, is_successful: bool) -> admin_activity_log::Model {
        admin_activity_log::Model {
            id: "l1".to_string(),
            user_id: Some("u1".to_string()),
            action_type: action_type.to_string(),
            action_time: Utc::now().into(),
            ip_address: Some("127.0.0.1".to_string()),
            is_successful,
            page_path: "/api/dashboard/stats".to_string(),
            duration_ms: 12,
            error_message: None,
        }
    }

    fn service(db: MockDatabase) -> ActivityLogService {
        ActivityLogService::new(AdminActivityLogRepository::new(Arc::new(
            db.into_connection(),
        )))
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ab", 3), "ab");
    }

    #[tokio::test]
    async fn test_record() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_log("GET /api/dashboard/stats", true)]]),
        );

        let entry = service
            .record(RecordActivityInput {
                user_id: Some("u1".to_string()),
                action_type: "GET /api/dashboard/stats".to_string(),
                ip_address: Some("127.0.0.1".to_string()),
                is_successful: true,
                page_path: "/api/dashboard/stats".to_string(),
                duration_ms: 12,
                error_message: None,
            })
            .await
            .unwrap();
        assert!(entry.is_successful);
    }

    #[tokio::test]
    async fn test_record_login_failure_is_swallowed() {
        // No mock results: the insert fails and is only logged
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        service
            .record_login(None, None, "/api/login", 5, Some("Unauthorized".to_string()))
            .await;
    }

    #[tokio::test]
    async fn test_cleanup_old_logs() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 4,
            },
        ]));

        assert!(service.cleanup_old_logs(0).await.is_err());
        assert_eq!(service.cleanup_old_logs(90).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_cleanup_rejects_oversized_window() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.cleanup_old_logs(1_000_000_000).await;
        assert!(matches!(
            result,
            Err(matrix_common::AppError::Validation(_))
        ));
    }
}
