//! Admin activity log repository.

use std::sync::Arc;

use crate::entities::{AdminActivityLog, admin_activity_log};
use chrono::{DateTime, Utc};
use matrix_common::{AppError, AppResult, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Optional filters for the activity log listing.
#[derive(Debug, Clone, Default)]
pub struct ActivityLogFilter {
    pub user_id: Option<String>,
    /// Substring of the action type, e.g. `POST` or `/reports`.
    pub action_type: Option<String>,
    pub success: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl ActivityLogFilter {
    fn condition(&self) -> Condition {
        let mut cond = Condition::all();

        if let Some(user_id) = &self.user_id {
            cond = cond.add(admin_activity_log::Column::UserId.eq(user_id.as_str()));
        }
        if let Some(action_type) = self.action_type.as_deref().filter(|a| !a.is_empty()) {
            cond = cond.add(admin_activity_log::Column::ActionType.contains(action_type));
        }
        if let Some(success) = self.success {
            cond = cond.add(admin_activity_log::Column::IsSuccessful.eq(success));
        }
        if let Some(from) = self.from {
            cond = cond.add(admin_activity_log::Column::ActionTime.gte(from.fixed_offset()));
        }
        if let Some(to) = self.to {
            cond = cond.add(admin_activity_log::Column::ActionTime.lt(to.fixed_offset()));
        }

        cond
    }
}

/// Admin activity log repository for database operations.
#[derive(Clone)]
pub struct AdminActivityLogRepository {
    db: Arc<DatabaseConnection>,
}

impl AdminActivityLogRepository {
    /// Create a new activity log repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a log entry.
    pub async fn create(
        &self,
        model: admin_activity_log::ActiveModel,
    ) -> AppResult<admin_activity_log::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Entries matching `filter`, newest first.
    pub async fn find_filtered(
        &self,
        filter: &ActivityLogFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<admin_activity_log::Model>, u64)> {
        let query = AdminActivityLog::find()
            .filter(filter.condition())
            .order_by_desc(admin_activity_log::Column::ActionTime);

        let total = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let items = query
            .offset(page.offset())
            .limit(page.limit())
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((items, total))
    }

    /// Delete entries older than `cutoff`.
    pub async fn delete_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = AdminActivityLog::delete_many()
            .filter(admin_activity_log::Column::ActionTime.lt(cutoff.fixed_offset()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_log(id: &str, success: bool) -> admin_activity_log::Model {
        admin_activity_log::Model {
            id: id.to_string(),
            user_id: Some("u1".to_string()),
            action_type: "GET /api/dashboard/reports".to_string(),
            action_time: Utc::now().into(),
            ip_address: Some("10.0.0.1".to_string()),
            is_successful: success,
            page_path: "/api/dashboard/reports".to_string(),
            duration_ms: 12,
            error_message: None,
        }
    }

    #[test]
    fn test_filter_conditions() {
        assert!(ActivityLogFilter::default().condition().is_empty());

        let filter = ActivityLogFilter {
            success: Some(false),
            ..Default::default()
        };
        assert!(!filter.condition().is_empty());
    }

    #[tokio::test]
    async fn test_find_filtered() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .append_query_results([[create_test_log("l1", true)]])
                .into_connection(),
        );

        let repo = AdminActivityLogRepository::new(db);
        let (items, total) = repo
            .find_filtered(
                &ActivityLogFilter {
                    success: Some(true),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();

        assert_eq!(total, 1);
        assert!(items[0].is_successful);
    }

    #[tokio::test]
    async fn test_delete_before() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 42,
                }])
                .into_connection(),
        );

        let repo = AdminActivityLogRepository::new(db);
        assert_eq!(repo.delete_before(Utc::now()).await.unwrap(), 42);
    }
}
