//! Report repository.

use std::sync::Arc;

use crate::entities::{
    Report,
    report::{self, ReportStatus, ReportType},
};
use chrono::{DateTime, Utc};
use matrix_common::{AppError, AppResult, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, prelude::Expr,
};

/// Optional filters for the moderation queue. Set filters are AND-combined.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub report_type: Option<ReportType>,
    /// Substring of the reason.
    pub keyword: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub to: Option<DateTime<Utc>>,
    pub reporter_id: Option<String>,
    pub target_id: Option<String>,
}

impl ReportFilter {
    fn condition(&self) -> Condition {
        let mut cond = Condition::all();

        if let Some(status) = self.status {
            cond = cond.add(report::Column::Status.eq(status));
        }
        if let Some(report_type) = self.report_type {
            cond = cond.add(report::Column::ReportType.eq(report_type));
        }
        if let Some(keyword) = self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            cond = cond.add(report::Column::Reason.contains(keyword));
        }
        if let Some(from) = self.from {
            cond = cond.add(report::Column::CreatedAt.gte(from.fixed_offset()));
        }
        if let Some(to) = self.to {
            cond = cond.add(report::Column::CreatedAt.lt(to.fixed_offset()));
        }
        if let Some(reporter_id) = &self.reporter_id {
            cond = cond.add(report::Column::ReporterId.eq(reporter_id.as_str()));
        }
        if let Some(target_id) = &self.target_id {
            cond = cond.add(report::Column::TargetId.eq(target_id.as_str()));
        }

        cond
    }
}

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new report.
    pub async fn create(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether the reporter already has a pending report on this target.
    pub async fn has_pending(
        &self,
        reporter_id: &str,
        target_id: &str,
        report_type: ReportType,
    ) -> AppResult<bool> {
        let count = Report::find()
            .filter(report::Column::ReporterId.eq(reporter_id))
            .filter(report::Column::TargetId.eq(target_id))
            .filter(report::Column::ReportType.eq(report_type))
            .filter(report::Column::Status.eq(ReportStatus::Pending))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Reports matching `filter`, newest first.
    pub async fn find_filtered(
        &self,
        filter: &ReportFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<report::Model>, u64)> {
        let query = Report::find()
            .filter(filter.condition())
            .order_by_desc(report::Column::CreatedAt);

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

    /// Resolve a pending report.
    ///
    /// Returns the number of rows changed; zero means the report had
    /// already been resolved.
    pub async fn resolve(
        &self,
        id: &str,
        status: ReportStatus,
        resolver_id: &str,
    ) -> AppResult<u64> {
        let result = Report::update_many()
            .col_expr(report::Column::Status, Expr::value(status))
            .col_expr(report::Column::ResolverId, Expr::value(resolver_id))
            .col_expr(
                report::Column::ProcessTime,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(report::Column::Id.eq(id))
            .filter(report::Column::Status.eq(ReportStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count reports with the given status.
    pub async fn count_by_status(&self, status: ReportStatus) -> AppResult<u64> {
        Report::find()
            .filter(report::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_report(id: &str, status: ReportStatus) -> report::Model {
        report::Model {
            id: id.to_string(),
            reporter_id: "p1".to_string(),
            target_id: "p2".to_string(),
            report_type: ReportType::User,
            reason: "spam".to_string(),
            status,
            resolver_id: None,
            process_time: None,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_empty_filter_has_no_conditions() {
        assert!(ReportFilter::default().condition().is_empty());
    }

    #[test]
    fn test_blank_keyword_is_ignored() {
        let filter = ReportFilter {
            keyword: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(filter.condition().is_empty());
    }

    #[tokio::test]
    async fn test_find_filtered_combines_conditions() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .append_query_results([[create_test_report("r1", ReportStatus::Pending)]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db.clone());
        let filter = ReportFilter {
            status: Some(ReportStatus::Pending),
            report_type: Some(ReportType::User),
            keyword: Some("spam".to_string()),
            ..Default::default()
        };
        let (items, total) = repo
            .find_filtered(&filter, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].id, "r1");

        drop(repo);
        let log = format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log());
        assert!(log.contains("%spam%"));
        assert!(log.contains("\"user\""));
    }

    #[tokio::test]
    async fn test_resolve_is_terminal() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        assert_eq!(
            repo.resolve("r1", ReportStatus::Processed, "admin")
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            repo.resolve("r1", ReportStatus::Rejected, "admin")
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_has_pending() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        assert!(
            repo.has_pending("p1", "p2", ReportType::User)
                .await
                .unwrap()
        );
    }
}
