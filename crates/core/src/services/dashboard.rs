//! Admin dashboard statistics.

use matrix_common::AppResult;
use matrix_db::{
    entities::report::ReportStatus,
    repositories::{ArticleRepository, NotificationRepository, ReportRepository, UserRepository},
};
use serde::Serialize;

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_articles: u64,
    pub pending_reports: u64,
    pub unread_notifications: u64,
}

/// Dashboard service.
#[derive(Clone)]
pub struct DashboardService {
    user_repo: UserRepository,
    article_repo: ArticleRepository,
    report_repo: ReportRepository,
    notification_repo: NotificationRepository,
}

impl DashboardService {
    /// Create a new dashboard service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        article_repo: ArticleRepository,
        report_repo: ReportRepository,
        notification_repo: NotificationRepository,
    ) -> Self {
        Self {
            user_repo,
            article_repo,
            report_repo,
            notification_repo,
        }
    }

    pub async fn get_stats(&self) -> AppResult<DashboardStats> {
        let (total_users, total_articles, pending_reports, unread_notifications) = tokio::try_join!(
            self.user_repo.count(),
            self.article_repo.count(),
            self.report_repo.count_by_status(ReportStatus::Pending),
            self.notification_repo.count_unread_total(),
        )?;

        Ok(DashboardStats {
            total_users,
            total_articles,
            pending_reports,
            unread_notifications,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn counting(n: i64) -> Arc<sea_orm::DatabaseConnection> {
        Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(n))
                }]])
                .into_connection(),
        )
    }

    #[tokio::test]
    async fn test_get_stats() {
        let service = DashboardService::new(
            UserRepository::new(counting(10)),
            ArticleRepository::new(counting(42)),
            ReportRepository::new(counting(3)),
            NotificationRepository::new(counting(7)),
        );

        let stats = service.get_stats().await.unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                total_users: 10,
                total_articles: 42,
                pending_reports: 3,
                unread_notifications: 7,
            }
        );
    }
}
