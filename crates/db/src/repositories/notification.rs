//! Notification repository.

use std::sync::Arc;

use crate::entities::{Notification, notification};
use chrono::{DateTime, Utc};
use matrix_common::{AppError, AppResult, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, prelude::Expr,
};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<notification::Model>> {
        Notification::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new notification.
    pub async fn create(
        &self,
        model: notification::ActiveModel,
    ) -> AppResult<notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert many notifications with one statement.
    pub async fn create_many(&self, models: Vec<notification::ActiveModel>) -> AppResult<u64> {
        if models.is_empty() {
            return Ok(0);
        }

        Notification::insert_many(models)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A receiver's notifications, newest first.
    pub async fn find_for_receiver(
        &self,
        receiver_id: &str,
        unread_only: bool,
        page: PageRequest,
    ) -> AppResult<(Vec<notification::Model>, u64)> {
        let mut query =
            Notification::find().filter(notification::Column::ReceiverId.eq(receiver_id));

        if unread_only {
            query = query.filter(notification::Column::IsRead.eq(false));
        }

        let query = query.order_by_desc(notification::Column::SentTime);

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

    /// Mark the given notifications read, ignoring rows owned by others.
    pub async fn mark_as_read(&self, ids: &[String], receiver_id: &str) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .col_expr(
                notification::Column::ReadTime,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(notification::Column::Id.is_in(ids.iter().cloned()))
            .filter(notification::Column::ReceiverId.eq(receiver_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Mark every unread notification of a receiver read.
    pub async fn mark_all_as_read(&self, receiver_id: &str) -> AppResult<u64> {
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .col_expr(
                notification::Column::ReadTime,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(notification::Column::ReceiverId.eq(receiver_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Mark one read notification unread again, clearing `read_time`.
    pub async fn mark_as_unread(&self, id: &str, receiver_id: &str) -> AppResult<u64> {
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(false))
            .col_expr(
                notification::Column::ReadTime,
                Expr::value(Option::<DateTime<chrono::FixedOffset>>::None),
            )
            .filter(notification::Column::Id.eq(id))
            .filter(notification::Column::ReceiverId.eq(receiver_id))
            .filter(notification::Column::IsRead.eq(true))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count unread notifications for a receiver.
    pub async fn count_unread(&self, receiver_id: &str) -> AppResult<u64> {
        Notification::find()
            .filter(notification::Column::ReceiverId.eq(receiver_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count unread notifications across all receivers.
    pub async fn count_unread_total(&self) -> AppResult<u64> {
        Notification::find()
            .filter(notification::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Hard-delete notifications sent before `cutoff`.
    pub async fn delete_sent_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = Notification::delete_many()
            .filter(notification::Column::SentTime.lt(cutoff.fixed_offset()))
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
    use crate::entities::notification::kind;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_notification(id: &str, receiver_id: &str, is_read: bool) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            receiver_id: receiver_id.to_string(),
            sender_id: Some("p2".to_string()),
            notification_type: kind::FOLLOW,
            related_id: None,
            content: None,
            is_read,
            sent_time: Utc::now().into(),
            read_time: None,
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_find_for_receiver_unread_only() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .append_query_results([[create_test_notification("n1", "p1", false)]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let (items, total) = repo
            .find_for_receiver("p1", true, PageRequest::default())
            .await
            .unwrap();

        assert_eq!(total, 1);
        assert!(!items[0].is_read);
    }

    #[tokio::test]
    async fn test_mark_as_read_with_no_ids_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = NotificationRepository::new(db);
        assert_eq!(repo.mark_as_read(&[], "p1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_all_then_count_unread() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(4)])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        assert_eq!(repo.mark_all_as_read("p1").await.unwrap(), 4);
        assert_eq!(repo.count_unread("p1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_many_uses_single_statement() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(3)])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db.clone());
        let models = ["p1", "p2", "p3"]
            .iter()
            .enumerate()
            .map(|(i, receiver)| notification::ActiveModel {
                id: Set(format!("n{i}")),
                receiver_id: Set((*receiver).to_string()),
                sender_id: Set(None),
                notification_type: Set(kind::SYSTEM),
                related_id: Set(None),
                content: Set(Some("maintenance".to_string())),
                is_read: Set(false),
                sent_time: Set(Utc::now().into()),
                read_time: Set(None),
            })
            .collect();

        assert_eq!(repo.create_many(models).await.unwrap(), 3);

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_sent_before() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(7)])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let cutoff = Utc::now() - chrono::Duration::days(30);
        assert_eq!(repo.delete_sent_before(cutoff).await.unwrap(), 7);
    }
}
