//! Direct message repository.

use std::sync::Arc;

use crate::entities::{Message, message};
use chrono::Utc;
use matrix_common::{AppError, AppResult, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, prelude::Expr,
};

/// Message repository for database operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new message.
    pub async fn create(&self, model: message::ActiveModel) -> AppResult<message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Messages exchanged between two persons, newest first.
    pub async fn find_conversation(
        &self,
        a: &str,
        b: &str,
        page: PageRequest,
    ) -> AppResult<(Vec<message::Model>, u64)> {
        let query = Message::find()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(message::Column::SenderId.eq(a))
                            .add(message::Column::ReceiverId.eq(b)),
                    )
                    .add(
                        Condition::all()
                            .add(message::Column::SenderId.eq(b))
                            .add(message::Column::ReceiverId.eq(a)),
                    ),
            )
            .order_by_desc(message::Column::SentTime);

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

    /// Mark everything `other_id` sent to `reader_id` as read.
    pub async fn mark_conversation_read(&self, reader_id: &str, other_id: &str) -> AppResult<u64> {
        let result = Message::update_many()
            .col_expr(message::Column::IsRead, Expr::value(true))
            .col_expr(
                message::Column::ReadTime,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(message::Column::ReceiverId.eq(reader_id))
            .filter(message::Column::SenderId.eq(other_id))
            .filter(message::Column::IsRead.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count unread messages for a receiver.
    pub async fn count_unread(&self, receiver_id: &str) -> AppResult<u64> {
        Message::find()
            .filter(message::Column::ReceiverId.eq(receiver_id))
            .filter(message::Column::IsRead.eq(false))
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

    fn create_test_message(id: &str, sender_id: &str, receiver_id: &str) -> message::Model {
        message::Model {
            id: id.to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            content: "hi".to_string(),
            is_read: false,
            sent_time: Utc::now().into(),
            read_time: None,
        }
    }

    #[tokio::test]
    async fn test_find_conversation_both_directions() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .append_query_results([[
                    create_test_message("m2", "p2", "p1"),
                    create_test_message("m1", "p1", "p2"),
                ]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let (items, total) = repo
            .find_conversation("p1", "p2", PageRequest::default())
            .await
            .unwrap();

        assert_eq!(total, 2);
        assert_eq!(items[0].sender_id, "p2");
        assert_eq!(items[1].sender_id, "p1");
    }

    #[tokio::test]
    async fn test_mark_conversation_read() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        assert_eq!(repo.mark_conversation_read("p1", "p2").await.unwrap(), 3);
    }
}
