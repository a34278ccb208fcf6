//! Notification service.

use crate::services::retention_cutoff;
use chrono::Utc;
use matrix_common::{AppError, AppResult, IdGenerator, PageRequest, Paged};
use matrix_db::{
    entities::notification,
    repositories::{NotificationRepository, PersonRepository},
};
use sea_orm::Set;

/// Longest accepted system notification body, in characters.
const MAX_CONTENT_CHARS: usize = 1000;

/// Most distinct receivers one broadcast may address.
pub const MAX_BROADCAST_RECEIVERS: usize = 1000;

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    person_repo: PersonRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(
        notification_repo: NotificationRepository,
        person_repo: PersonRepository,
    ) -> Self {
        Self {
            notification_repo,
            person_repo,
            id_gen: IdGenerator::new(),
        }
    }

    fn build(
        &self,
        receiver_id: &str,
        sender_id: Option<&str>,
        notification_type: i32,
        related_id: Option<&str>,
        content: Option<&str>,
    ) -> notification::ActiveModel {
        notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            receiver_id: Set(receiver_id.to_string()),
            sender_id: Set(sender_id.map(str::to_string)),
            notification_type: Set(notification_type),
            related_id: Set(related_id.map(str::to_string)),
            content: Set(content.map(str::to_string)),
            is_read: Set(false),
            sent_time: Set(Utc::now().into()),
            read_time: Set(None),
        }
    }

    /// Send a notification with no sender.
    pub async fn send_system_notification(
        &self,
        receiver_id: &str,
        notification_type: i32,
        content: &str,
        related_id: Option<&str>,
    ) -> AppResult<notification::Model> {
        let content = validate_content(content)?;

        self.notification_repo
            .create(self.build(
                receiver_id,
                None,
                notification_type,
                related_id,
                Some(content),
            ))
            .await
    }

    /// Send a notification triggered by another person.
    ///
    /// Returns `None` when the sender is the receiver.
    pub async fn send_user_notification(
        &self,
        receiver_id: &str,
        sender_id: &str,
        notification_type: i32,
        related_id: Option<&str>,
    ) -> AppResult<Option<notification::Model>> {
        // Don't notify yourself
        if receiver_id == sender_id {
            return Ok(None);
        }

        let created = self
            .notification_repo
            .create(self.build(
                receiver_id,
                Some(sender_id),
                notification_type,
                related_id,
                None,
            ))
            .await?;

        Ok(Some(created))
    }

    /// Like [`Self::send_user_notification`], but a failure is only logged.
    ///
    /// Used after the triggering action has already been committed.
    pub async fn notify(
        &self,
        receiver_id: &str,
        sender_id: &str,
        notification_type: i32,
        related_id: Option<&str>,
    ) {
        if let Err(e) = self
            .send_user_notification(receiver_id, sender_id, notification_type, related_id)
            .await
        {
            tracing::warn!(
                error = %e,
                receiver_id = %receiver_id,
                notification_type,
                "Failed to send notification"
            );
        }
    }

    /// Send the same system notification to many receivers in one insert.
    ///
    /// Duplicate receiver IDs are sent once. Every receiver must be an
    /// existing person, otherwise nothing is sent.
    pub async fn broadcast_system_notification(
        &self,
        receiver_ids: &[String],
        notification_type: i32,
        content: &str,
        related_id: Option<&str>,
    ) -> AppResult<u64> {
        let content = validate_content(content)?;

        let mut receivers: Vec<String> = receiver_ids.to_vec();
        receivers.sort_unstable();
        receivers.dedup();

        if receivers.is_empty() || receivers.len() > MAX_BROADCAST_RECEIVERS {
            return Err(AppError::validation(
                "receiverIds",
                format!("must name 1 to {MAX_BROADCAST_RECEIVERS} receivers"),
            ));
        }

        let known = self.person_repo.find_by_ids(&receivers).await?;
        let unknown: Vec<&str> = receivers
            .iter()
            .filter(|id| !known.iter().any(|p| &p.id == *id))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(AppError::validation(
                "receiverIds",
                format!("unknown persons: {}", unknown.join(", ")),
            ));
        }

        let models = receivers
            .iter()
            .map(|receiver_id| {
                self.build(
                    receiver_id,
                    None,
                    notification_type,
                    related_id,
                    Some(content),
                )
            })
            .collect();

        let sent = self.notification_repo.create_many(models).await?;
        tracing::info!(sent, notification_type, "Broadcast system notification");
        Ok(sent)
    }

    /// A receiver's notifications, newest first.
    pub async fn get_notifications(
        &self,
        receiver_id: &str,
        unread_only: bool,
        page: PageRequest,
    ) -> AppResult<Paged<notification::Model>> {
        let (items, total) = self
            .notification_repo
            .find_for_receiver(receiver_id, unread_only, page)
            .await?;
        Ok(Paged::new(items, page, total))
    }

    /// Count unread notifications.
    pub async fn get_unread_count(&self, receiver_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(receiver_id).await
    }

    /// Mark one notification read.
    pub async fn mark_as_read(&self, id: &str, receiver_id: &str) -> AppResult<u64> {
        self.notification_repo
            .mark_as_read(&[id.to_string()], receiver_id)
            .await
    }

    /// Mark several notifications read.
    pub async fn mark_multiple_as_read(
        &self,
        ids: &[String],
        receiver_id: &str,
    ) -> AppResult<u64> {
        self.notification_repo.mark_as_read(ids, receiver_id).await
    }

    /// Mark every notification of the receiver read.
    pub async fn mark_all_as_read(&self, receiver_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(receiver_id).await
    }

    /// Mark one notification unread again.
    pub async fn mark_as_unread(&self, id: &str, receiver_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_as_unread(id, receiver_id).await
    }

    /// Delete notifications older than `days` days.
    pub async fn cleanup_old_notifications(&self, days: i64) -> AppResult<u64> {
        let cutoff = retention_cutoff(days)?;
        let deleted = self.notification_repo.delete_sent_before(cutoff).await?;

        tracing::info!(days, deleted, "Cleaned up old notifications");
        Ok(deleted)
    }
}

fn validate_content(content: &str) -> AppResult<&str> {
    let content = content.trim();
    let len = content.chars().count();
    if len == 0 || len > MAX_CONTENT_CHARS {
        return Err(AppError::validation(
            "content",
            format!("must be 1 to {MAX_CONTENT_CHARS} characters"),
        ));
    }
    Ok(content)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use matrix_db::entities::{notification::kind, person};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_notification(id: &str, receiver_id: &str) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            receiver_id: receiver_id.to_string(),
            sender_id: None,
            notification_type: kind::SYSTEM,
            related_id: None,
            content: Some("hello".to_string()),
            is_read: false,
            sent_time: Utc::now().into(),
            read_time: None,
        }
    }

    fn create_test_person(id: &str) -> person::Model {
        person::Model {
            id: id.to_string(),
            display_name: id.to_uppercase(),
            bio: None,
            avatar_url: None,
            banner_url: None,
            is_private: false,
            wallet_address: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service_with_persons(db: MockDatabase, person_db: MockDatabase) -> NotificationService {
        NotificationService::new(
            NotificationRepository::new(Arc::new(db.into_connection())),
            PersonRepository::new(Arc::new(person_db.into_connection())),
        )
    }

    fn service(db: MockDatabase) -> NotificationService {
        service_with_persons(db, MockDatabase::new(DatabaseBackend::Postgres))
    }

    #[tokio::test]
    async fn test_self_notification_is_skipped() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .send_user_notification("p1", "p1", kind::FOLLOW, None)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_send_system_notification() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_notification("n1", "p1")]]),
        );

        let created = service
            .send_system_notification("p1", kind::SYSTEM, "  hello  ", None)
            .await
            .unwrap();
        assert!(created.sender_id.is_none());
    }

    #[tokio::test]
    async fn test_empty_system_content_rejected() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .send_system_notification("p1", kind::SYSTEM, "   ", None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_cleanup_requires_positive_days() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        assert!(service.cleanup_old_notifications(0).await.is_err());
        assert!(service.cleanup_old_notifications(-3).await.is_err());
    }

    #[tokio::test]
    async fn test_cleanup_rejects_oversized_window() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.cleanup_old_notifications(1_000_000_000).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_cleanup_old_notifications() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 9,
            },
        ]));

        assert_eq!(service.cleanup_old_notifications(30).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_broadcast_dedupes_receivers() {
        let service = service_with_persons(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_person("p1"), create_test_person("p2")]]),
        );

        let receivers = vec!["p1".to_string(), "p2".to_string(), "p1".to_string()];
        let sent = service
            .broadcast_system_notification(&receivers, kind::SYSTEM, "maintenance", None)
            .await
            .unwrap();
        assert_eq!(sent, 2);
    }

    #[tokio::test]
    async fn test_broadcast_rejects_unknown_receivers() {
        // No notification results: an insert attempt would fail the test
        let service = service_with_persons(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_person("p1")]]),
        );

        let receivers = vec!["p1".to_string(), "ghost".to_string()];
        let result = service
            .broadcast_system_notification(&receivers, kind::SYSTEM, "maintenance", None)
            .await;

        assert!(matches!(
            &result,
            Err(AppError::Validation(fields)) if fields["receiverIds"][0].contains("ghost")
        ));
    }

    #[tokio::test]
    async fn test_broadcast_caps_receivers() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let receivers: Vec<String> = (0..=MAX_BROADCAST_RECEIVERS)
            .map(|n| format!("p{n}"))
            .collect();
        let result = service
            .broadcast_system_notification(&receivers, kind::SYSTEM, "maintenance", None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = service
            .broadcast_system_notification(&[], kind::SYSTEM, "maintenance", None)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_mark_all_then_unread_count_is_zero() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 5,
                }])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]]),
        );

        assert_eq!(service.mark_all_as_read("p1").await.unwrap(), 5);
        assert_eq!(service.get_unread_count("p1").await.unwrap(), 0);
    }
}
