//! Direct messaging service.

use crate::services::notification::NotificationService;
use chrono::Utc;
use matrix_common::{AppError, AppResult, IdGenerator, PageRequest, Paged};
use matrix_db::{
    entities::{message, notification::kind},
    repositories::{MessageRepository, PersonRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

const MAX_CONTENT_CHARS: usize = 2000;

/// Input for sending a message.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageInput {
    #[validate(length(min = 1, max = 64))]
    pub receiver_id: String,
    pub content: String,
}

/// Messaging service for business logic.
#[derive(Clone)]
pub struct MessagingService {
    message_repo: MessageRepository,
    person_repo: PersonRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub const fn new(
        message_repo: MessageRepository,
        person_repo: PersonRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            message_repo,
            person_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Send a message to another person.
    pub async fn send_message(
        &self,
        sender_id: &str,
        input: SendMessageInput,
    ) -> AppResult<message::Model> {
        input.validate()?;

        let content = input.content.trim();
        let len = content.chars().count();
        if len == 0 || len > MAX_CONTENT_CHARS {
            return Err(AppError::validation(
                "content",
                format!("must be 1 to {MAX_CONTENT_CHARS} characters"),
            ));
        }

        if input.receiver_id == sender_id {
            return Err(AppError::BadRequest(
                "Cannot send a message to yourself".to_string(),
            ));
        }

        if !self.person_repo.exists(&input.receiver_id).await? {
            return Err(AppError::NotFound(format!(
                "Person {} not found",
                input.receiver_id
            )));
        }

        let model = message::ActiveModel {
            id: Set(self.id_gen.generate()),
            sender_id: Set(sender_id.to_string()),
            receiver_id: Set(input.receiver_id.clone()),
            content: Set(content.to_string()),
            is_read: Set(false),
            sent_time: Set(Utc::now().into()),
            read_time: Set(None),
        };

        let created = self.message_repo.create(model).await?;

        tracing::debug!(message_id = %created.id, sender_id = %sender_id, "Message sent");

        self.notification_service
            .notify(&input.receiver_id, sender_id, kind::MESSAGE, Some(&created.id))
            .await;

        Ok(created)
    }

    /// Messages between two persons, newest first.
    pub async fn get_conversation(
        &self,
        person_id: &str,
        other_id: &str,
        page: PageRequest,
    ) -> AppResult<Paged<message::Model>> {
        let (items, total) = self
            .message_repo
            .find_conversation(person_id, other_id, page)
            .await?;
        Ok(Paged::new(items, page, total))
    }

    /// Mark everything `other_id` sent to `reader_id` as read.
    pub async fn mark_conversation_read(&self, reader_id: &str, other_id: &str) -> AppResult<u64> {
        self.message_repo
            .mark_conversation_read(reader_id, other_id)
            .await
    }

    pub async fn unread_count(&self, person_id: &str) -> AppResult<u64> {
        self.message_repo.count_unread(person_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use matrix_db::{
        entities::{notification, person},
        repositories::NotificationRepository,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_message() -> message::Model {
        message::Model {
            id: "m1".to_string(),
            sender_id: "p1".to_string(),
            receiver_id: "p2".to_string(),
            content: "hi".to_string(),
            is_read: false,
            sent_time: Utc::now().into(),
            read_time: None,
        }
    }

    fn create_test_person(id: &str) -> person::Model {
        person::Model {
            id: id.to_string(),
            display_name: id.to_string(),
            bio: None,
            avatar_url: None,
            banner_url: None,
            is_private: false,
            wallet_address: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_notification() -> notification::Model {
        notification::Model {
            id: "n1".to_string(),
            receiver_id: "p2".to_string(),
            sender_id: Some("p1".to_string()),
            notification_type: kind::MESSAGE,
            related_id: Some("m1".to_string()),
            content: None,
            is_read: false,
            sent_time: Utc::now().into(),
            read_time: None,
        }
    }

    fn service(message_db: MockDatabase, person_db: MockDatabase, notif_db: MockDatabase) -> MessagingService {
        MessagingService::new(
            MessageRepository::new(Arc::new(message_db.into_connection())),
            PersonRepository::new(Arc::new(person_db.into_connection())),
            NotificationService::new(
                NotificationRepository::new(Arc::new(notif_db.into_connection())),
                PersonRepository::new(Arc::new(
                    MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
                )),
            ),
        )
    }

    fn input(receiver: &str, content: &str) -> SendMessageInput {
        SendMessageInput {
            receiver_id: receiver.to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_cannot_message_self() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.send_message("p1", input("p1", "hi")).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_content_length() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.send_message("p1", input("p2", "  ")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = service
            .send_message("p1", input("p2", &"x".repeat(2001)))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_send_message() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_message()]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_person("p2")]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_notification()]]),
        );

        let sent = service.send_message("p1", input("p2", "hi")).await.unwrap();
        assert_eq!(sent.receiver_id, "p2");
        assert!(!sent.is_read);
    }

    #[tokio::test]
    async fn test_send_to_missing_person() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<person::Model>::new()]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.send_message("p1", input("ghost", "hi")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
