//! Follow service.

use crate::services::notification::NotificationService;
use chrono::Utc;
use matrix_common::{AppError, AppResult, IdGenerator, PageRequest, Paged};
use matrix_db::{
    entities::{
        follow::{self, FOLLOW_TYPE_PERSON},
        notification::kind,
    },
    repositories::{FollowRepository, PersonRepository},
};
use sea_orm::Set;

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    person_repo: PersonRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub const fn new(
        follow_repo: FollowRepository,
        person_repo: PersonRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            follow_repo,
            person_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Follow a person.
    ///
    /// Following someone already followed returns the existing edge and
    /// sends no second notification.
    pub async fn follow_user(&self, follower_id: &str, followed_id: &str) -> AppResult<follow::Model> {
        // Can't follow yourself
        if follower_id == followed_id {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }

        if let Some(existing) = self
            .follow_repo
            .find_by_pair(follower_id, followed_id, FOLLOW_TYPE_PERSON)
            .await?
        {
            return Ok(existing);
        }

        if !self.person_repo.exists(follower_id).await? {
            return Err(AppError::NotFound(format!("Person {follower_id} not found")));
        }
        if !self.person_repo.exists(followed_id).await? {
            return Err(AppError::NotFound(format!("Person {followed_id} not found")));
        }

        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            follower_id: Set(follower_id.to_string()),
            followed_id: Set(followed_id.to_string()),
            follow_type: Set(FOLLOW_TYPE_PERSON),
            created_at: Set(Utc::now().into()),
        };

        let created = self.follow_repo.create(model).await?;

        tracing::info!(follower_id = %follower_id, followed_id = %followed_id, "Followed person");

        self.notification_service
            .notify(followed_id, follower_id, kind::FOLLOW, Some(follower_id))
            .await;

        Ok(created)
    }

    /// Remove a follow edge. Succeeds when there was none.
    pub async fn unfollow_user(&self, follower_id: &str, followed_id: &str) -> AppResult<()> {
        let removed = self
            .follow_repo
            .delete_by_pair(follower_id, followed_id, FOLLOW_TYPE_PERSON)
            .await?;

        if removed > 0 {
            tracing::info!(follower_id = %follower_id, followed_id = %followed_id, "Unfollowed person");
        }
        Ok(())
    }

    /// Check whether `follower_id` follows `followed_id`.
    pub async fn is_following(&self, follower_id: &str, followed_id: &str) -> AppResult<bool> {
        self.follow_repo
            .is_following(follower_id, followed_id, FOLLOW_TYPE_PERSON)
            .await
    }

    /// People following `person_id`, as person IDs.
    pub async fn get_followers(
        &self,
        person_id: &str,
        page: PageRequest,
    ) -> AppResult<Paged<String>> {
        let (items, total) = self
            .follow_repo
            .find_followers(person_id, FOLLOW_TYPE_PERSON, page)
            .await?;
        Ok(Paged::new(items, page, total).map(|f| f.follower_id))
    }

    /// People `person_id` follows, as person IDs.
    pub async fn get_following(
        &self,
        person_id: &str,
        page: PageRequest,
    ) -> AppResult<Paged<String>> {
        let (items, total) = self
            .follow_repo
            .find_following(person_id, FOLLOW_TYPE_PERSON, page)
            .await?;
        Ok(Paged::new(items, page, total).map(|f| f.followed_id))
    }

    /// Number of persons following `person_id`.
    pub async fn count_followers(&self, person_id: &str) -> AppResult<u64> {
        self.follow_repo
            .count_followers(person_id, FOLLOW_TYPE_PERSON)
            .await
    }

    /// Number of persons `person_id` follows.
    pub async fn count_following(&self, person_id: &str) -> AppResult<u64> {
        self.follow_repo
            .count_following(person_id, FOLLOW_TYPE_PERSON)
            .await
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_follow(follower_id: &str, followed_id: &str) -> follow::Model {
        follow::Model {
            id: format!("{follower_id}-{followed_id}"),
            follower_id: follower_id.to_string(),
            followed_id: followed_id.to_string(),
            follow_type: FOLLOW_TYPE_PERSON,
            created_at: Utc::now().into(),
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

    fn create_test_notification() -> notification::Model {
        notification::Model {
            id: "n1".to_string(),
            receiver_id: "p2".to_string(),
            sender_id: Some("p1".to_string()),
            notification_type: kind::FOLLOW,
            related_id: Some("p1".to_string()),
            content: None,
            is_read: false,
            sent_time: Utc::now().into(),
            read_time: None,
        }
    }

    fn service(follow_db: MockDatabase, person_db: MockDatabase, notif_db: MockDatabase) -> FollowService {
        FollowService::new(
            FollowRepository::new(Arc::new(follow_db.into_connection())),
            PersonRepository::new(Arc::new(person_db.into_connection())),
            NotificationService::new(
                NotificationRepository::new(Arc::new(notif_db.into_connection())),
                PersonRepository::new(Arc::new(
                    MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
                )),
            ),
        )
    }

    #[tokio::test]
    async fn test_cannot_follow_self() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.follow_user("p1", "p1").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_follow_creates_edge() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<follow::Model>::new()])
                .append_query_results([[create_test_follow("p1", "p2")]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_person("p1")]])
                .append_query_results([[create_test_person("p2")]]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_notification()]]),
        );

        let edge = service.follow_user("p1", "p2").await.unwrap();
        assert_eq!(edge.follower_id, "p1");
        assert_eq!(edge.followed_id, "p2");
    }

    #[tokio::test]
    async fn test_follow_is_idempotent() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_follow("p1", "p2")]]),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let edge = service.follow_user("p1", "p2").await.unwrap();
        assert_eq!(edge.id, "p1-p2");
    }

    #[tokio::test]
    async fn test_follow_missing_person() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<follow::Model>::new()]),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_person("p1")]])
                .append_query_results([Vec::<person::Model>::new()]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.follow_user("p1", "ghost").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unfollow_when_absent_succeeds() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }]),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        assert!(service.unfollow_user("p1", "p2").await.is_ok());
    }

    #[tokio::test]
    async fn test_get_followers_maps_to_person_ids() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .append_query_results([[
                    create_test_follow("p3", "p1"),
                    create_test_follow("p2", "p1"),
                ]]),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let page = service
            .get_followers("p1", PageRequest::new(1, 20))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items, vec!["p3".to_string(), "p2".to_string()]);
    }
}
