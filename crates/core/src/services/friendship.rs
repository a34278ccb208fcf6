//! Friendship service.

use crate::services::notification::NotificationService;
use chrono::Utc;
use matrix_common::{AppError, AppResult, IdGenerator, PageRequest, Paged};
use matrix_db::{
    entities::{
        friendship::{self, FriendshipStatus},
        notification::kind,
    },
    repositories::{FriendshipRepository, PersonRepository},
};
use sea_orm::Set;
use serde::Serialize;

/// Relationship between the viewer and another person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendshipStatusView {
    pub are_friends: bool,
    /// Status of the row between the two, if any.
    pub status: Option<FriendshipStatus>,
    pub request_id: Option<String>,
    /// Whether the viewer sent the request.
    pub outgoing: bool,
}

/// Friendship service for business logic.
#[derive(Clone)]
pub struct FriendshipService {
    friendship_repo: FriendshipRepository,
    person_repo: PersonRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl FriendshipService {
    /// Create a new friendship service.
    #[must_use]
    pub const fn new(
        friendship_repo: FriendshipRepository,
        person_repo: PersonRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            friendship_repo,
            person_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Send a friend request.
    pub async fn send_friend_request(
        &self,
        sender_id: &str,
        receiver_id: &str,
    ) -> AppResult<friendship::Model> {
        if sender_id == receiver_id {
            return Err(AppError::BadRequest(
                "Cannot send a friend request to yourself".to_string(),
            ));
        }

        if !self.person_repo.exists(receiver_id).await? {
            return Err(AppError::NotFound(format!("Person {receiver_id} not found")));
        }

        // One row per pair, whichever side asked first
        if self
            .friendship_repo
            .find_between(sender_id, receiver_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "A friend request already exists between these persons".to_string(),
            ));
        }

        let model = friendship::ActiveModel {
            id: Set(self.id_gen.generate()),
            requester_id: Set(sender_id.to_string()),
            addressee_id: Set(receiver_id.to_string()),
            status: Set(FriendshipStatus::Pending),
            request_date: Set(Utc::now().into()),
            response_date: Set(None),
        };

        let request = self.friendship_repo.create(model).await?;

        tracing::info!(
            request_id = %request.id,
            requester_id = %sender_id,
            addressee_id = %receiver_id,
            "Sent friend request"
        );

        self.notification_service
            .notify(receiver_id, sender_id, kind::FRIEND_REQUEST, Some(&request.id))
            .await;

        Ok(request)
    }

    /// Accept a pending request addressed to `acting_id`.
    pub async fn accept_friend_request(
        &self,
        request_id: &str,
        acting_id: &str,
    ) -> AppResult<friendship::Model> {
        let accepted = self
            .respond(request_id, acting_id, FriendshipStatus::Accepted)
            .await?;

        self.notification_service
            .notify(
                &accepted.requester_id,
                acting_id,
                kind::FRIEND_ACCEPTED,
                Some(&accepted.id),
            )
            .await;

        Ok(accepted)
    }

    /// Reject a pending request addressed to `acting_id`.
    pub async fn reject_friend_request(
        &self,
        request_id: &str,
        acting_id: &str,
    ) -> AppResult<friendship::Model> {
        self.respond(request_id, acting_id, FriendshipStatus::Rejected)
            .await
    }

    async fn respond(
        &self,
        request_id: &str,
        acting_id: &str,
        status: FriendshipStatus,
    ) -> AppResult<friendship::Model> {
        let request = self
            .friendship_repo
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Friend request {request_id} not found")))?;

        if request.addressee_id != acting_id {
            return Err(AppError::Forbidden(
                "Only the addressee can respond to a friend request".to_string(),
            ));
        }

        if request.status != FriendshipStatus::Pending {
            return Err(AppError::BadRequest(
                "Friend request is no longer pending".to_string(),
            ));
        }

        // Lost a race with another response
        if self.friendship_repo.respond(request_id, status).await? == 0 {
            return Err(AppError::BadRequest(
                "Friend request is no longer pending".to_string(),
            ));
        }

        tracing::info!(request_id = %request_id, status = ?status, "Responded to friend request");

        Ok(friendship::Model {
            status,
            response_date: Some(Utc::now().into()),
            ..request
        })
    }

    /// Whether the two persons are friends, in either direction.
    pub async fn are_friends(&self, a: &str, b: &str) -> AppResult<bool> {
        Ok(self
            .friendship_repo
            .find_accepted_between(a, b)
            .await?
            .is_some())
    }

    /// Relationship summary between `viewer_id` and `other_id`.
    pub async fn get_status(&self, viewer_id: &str, other_id: &str) -> AppResult<FriendshipStatusView> {
        let row = self.friendship_repo.find_between(viewer_id, other_id).await?;

        Ok(match row {
            Some(row) => FriendshipStatusView {
                are_friends: row.status == FriendshipStatus::Accepted,
                status: Some(row.status),
                outgoing: row.requester_id == viewer_id,
                request_id: Some(row.id),
            },
            None => FriendshipStatusView {
                are_friends: false,
                status: None,
                request_id: None,
                outgoing: false,
            },
        })
    }

    /// Incoming pending requests, newest first.
    pub async fn get_pending_requests(
        &self,
        person_id: &str,
        page: PageRequest,
    ) -> AppResult<Paged<friendship::Model>> {
        let (items, total) = self
            .friendship_repo
            .find_pending_for(person_id, page)
            .await?;
        Ok(Paged::new(items, page, total))
    }

    /// Friends of `person_id` as person IDs, most recently accepted first.
    pub async fn get_friends(&self, person_id: &str, page: PageRequest) -> AppResult<Paged<String>> {
        let (items, total) = self.friendship_repo.find_friends(person_id, page).await?;
        Ok(Paged::new(items, page, total).map(|f| f.other_party(person_id).to_string()))
    }

    /// End an accepted friendship, or clear a rejected request so either
    /// side may ask again.
    pub async fn remove_friend(&self, person_id: &str, friend_id: &str) -> AppResult<()> {
        let removed = self
            .friendship_repo
            .delete_settled_between(person_id, friend_id)
            .await?;

        if removed == 0 {
            return Err(AppError::NotFound("Friendship not found".to_string()));
        }

        tracing::info!(person_id = %person_id, friend_id = %friend_id, "Removed friend");
        Ok(())
    }
}
