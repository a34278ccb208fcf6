//! Friendship repository.
//!
//! A friendship row is directed (requester → addressee), so every lookup
//! by pair checks both directions.

use std::sync::Arc;

use crate::entities::{
    Friendship,
    friendship::{self, FriendshipStatus},
};
use matrix_common::{AppError, AppResult, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, prelude::Expr,
};

/// Friendship repository for database operations.
#[derive(Clone)]
pub struct FriendshipRepository {
    db: Arc<DatabaseConnection>,
}

/// Matches the pair `(a, b)` in either direction.
fn either_direction(a: &str, b: &str) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(friendship::Column::RequesterId.eq(a))
                .add(friendship::Column::AddresseeId.eq(b)),
        )
        .add(
            Condition::all()
                .add(friendship::Column::RequesterId.eq(b))
                .add(friendship::Column::AddresseeId.eq(a)),
        )
}

impl FriendshipRepository {
    /// Create a new friendship repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a friendship row by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<friendship::Model>> {
        Friendship::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find any row between two persons, whatever its status or direction.
    pub async fn find_between(&self, a: &str, b: &str) -> AppResult<Option<friendship::Model>> {
        Friendship::find()
            .filter(either_direction(a, b))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the accepted row between two persons.
    pub async fn find_accepted_between(
        &self,
        a: &str,
        b: &str,
    ) -> AppResult<Option<friendship::Model>> {
        Friendship::find()
            .filter(either_direction(a, b))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Accepted))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new friendship request.
    pub async fn create(&self, model: friendship::ActiveModel) -> AppResult<friendship::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move a pending request to `status`, stamping the response date.
    ///
    /// Returns the number of rows changed; zero means the request was no
    /// longer pending.
    pub async fn respond(&self, id: &str, status: FriendshipStatus) -> AppResult<u64> {
        let result = Friendship::update_many()
            .col_expr(friendship::Column::Status, Expr::value(status))
            .col_expr(
                friendship::Column::ResponseDate,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(friendship::Column::Id.eq(id))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Incoming pending requests, newest first.
    pub async fn find_pending_for(
        &self,
        addressee_id: &str,
        page: PageRequest,
    ) -> AppResult<(Vec<friendship::Model>, u64)> {
        let query = Friendship::find()
            .filter(friendship::Column::AddresseeId.eq(addressee_id))
            .filter(friendship::Column::Status.eq(FriendshipStatus::Pending))
            .order_by_desc(friendship::Column::RequestDate);

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

    /// Accepted friendships on either side, most recently accepted first.
    pub async fn find_friends(
        &self,
        person_id: &str,
        page: PageRequest,
    ) -> AppResult<(Vec<friendship::Model>, u64)> {
        let query = Friendship::find()
            .filter(
                Condition::any()
                    .add(friendship::Column::RequesterId.eq(person_id))
                    .add(friendship::Column::AddresseeId.eq(person_id)),
            )
            .filter(friendship::Column::Status.eq(FriendshipStatus::Accepted))
            .order_by_desc(friendship::Column::ResponseDate);

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

    /// Delete an accepted or rejected row between two persons. Pending
    /// requests are left to the addressee.
    pub async fn delete_settled_between(&self, a: &str, b: &str) -> AppResult<u64> {
        let result = Friendship::delete_many()
            .filter(either_direction(a, b))
            .filter(
                friendship::Column::Status
                    .is_in([FriendshipStatus::Accepted, FriendshipStatus::Rejected]),
            )
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
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_friendship(
        id: &str,
        requester_id: &str,
        addressee_id: &str,
        status: FriendshipStatus,
    ) -> friendship::Model {
        friendship::Model {
            id: id.to_string(),
            requester_id: requester_id.to_string(),
            addressee_id: addressee_id.to_string(),
            status,
            request_date: Utc::now().into(),
            response_date: None,
        }
    }

    #[tokio::test]
    async fn test_find_between_matches_reverse_direction() {
        let row = create_test_friendship("fr1", "p2", "p1", FriendshipStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[row]])
                .into_connection(),
        );

        let repo = FriendshipRepository::new(db);
        let found = repo.find_between("p1", "p2").await.unwrap().unwrap();
        assert_eq!(found.requester_id, "p2");
        assert_eq!(found.other_party("p1"), "p2");
    }

    #[tokio::test]
    async fn test_respond_only_affects_pending() {
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

        let repo = FriendshipRepository::new(db);
        assert_eq!(
            repo.respond("fr1", FriendshipStatus::Accepted).await.unwrap(),
            1
        );
        assert_eq!(
            repo.respond("fr1", FriendshipStatus::Rejected).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_find_friends() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .append_query_results([[
                    create_test_friendship("fr1", "p1", "p2", FriendshipStatus::Accepted),
                    create_test_friendship("fr2", "p3", "p1", FriendshipStatus::Accepted),
                ]])
                .into_connection(),
        );

        let repo = FriendshipRepository::new(db);
        let (items, total) = repo
            .find_friends("p1", PageRequest::default())
            .await
            .unwrap();

        assert_eq!(total, 2);
        let friends: Vec<&str> = items.iter().map(|f| f.other_party("p1")).collect();
        assert_eq!(friends, vec!["p2", "p3"]);
    }
}
