//! Follow repository.

use std::sync::Arc;

use crate::entities::{Follow, follow};
use matrix_common::{AppError, AppResult, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the edge from `follower_id` to `followed_id`.
    pub async fn find_by_pair(
        &self,
        follower_id: &str,
        followed_id: &str,
        follow_type: i32,
    ) -> AppResult<Option<follow::Model>> {
        Follow::find()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowedId.eq(followed_id))
            .filter(follow::Column::FollowType.eq(follow_type))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if `follower_id` follows `followed_id`.
    pub async fn is_following(
        &self,
        follower_id: &str,
        followed_id: &str,
        follow_type: i32,
    ) -> AppResult<bool> {
        Ok(self
            .find_by_pair(follower_id, followed_id, follow_type)
            .await?
            .is_some())
    }

    /// Create a new follow edge.
    pub async fn create(&self, model: follow::ActiveModel) -> AppResult<follow::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete the edge between a pair, returning the number of rows removed.
    pub async fn delete_by_pair(
        &self,
        follower_id: &str,
        followed_id: &str,
        follow_type: i32,
    ) -> AppResult<u64> {
        let result = Follow::delete_many()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowedId.eq(followed_id))
            .filter(follow::Column::FollowType.eq(follow_type))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Edges pointing at `person_id`, newest first.
    pub async fn find_followers(
        &self,
        person_id: &str,
        follow_type: i32,
        page: PageRequest,
    ) -> AppResult<(Vec<follow::Model>, u64)> {
        let query = Follow::find()
            .filter(follow::Column::FollowedId.eq(person_id))
            .filter(follow::Column::FollowType.eq(follow_type))
            .order_by_desc(follow::Column::CreatedAt);

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

    /// Edges starting at `person_id`, newest first.
    pub async fn find_following(
        &self,
        person_id: &str,
        follow_type: i32,
        page: PageRequest,
    ) -> AppResult<(Vec<follow::Model>, u64)> {
        let query = Follow::find()
            .filter(follow::Column::FollowerId.eq(person_id))
            .filter(follow::Column::FollowType.eq(follow_type))
            .order_by_desc(follow::Column::CreatedAt);

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

    /// Count followers of a person.
    pub async fn count_followers(&self, person_id: &str, follow_type: i32) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::FollowedId.eq(person_id))
            .filter(follow::Column::FollowType.eq(follow_type))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count persons followed by a person.
    pub async fn count_following(&self, person_id: &str, follow_type: i32) -> AppResult<u64> {
        Follow::find()
            .filter(follow::Column::FollowerId.eq(person_id))
            .filter(follow::Column::FollowType.eq(follow_type))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
