//! Hashtag repository.

use std::sync::Arc;

use crate::entities::{Hashtag, hashtag};
use matrix_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Hashtag repository for database operations.
#[derive(Clone)]
pub struct HashtagRepository {
    db: Arc<DatabaseConnection>,
}

impl HashtagRepository {
    /// Create a new hashtag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find hashtags by ID. Missing IDs are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<hashtag::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Hashtag::find()
            .filter(hashtag::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a hashtag by its normalized name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<hashtag::Model>> {
        Hashtag::find()
            .filter(hashtag::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Hashtags whose name starts with `prefix`, most used first.
    pub async fn search_prefix(&self, prefix: &str, limit: u64) -> AppResult<Vec<hashtag::Model>> {
        Hashtag::find()
            .filter(hashtag::Column::Name.starts_with(prefix))
            .order_by_desc(hashtag::Column::UsageCount)
            .order_by_asc(hashtag::Column::Name)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most used hashtags.
    pub async fn find_trending(&self, limit: u64) -> AppResult<Vec<hashtag::Model>> {
        Hashtag::find()
            .filter(hashtag::Column::UsageCount.gt(0))
            .order_by_desc(hashtag::Column::UsageCount)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new hashtag.
    pub async fn create(&self, model: hashtag::ActiveModel) -> AppResult<hashtag::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
