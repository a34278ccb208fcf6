//! Person repository.

use std::sync::Arc;

use crate::entities::{Person, person};
use matrix_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Person repository for database operations.
#[derive(Clone)]
pub struct PersonRepository {
    db: Arc<DatabaseConnection>,
}

impl PersonRepository {
    /// Create a new person repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a person by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<person::Model>> {
        Person::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find several persons in one query. Missing IDs are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<person::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Person::find()
            .filter(person::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check that a person exists.
    pub async fn exists(&self, id: &str) -> AppResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// Update a person.
    pub async fn update(&self, model: person::ActiveModel) -> AppResult<person::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_person(id: &str, name: &str) -> person::Model {
        person::Model {
            id: id.to_string(),
            display_name: name.to_string(),
            bio: None,
            avatar_url: None,
            banner_url: None,
            is_private: false,
            wallet_address: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = PersonRepository::new(db);
        assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_person("p1", "Alice"),
                    create_test_person("p2", "Bob"),
                ]])
                .into_connection(),
        );

        let repo = PersonRepository::new(db);
        let persons = repo
            .find_by_ids(&["p1".to_string(), "p2".to_string()])
            .await
            .unwrap();
        assert_eq!(persons.len(), 2);
    }

    #[tokio::test]
    async fn test_exists() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_person("p1", "Alice")]])
                .append_query_results([Vec::<person::Model>::new()])
                .into_connection(),
        );

        let repo = PersonRepository::new(db);
        assert!(repo.exists("p1").await.unwrap());
        assert!(!repo.exists("p2").await.unwrap());
    }
}
