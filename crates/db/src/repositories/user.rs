//! User repository.

use std::sync::Arc;

use crate::entities::{User, person, user};
use matrix_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    TransactionTrait, prelude::Expr,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the user owning a person.
    pub async fn find_by_person_id(&self, person_id: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::PersonId.eq(person_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::UsernameLower.eq(username.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by the identifier typed into the login form.
    ///
    /// Anything containing `@` is treated as an email address.
    pub async fn find_by_login(&self, identifier: &str) -> AppResult<Option<user::Model>> {
        let identifier = identifier.trim();
        if identifier.contains('@') {
            self.find_by_email(identifier).await
        } else {
            self.find_by_username(identifier).await
        }
    }

    /// Find a user by their Google account subject.
    pub async fn find_by_google_subject(&self, subject: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::GoogleSubject.eq(subject))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a person and its user in one transaction.
    pub async fn create_with_person(
        &self,
        person: person::ActiveModel,
        user: user::ActiveModel,
    ) -> AppResult<(person::Model, user::Model)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let person = person
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let user = user
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((person, user))
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Stamp `last_login_at` (single UPDATE query, no fetch).
    pub async fn touch_last_login(&self, id: &str) -> AppResult<()> {
        User::update_many()
            .col_expr(
                user::Column::LastLoginAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(user::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count all users.
    pub async fn count(&self) -> AppResult<u64> {
        User::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::user::UserRole;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_user(id: &str, person_id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            person_id: person_id.to_string(),
            email: format!("{}@example.com", username.to_lowercase()),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            password_hash: Some("hash".to_string()),
            google_subject: None,
            role: UserRole::User,
            is_active: true,
            created_at: Utc::now().into(),
            last_login_at: None,
        }
    }

    fn create_test_person(id: &str) -> person::Model {
        person::Model {
            id: id.to_string(),
            display_name: "Alice".to_string(),
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
    async fn test_find_by_login_with_username() {
        let user = create_test_user("u1", "p1", "Alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db.clone());
        let found = repo.find_by_login("ALICE").await.unwrap().unwrap();
        assert_eq!(found.id, "u1");

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert!(format!("{log:?}").contains("\"alice\""));
    }

    #[tokio::test]
    async fn test_find_by_login_with_email() {
        let user = create_test_user("u1", "p1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let repo = UserRepository::new(db.clone());
        let found = repo.find_by_login(" Alice@Example.com ").await.unwrap();
        assert!(found.is_some());

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert!(format!("{log:?}").contains("alice@example.com"));
    }

    #[tokio::test]
    async fn test_find_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_with_person_inserts_both() {
        let person = create_test_person("p1");
        let user = create_test_user("u1", "p1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[person.clone()]])
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let (created_person, created_user) = repo
            .create_with_person(
                person::ActiveModel {
                    id: Set("p1".to_string()),
                    display_name: Set("Alice".to_string()),
                    ..Default::default()
                },
                user::ActiveModel {
                    id: Set("u1".to_string()),
                    person_id: Set("p1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(created_person.id, "p1");
        assert_eq!(created_user.person_id, created_person.id);
    }

    #[tokio::test]
    async fn test_touch_last_login() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        assert!(repo.touch_last_login("u1").await.is_ok());
    }

    #[tokio::test]
    async fn test_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(12))
                }]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        assert_eq!(repo.count().await.unwrap(), 12);
    }
}
