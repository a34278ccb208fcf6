//! Helpers for tests that run against a live `PostgreSQL`.
//!
//! Connection settings come from `TEST_DB_*` environment variables so the
//! same tests run locally and in CI.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Set,
    Statement,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::{entities::person, migrations::Migrator};

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "matrix_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "matrix_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "matrix_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Connection URL for the test database.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    pub conn: Arc<DatabaseConnection>,
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect with the default configuration and run all migrations.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with a custom configuration and run all migrations.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to migrated test database");

        Ok(Self {
            conn: Arc::new(conn),
            config,
        })
    }

    /// Shared connection handle, as the repositories take it.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Truncate every application table, keeping the migration history.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        let tables = self
            .conn
            .query_all(Statement::from_string(
                DatabaseBackend::Postgres,
                "SELECT tablename FROM pg_tables WHERE schemaname = 'public'".to_string(),
            ))
            .await?;

        for row in tables {
            if let Ok(table_name) = row.try_get::<String>("", "tablename") {
                if table_name == "seaql_migrations" {
                    continue;
                }

                let truncate = format!("TRUNCATE TABLE \"{table_name}\" CASCADE");
                self.conn
                    .execute(Statement::from_string(DatabaseBackend::Postgres, truncate))
                    .await?;
            }
        }

        info!("Cleaned up test database");
        Ok(())
    }

    /// Insert a bare person row with the given ID.
    pub async fn insert_person(&self, id: &str, display_name: &str) -> Result<person::Model, DbErr> {
        person::ActiveModel {
            id: Set(id.to_string()),
            display_name: Set(display_name.to_string()),
            bio: Set(None),
            avatar_url: Set(None),
            banner_url: Set(None),
            is_private: Set(false),
            wallet_address: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(self.conn.as_ref())
        .await
    }
}
