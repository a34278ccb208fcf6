//! Hashtag service.

use chrono::Utc;
use matrix_common::{AppError, AppResult, IdGenerator};
use matrix_db::{entities::hashtag, repositories::HashtagRepository};
use sea_orm::Set;

const MAX_NAME_CHARS: usize = 64;
const MAX_RESULTS: u64 = 50;

/// Hashtag service for business logic.
#[derive(Clone)]
pub struct HashtagService {
    hashtag_repo: HashtagRepository,
    id_gen: IdGenerator,
}

impl HashtagService {
    /// Create a new hashtag service.
    #[must_use]
    pub const fn new(hashtag_repo: HashtagRepository) -> Self {
        Self {
            hashtag_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Hashtags starting with `prefix`, most used first.
    pub async fn search(&self, prefix: &str, limit: u64) -> AppResult<Vec<hashtag::Model>> {
        let prefix = normalize(prefix);
        if prefix.is_empty() {
            return Ok(vec![]);
        }

        self.hashtag_repo
            .search_prefix(&prefix, limit.clamp(1, MAX_RESULTS))
            .await
    }

    /// Find a hashtag by name, creating it if needed.
    pub async fn get_or_create(&self, name: &str) -> AppResult<hashtag::Model> {
        let name = normalize(name);
        validate_name(&name)?;

        if let Some(existing) = self.hashtag_repo.find_by_name(&name).await? {
            return Ok(existing);
        }

        let model = hashtag::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.clone()),
            usage_count: Set(0),
            created_at: Set(Utc::now().into()),
        };

        match self.hashtag_repo.create(model).await {
            Ok(created) => {
                tracing::debug!(name = %created.name, "Created hashtag");
                Ok(created)
            }
            // Someone else created it in the meantime
            Err(e) => self
                .hashtag_repo
                .find_by_name(&name)
                .await?
                .ok_or(e),
        }
    }

    /// Most used hashtags.
    pub async fn trending(&self, limit: u64) -> AppResult<Vec<hashtag::Model>> {
        self.hashtag_repo
            .find_trending(limit.clamp(1, MAX_RESULTS))
            .await
    }
}

/// Lowercase, without surrounding whitespace or a leading `#`.
fn normalize(name: &str) -> String {
    name.trim().trim_start_matches('#').to_lowercase()
}

fn validate_name(name: &str) -> AppResult<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_CHARS {
        return Err(AppError::validation(
            "name",
            format!("must be 1 to {MAX_NAME_CHARS} characters"),
        ));
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(AppError::validation(
            "name",
            "may only contain letters, digits and underscores",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_hashtag(name: &str, usage_count: i32) -> hashtag::Model {
        hashtag::Model {
            id: format!("h-{name}"),
            name: name.to_string(),
            usage_count,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> HashtagService {
        HashtagService::new(HashtagRepository::new(Arc::new(db.into_connection())))
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  #Rust "), "rust");
        assert_eq!(normalize("日本"), "日本");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("rust_lang").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("two words").is_err());
        assert!(validate_name(&"a".repeat(65)).is_err());
    }

    #[tokio::test]
    async fn test_search_empty_prefix_skips_query() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        assert!(service.search("  # ", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_or_create_returns_existing() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_hashtag("rust", 3)]]),
        );

        let tag = service.get_or_create("#Rust").await.unwrap();
        assert_eq!(tag.usage_count, 3);
    }

    #[tokio::test]
    async fn test_get_or_create_creates() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<hashtag::Model>::new()])
                .append_query_results([[create_test_hashtag("rust", 0)]]),
        );

        let tag = service.get_or_create("rust").await.unwrap();
        assert_eq!(tag.name, "rust");
    }
}
