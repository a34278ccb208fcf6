//! Article service.
//!
//! Attachments are written to the storage backend before the database
//! transaction starts. If the transaction fails the stored files are
//! removed again, so a failed post leaves nothing behind.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use matrix_common::{
    AppError, AppResult, IdGenerator, PageRequest, Paged, StorageBackend, UploadedFile,
    config::UploadConfig, generate_storage_key,
};
use matrix_db::{
    entities::{article, article_attachment, hashtag},
    repositories::{ArticleRepository, HashtagRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

const MAX_CONTENT_CHARS: usize = 5000;

/// One uploaded file from the post form.
#[derive(Debug, Clone)]
pub struct UploadInput {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Input for a new article.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleInput {
    pub content: String,
    #[serde(default)]
    pub hashtag_ids: Vec<String>,
}

/// An article with its attachments and hashtags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
    #[serde(flatten)]
    pub article: article::Model,
    pub attachments: Vec<article_attachment::Model>,
    /// Filled for single-article reads only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hashtags: Vec<hashtag::Model>,
}

/// Article service for business logic.
#[derive(Clone)]
pub struct ArticleService {
    article_repo: ArticleRepository,
    hashtag_repo: HashtagRepository,
    storage: Arc<dyn StorageBackend>,
    max_files: usize,
    max_file_size: u64,
    id_gen: IdGenerator,
}

impl ArticleService {
    /// Create a new article service.
    #[must_use]
    pub fn new(
        article_repo: ArticleRepository,
        hashtag_repo: HashtagRepository,
        storage: Arc<dyn StorageBackend>,
        uploads: &UploadConfig,
    ) -> Self {
        Self {
            article_repo,
            hashtag_repo,
            storage,
            max_files: uploads.max_files,
            max_file_size: uploads.max_file_size,
            id_gen: IdGenerator::new(),
        }
    }

    /// Publish an article with optional attachments and hashtags.
    pub async fn create_article(
        &self,
        author_id: &str,
        input: CreateArticleInput,
        files: Vec<UploadInput>,
    ) -> AppResult<ArticleView> {
        let content = input.content.trim();
        let content_len = content.chars().count();
        if content_len == 0 || content_len > MAX_CONTENT_CHARS {
            return Err(AppError::validation(
                "content",
                format!("must be 1 to {MAX_CONTENT_CHARS} characters"),
            ));
        }

        self.validate_files(&files)?;

        let mut hashtag_ids = input.hashtag_ids;
        hashtag_ids.sort_unstable();
        hashtag_ids.dedup();

        let hashtags = self.hashtag_repo.find_by_ids(&hashtag_ids).await?;
        if hashtags.len() != hashtag_ids.len() {
            return Err(AppError::validation("hashtagIds", "contains unknown hashtags"));
        }

        let uploaded = self.store_files(author_id, &files).await?;

        let now = Utc::now();
        let article_id = self.id_gen.generate();

        let attachment_models: Vec<article_attachment::Model> = uploaded
            .iter()
            .map(|file| article_attachment::Model {
                id: self.id_gen.generate(),
                article_id: article_id.clone(),
                file_key: file.key.clone(),
                file_url: file.url.clone(),
                mime_type: file.content_type.clone(),
                file_size: file.size as i64,
                created_at: now.into(),
            })
            .collect();

        let model = article::ActiveModel {
            id: Set(article_id),
            author_id: Set(author_id.to_string()),
            content: Set(content.to_string()),
            praise_count: Set(0),
            collect_count: Set(0),
            is_deleted: Set(false),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let attachments = attachment_models
            .iter()
            .map(|a| article_attachment::ActiveModel {
                id: Set(a.id.clone()),
                article_id: Set(a.article_id.clone()),
                file_key: Set(a.file_key.clone()),
                file_url: Set(a.file_url.clone()),
                mime_type: Set(a.mime_type.clone()),
                file_size: Set(a.file_size),
                created_at: Set(a.created_at),
            })
            .collect();

        let article = match self
            .article_repo
            .create_with_relations(model, attachments, &hashtag_ids)
            .await
        {
            Ok(article) => article,
            Err(e) => {
                self.discard_files(&uploaded).await;
                return Err(e);
            }
        };

        tracing::info!(
            article_id = %article.id,
            author_id = %author_id,
            attachments = attachment_models.len(),
            hashtags = hashtag_ids.len(),
            "Article created"
        );

        Ok(ArticleView {
            article,
            attachments: attachment_models,
            hashtags,
        })
    }

    fn validate_files(&self, files: &[UploadInput]) -> AppResult<()> {
        if files.len() > self.max_files {
            return Err(AppError::validation(
                "files",
                format!("at most {} files are allowed", self.max_files),
            ));
        }

        for file in files {
            if file.data.len() as u64 > self.max_file_size {
                return Err(AppError::PayloadTooLarge(format!(
                    "{} exceeds {} bytes",
                    file.file_name, self.max_file_size
                )));
            }
            if !is_allowed_mime(&file.content_type) {
                return Err(AppError::validation(
                    "files",
                    format!("{} is not an image or video", file.file_name),
                ));
            }
        }

        Ok(())
    }

    async fn store_files(&self, owner_id: &str, files: &[UploadInput]) -> AppResult<Vec<UploadedFile>> {
        let mut uploaded = Vec::with_capacity(files.len());

        for file in files {
            let key = generate_storage_key(owner_id, &file.file_name);
            match self.storage.upload(&key, &file.data, &file.content_type).await {
                Ok(stored) => uploaded.push(stored),
                Err(e) => {
                    self.discard_files(&uploaded).await;
                    return Err(e);
                }
            }
        }

        Ok(uploaded)
    }

    async fn discard_files(&self, files: &[UploadedFile]) {
        for file in files {
            if let Err(e) = self.storage.delete(&file.key).await {
                tracing::warn!(error = %e, key = %file.key, "Failed to delete orphaned upload");
            }
        }
    }

    /// A visible article with attachments and hashtags.
    pub async fn get_article(&self, id: &str) -> AppResult<Option<ArticleView>> {
        let Some(article) = self.article_repo.find_visible(id).await? else {
            return Ok(None);
        };

        let attachments = self
            .article_repo
            .find_attachments(&[article.id.clone()])
            .await?;
        let hashtags = self.article_repo.find_hashtags(&article.id).await?;

        Ok(Some(ArticleView {
            article,
            attachments,
            hashtags,
        }))
    }

    /// All visible articles, newest first.
    pub async fn get_feed(&self, page: PageRequest) -> AppResult<Paged<ArticleView>> {
        let (items, total) = self.article_repo.find_feed(page).await?;
        let views = self.with_attachments(items).await?;
        Ok(Paged::new(views, page, total))
    }

    /// A person's visible articles, newest first.
    pub async fn get_by_author(
        &self,
        author_id: &str,
        page: PageRequest,
    ) -> AppResult<Paged<ArticleView>> {
        let (items, total) = self.article_repo.find_by_author(author_id, page).await?;
        let views = self.with_attachments(items).await?;
        Ok(Paged::new(views, page, total))
    }

    /// Soft-delete an article. Only its author or an admin may do this.
    pub async fn delete_article(&self, id: &str, actor_id: &str, is_admin: bool) -> AppResult<()> {
        let article = self
            .article_repo
            .find_visible(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Article {id} not found")))?;

        if article.author_id != actor_id && !is_admin {
            return Err(AppError::Forbidden(
                "Only the author can delete this article".to_string(),
            ));
        }

        self.article_repo.soft_delete(id).await?;
        tracing::info!(article_id = %id, actor_id = %actor_id, "Article deleted");
        Ok(())
    }

    async fn with_attachments(&self, articles: Vec<article::Model>) -> AppResult<Vec<ArticleView>> {
        let ids: Vec<String> = articles.iter().map(|a| a.id.clone()).collect();

        let mut by_article: HashMap<String, Vec<article_attachment::Model>> = HashMap::new();
        for attachment in self.article_repo.find_attachments(&ids).await? {
            by_article
                .entry(attachment.article_id.clone())
                .or_default()
                .push(attachment);
        }

        Ok(articles
            .into_iter()
            .map(|article| ArticleView {
                attachments: by_article.remove(&article.id).unwrap_or_default(),
                article,
                hashtags: vec![],
            })
            .collect())
    }
}

fn is_allowed_mime(content_type: &str) -> bool {
    let content_type = content_type.trim().to_ascii_lowercase();
    ["image/", "video/"]
        .iter()
        .any(|prefix| content_type.starts_with(prefix) && content_type.len() > prefix.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
    use std::collections::HashSet;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryStorage {
        keys: Mutex<HashSet<String>>,
    }

    #[async_trait::async_trait]
    impl StorageBackend for MemoryStorage {
        async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<UploadedFile> {
            self.keys.lock().await.insert(key.to_string());
            Ok(UploadedFile {
                key: key.to_string(),
                url: self.public_url(key),
                size: data.len() as u64,
                content_type: content_type.to_string(),
                md5: String::new(),
            })
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.keys.lock().await.remove(key);
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("/files/{key}")
        }

        async fn exists(&self, key: &str) -> AppResult<bool> {
            Ok(self.keys.lock().await.contains(key))
        }
    }

    fn create_test_article(id: &str) -> article::Model {
        article::Model {
            id: id.to_string(),
            author_id: "p1".to_string(),
            content: "hello".to_string(),
            praise_count: 0,
            collect_count: 0,
            is_deleted: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_hashtag(id: &str) -> hashtag::Model {
        hashtag::Model {
            id: id.to_string(),
            name: id.to_string(),
            usage_count: 0,
            created_at: Utc::now().into(),
        }
    }

    fn upload(name: &str, content_type: &str, size: usize) -> UploadInput {
        UploadInput {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            data: Bytes::from(vec![0u8; size]),
        }
    }

    fn service(
        article_db: MockDatabase,
        hashtag_db: MockDatabase,
        storage: Arc<MemoryStorage>,
    ) -> ArticleService {
        ArticleService::new(
            ArticleRepository::new(Arc::new(article_db.into_connection())),
            HashtagRepository::new(Arc::new(hashtag_db.into_connection())),
            storage,
            &UploadConfig {
                max_files: 6,
                max_file_size: 1024,
            },
        )
    }

    fn empty() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    fn input(content: &str) -> CreateArticleInput {
        CreateArticleInput {
            content: content.to_string(),
            hashtag_ids: vec![],
        }
    }

    #[test]
    fn test_allowed_mime() {
        assert!(is_allowed_mime("image/png"));
        assert!(is_allowed_mime("Video/MP4"));
        assert!(!is_allowed_mime("application/pdf"));
        assert!(!is_allowed_mime("image/"));
    }

    #[tokio::test]
    async fn test_empty_content_rejected() {
        let service = service(empty(), empty(), Arc::default());

        let result = service.create_article("p1", input("   "), vec![]).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_too_many_files_rejected() {
        let service = service(empty(), empty(), Arc::default());
        let files = (0..7).map(|i| upload(&format!("{i}.png"), "image/png", 10)).collect();

        let result = service.create_article("p1", input("hi"), files).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_oversized_file_rejected() {
        let service = service(empty(), empty(), Arc::default());

        let result = service
            .create_article("p1", input("hi"), vec![upload("big.png", "image/png", 2048)])
            .await;
        assert!(matches!(result, Err(AppError::PayloadTooLarge(_))));
    }

    #[tokio::test]
    async fn test_wrong_mime_rejected() {
        let service = service(empty(), empty(), Arc::default());

        let result = service
            .create_article("p1", input("hi"), vec![upload("a.pdf", "application/pdf", 10)])
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_hashtag_rejected() {
        let service = service(
            empty(),
            empty().append_query_results([Vec::<hashtag::Model>::new()]),
            Arc::default(),
        );

        let result = service
            .create_article(
                "p1",
                CreateArticleInput {
                    content: "hi".to_string(),
                    hashtag_ids: vec!["missing".to_string()],
                },
                vec![],
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_failed_insert_removes_stored_files() {
        let storage = Arc::new(MemoryStorage::default());
        let service = service(
            empty().append_query_errors([DbErr::Custom("insert failed".to_string())]),
            empty(),
            storage.clone(),
        );

        let result = service
            .create_article("p1", input("hi"), vec![upload("a.png", "image/png", 10)])
            .await;
        assert!(matches!(result, Err(AppError::Database(_))));
        assert!(storage.keys.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_article() {
        let storage = Arc::new(MemoryStorage::default());
        let service = service(
            empty()
                .append_query_results([[create_test_article("a1")]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ]),
            empty().append_query_results([[create_test_hashtag("h1")]]),
            storage.clone(),
        );

        let view = service
            .create_article(
                "p1",
                CreateArticleInput {
                    content: "hello".to_string(),
                    hashtag_ids: vec!["h1".to_string(), "h1".to_string()],
                },
                vec![upload("a.png", "image/png", 10)],
            )
            .await
            .unwrap();

        assert_eq!(view.attachments.len(), 1);
        assert_eq!(view.hashtags.len(), 1);
        assert_eq!(storage.keys.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_by_stranger_forbidden() {
        let service = service(
            empty().append_query_results([[create_test_article("a1")]]),
            empty(),
            Arc::default(),
        );

        let result = service.delete_article("a1", "p2", false).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_admin_can_delete() {
        let service = service(
            empty()
                .append_query_results([[create_test_article("a1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
            empty(),
            Arc::default(),
        );

        assert!(service.delete_article("a1", "admin", true).await.is_ok());
    }
}
