//! Article repository.

use std::sync::Arc;

use crate::entities::{
    Article, ArticleAttachment, ArticleHashtag, Hashtag, article, article_attachment,
    article_hashtag, hashtag,
};
use matrix_common::{AppError, AppResult, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, prelude::Expr,
};

/// Article repository for database operations.
#[derive(Clone)]
pub struct ArticleRepository {
    db: Arc<DatabaseConnection>,
}

impl ArticleRepository {
    /// Create a new article repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an article by ID, including soft-deleted ones.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<article::Model>> {
        Article::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an article that has not been deleted.
    pub async fn find_visible(&self, id: &str) -> AppResult<Option<article::Model>> {
        Article::find_by_id(id)
            .filter(article::Column::IsDeleted.eq(false))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find several articles in one query. Missing IDs are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<article::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Article::find()
            .filter(article::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert an article with its attachments and hashtag links, bumping
    /// each hashtag's usage count. Nothing is written unless all of it is.
    pub async fn create_with_relations(
        &self,
        model: article::ActiveModel,
        attachments: Vec<article_attachment::ActiveModel>,
        hashtag_ids: &[String],
    ) -> AppResult<article::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let article = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !attachments.is_empty() {
            ArticleAttachment::insert_many(attachments)
                .exec_without_returning(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        if !hashtag_ids.is_empty() {
            let links = hashtag_ids.iter().map(|hashtag_id| article_hashtag::ActiveModel {
                article_id: Set(article.id.clone()),
                hashtag_id: Set(hashtag_id.clone()),
            });

            ArticleHashtag::insert_many(links)
                .exec_without_returning(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            Hashtag::update_many()
                .col_expr(
                    hashtag::Column::UsageCount,
                    Expr::col(hashtag::Column::UsageCount).add(1),
                )
                .filter(hashtag::Column::Id.is_in(hashtag_ids.iter().cloned()))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(article)
    }

    /// Public feed: non-deleted articles, newest first.
    pub async fn find_feed(&self, page: PageRequest) -> AppResult<(Vec<article::Model>, u64)> {
        let query = Article::find()
            .filter(article::Column::IsDeleted.eq(false))
            .order_by_desc(article::Column::CreatedAt);

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

    /// Non-deleted articles by one author, newest first.
    pub async fn find_by_author(
        &self,
        author_id: &str,
        page: PageRequest,
    ) -> AppResult<(Vec<article::Model>, u64)> {
        let query = Article::find()
            .filter(article::Column::AuthorId.eq(author_id))
            .filter(article::Column::IsDeleted.eq(false))
            .order_by_desc(article::Column::CreatedAt);

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

    /// Attachments of the given articles.
    pub async fn find_attachments(
        &self,
        article_ids: &[String],
    ) -> AppResult<Vec<article_attachment::Model>> {
        if article_ids.is_empty() {
            return Ok(vec![]);
        }

        ArticleAttachment::find()
            .filter(article_attachment::Column::ArticleId.is_in(article_ids.iter().cloned()))
            .order_by_asc(article_attachment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Hashtags linked to an article.
    pub async fn find_hashtags(&self, article_id: &str) -> AppResult<Vec<hashtag::Model>> {
        let links = ArticleHashtag::find()
            .filter(article_hashtag::Column::ArticleId.eq(article_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if links.is_empty() {
            return Ok(vec![]);
        }

        Hashtag::find()
            .filter(hashtag::Column::Id.is_in(links.into_iter().map(|l| l.hashtag_id)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark an article as deleted.
    pub async fn soft_delete(&self, id: &str) -> AppResult<u64> {
        let result = Article::update_many()
            .col_expr(article::Column::IsDeleted, Expr::value(true))
            .col_expr(
                article::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(article::Column::Id.eq(id))
            .filter(article::Column::IsDeleted.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count non-deleted articles.
    pub async fn count(&self) -> AppResult<u64> {
        Article::find()
            .filter(article::Column::IsDeleted.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
