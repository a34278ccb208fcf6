//! Praise / collect service.

use std::collections::HashMap;

use crate::services::notification::NotificationService;
use matrix_common::{AppError, AppResult, IdGenerator, PageRequest, Paged};
use matrix_db::{
    entities::{article, notification::kind, praise_collect},
    repositories::{ArticleRepository, PraiseCollectRepository},
};
use serde::Serialize;

/// State after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResult {
    /// Whether the flag is now set.
    pub active: bool,
    /// The article's counter after the toggle.
    pub count: i32,
}

/// Praise / collect service for business logic.
#[derive(Clone)]
pub struct PraiseCollectService {
    praise_collect_repo: PraiseCollectRepository,
    article_repo: ArticleRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl PraiseCollectService {
    /// Create a new praise / collect service.
    #[must_use]
    pub const fn new(
        praise_collect_repo: PraiseCollectRepository,
        article_repo: ArticleRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            praise_collect_repo,
            article_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    async fn visible_article(&self, article_id: &str) -> AppResult<article::Model> {
        self.article_repo
            .find_visible(article_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Article {article_id} not found")))
    }

    /// Praise an article, or withdraw the praise.
    pub async fn toggle_praise(&self, person_id: &str, article_id: &str) -> AppResult<ToggleResult> {
        let article = self.visible_article(article_id).await?;

        let outcome = self
            .praise_collect_repo
            .toggle_praise(self.id_gen.generate(), person_id, article_id)
            .await?;

        tracing::debug!(
            person_id = %person_id,
            article_id = %article_id,
            praised = outcome.active,
            count = outcome.count,
            "Toggled praise"
        );

        if outcome.active {
            self.notification_service
                .notify(&article.author_id, person_id, kind::PRAISE, Some(article_id))
                .await;
        }

        Ok(ToggleResult {
            active: outcome.active,
            count: outcome.count,
        })
    }

    /// Collect an article, or remove it from the collection.
    pub async fn toggle_collect(&self, person_id: &str, article_id: &str) -> AppResult<ToggleResult> {
        self.visible_article(article_id).await?;

        let outcome = self
            .praise_collect_repo
            .toggle_collect(self.id_gen.generate(), person_id, article_id)
            .await?;

        tracing::debug!(
            person_id = %person_id,
            article_id = %article_id,
            collected = outcome.active,
            count = outcome.count,
            "Toggled collect"
        );

        Ok(ToggleResult {
            active: outcome.active,
            count: outcome.count,
        })
    }

    /// The person's flags on an article, if they ever touched it.
    pub async fn get_state(
        &self,
        person_id: &str,
        article_id: &str,
    ) -> AppResult<Option<praise_collect::Model>> {
        self.praise_collect_repo
            .find_state(person_id, article_id)
            .await
    }

    /// Articles the person collected, most recently collected first.
    ///
    /// Articles deleted since are left out of the page.
    pub async fn get_collected_articles(
        &self,
        person_id: &str,
        page: PageRequest,
    ) -> AppResult<Paged<article::Model>> {
        let (rows, total) = self
            .praise_collect_repo
            .find_collected(person_id, page)
            .await?;

        let ids: Vec<String> = rows.iter().map(|r| r.article_id.clone()).collect();
        let mut articles: HashMap<String, article::Model> = self
            .article_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .filter(|a| !a.is_deleted)
            .map(|a| (a.id.clone(), a))
            .collect();

        let items = ids.iter().filter_map(|id| articles.remove(id)).collect();
        Ok(Paged::new(items, page, total))
    }
}
