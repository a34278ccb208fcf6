//! Praise / collect repository.

use std::sync::Arc;

use crate::entities::{Article, PraiseCollect, article, praise_collect};
use chrono::Utc;
use matrix_common::{AppError, AppResult, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, prelude::Expr,
};

/// Result of a toggle: the row after the write and the article's counter.
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub state: praise_collect::Model,
    pub active: bool,
    pub count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    Praise,
    Collect,
}

/// Praise / collect repository for database operations.
#[derive(Clone)]
pub struct PraiseCollectRepository {
    db: Arc<DatabaseConnection>,
}

impl PraiseCollectRepository {
    /// Create a new praise / collect repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the row for a person and an article.
    pub async fn find_state(
        &self,
        person_id: &str,
        article_id: &str,
    ) -> AppResult<Option<praise_collect::Model>> {
        PraiseCollect::find()
            .filter(praise_collect::Column::PersonId.eq(person_id))
            .filter(praise_collect::Column::ArticleId.eq(article_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Flip the praise flag and adjust `praise_count`.
    ///
    /// `new_id` is used only when the row does not exist yet.
    pub async fn toggle_praise(
        &self,
        new_id: String,
        person_id: &str,
        article_id: &str,
    ) -> AppResult<ToggleOutcome> {
        self.toggle(Flag::Praise, new_id, person_id, article_id)
            .await
    }

    /// Flip the collect flag and adjust `collect_count`.
    pub async fn toggle_collect(
        &self,
        new_id: String,
        person_id: &str,
        article_id: &str,
    ) -> AppResult<ToggleOutcome> {
        self.toggle(Flag::Collect, new_id, person_id, article_id)
            .await
    }

    async fn toggle(
        &self,
        flag: Flag,
        new_id: String,
        person_id: &str,
        article_id: &str,
    ) -> AppResult<ToggleOutcome> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let existing = PraiseCollect::find()
            .filter(praise_collect::Column::PersonId.eq(person_id))
            .filter(praise_collect::Column::ArticleId.eq(article_id))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let now = Utc::now().fixed_offset();

        let state = match existing {
            Some(row) => {
                let mut active: praise_collect::ActiveModel = row.clone().into();
                match flag {
                    Flag::Praise => {
                        let on = !row.is_praised;
                        active.is_praised = Set(on);
                        active.praise_time = Set(on.then_some(now));
                    }
                    Flag::Collect => {
                        let on = !row.is_collected;
                        active.is_collected = Set(on);
                        active.collect_time = Set(on.then_some(now));
                    }
                }
                active
                    .update(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?
            }
            None => {
                let praise = flag == Flag::Praise;
                praise_collect::ActiveModel {
                    id: Set(new_id),
                    person_id: Set(person_id.to_string()),
                    article_id: Set(article_id.to_string()),
                    is_praised: Set(praise),
                    praise_time: Set(praise.then_some(now)),
                    is_collected: Set(!praise),
                    collect_time: Set((!praise).then_some(now)),
                }
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
            }
        };

        let (active, column, decrement) = match flag {
            Flag::Praise => (
                state.is_praised,
                article::Column::PraiseCount,
                "GREATEST(praise_count - 1, 0)",
            ),
            Flag::Collect => (
                state.is_collected,
                article::Column::CollectCount,
                "GREATEST(collect_count - 1, 0)",
            ),
        };

        let expr = if active {
            Expr::col(column).add(1)
        } else {
            Expr::cust(decrement)
        };

        Article::update_many()
            .col_expr(column, expr)
            .filter(article::Column::Id.eq(article_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let article = Article::find_by_id(article_id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Article {article_id} not found")))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = match flag {
            Flag::Praise => article.praise_count,
            Flag::Collect => article.collect_count,
        };

        Ok(ToggleOutcome {
            state,
            active,
            count,
        })
    }

    /// Articles a person has collected, most recently collected first.
    pub async fn find_collected(
        &self,
        person_id: &str,
        page: PageRequest,
    ) -> AppResult<(Vec<praise_collect::Model>, u64)> {
        let query = PraiseCollect::find()
            .filter(praise_collect::Column::PersonId.eq(person_id))
            .filter(praise_collect::Column::IsCollected.eq(true))
            .order_by_desc(praise_collect::Column::CollectTime);

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
}
