//! Create hashtag and article-hashtag tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Hashtag::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Hashtag::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Hashtag::Name)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Hashtag::UsageCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Hashtag::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ArticleHashtag::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ArticleHashtag::ArticleId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArticleHashtag::HashtagId)
                            .string_len(32)
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ArticleHashtag::ArticleId)
                            .col(ArticleHashtag::HashtagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_article_hashtag_article")
                            .from(ArticleHashtag::Table, ArticleHashtag::ArticleId)
                            .to(Article::Table, Article::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_article_hashtag_hashtag")
                            .from(ArticleHashtag::Table, ArticleHashtag::HashtagId)
                            .to(Hashtag::Table, Hashtag::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: usage_count (for trending)
        manager
            .create_index(
                Index::create()
                    .name("idx_hashtag_usage_count")
                    .table(Hashtag::Table)
                    .col(Hashtag::UsageCount)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ArticleHashtag::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Hashtag::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Hashtag {
    Table,
    Id,
    Name,
    UsageCount,
    CreatedAt,
}

#[derive(Iden)]
enum ArticleHashtag {
    Table,
    ArticleId,
    HashtagId,
}

#[derive(Iden)]
enum Article {
    Table,
    Id,
}
