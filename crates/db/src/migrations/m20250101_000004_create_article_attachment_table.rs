//! Create article attachment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ArticleAttachment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ArticleAttachment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ArticleAttachment::ArticleId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArticleAttachment::FileKey)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArticleAttachment::FileUrl)
                            .string_len(1024)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArticleAttachment::MimeType)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArticleAttachment::FileSize)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArticleAttachment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_article_attachment_article")
                            .from(ArticleAttachment::Table, ArticleAttachment::ArticleId)
                            .to(Article::Table, Article::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_article_attachment_article_id")
                    .table(ArticleAttachment::Table)
                    .col(ArticleAttachment::ArticleId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ArticleAttachment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ArticleAttachment {
    Table,
    Id,
    ArticleId,
    FileKey,
    FileUrl,
    MimeType,
    FileSize,
    CreatedAt,
}

#[derive(Iden)]
enum Article {
    Table,
    Id,
}
