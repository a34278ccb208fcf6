//! Create article table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Article::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Article::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Article::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Article::Content).text().not_null())
                    .col(
                        ColumnDef::new(Article::PraiseCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Article::CollectCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Article::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Article::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Article::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_article_author")
                            .from(Article::Table, Article::AuthorId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (author_id, created_at) for profile timelines
        manager
            .create_index(
                Index::create()
                    .name("idx_article_author_created_at")
                    .table(Article::Table)
                    .col(Article::AuthorId)
                    .col(Article::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_article_created_at")
                    .table(Article::Table)
                    .col(Article::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Article::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Article {
    Table,
    Id,
    AuthorId,
    Content,
    PraiseCount,
    CollectCount,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Person {
    Table,
    Id,
}
