//! Create praise/collect table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PraiseCollect::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PraiseCollect::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PraiseCollect::PersonId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PraiseCollect::ArticleId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PraiseCollect::IsPraised)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(PraiseCollect::PraiseTime).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(PraiseCollect::IsCollected)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(PraiseCollect::CollectTime).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_praise_collect_person")
                            .from(PraiseCollect::Table, PraiseCollect::PersonId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_praise_collect_article")
                            .from(PraiseCollect::Table, PraiseCollect::ArticleId)
                            .to(Article::Table, Article::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one row per (person, article)
        manager
            .create_index(
                Index::create()
                    .name("idx_praise_collect_person_article")
                    .table(PraiseCollect::Table)
                    .col(PraiseCollect::PersonId)
                    .col(PraiseCollect::ArticleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PraiseCollect::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PraiseCollect {
    Table,
    Id,
    PersonId,
    ArticleId,
    IsPraised,
    PraiseTime,
    IsCollected,
    CollectTime,
}

#[derive(Iden)]
enum Person {
    Table,
    Id,
}

#[derive(Iden)]
enum Article {
    Table,
    Id,
}
