//! Create follow table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Follow::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Follow::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Follow::FollowerId).string_len(32).not_null())
                    .col(ColumnDef::new(Follow::FollowedId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Follow::FollowType)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Follow::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follow_follower")
                            .from(Follow::Table, Follow::FollowerId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follow_followed")
                            .from(Follow::Table, Follow::FollowedId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one edge per (follower, followed, type)
        manager
            .create_index(
                Index::create()
                    .name("idx_follow_follower_followed_type")
                    .table(Follow::Table)
                    .col(Follow::FollowerId)
                    .col(Follow::FollowedId)
                    .col(Follow::FollowType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: followed_id (for listing followers)
        manager
            .create_index(
                Index::create()
                    .name("idx_follow_followed_id")
                    .table(Follow::Table)
                    .col(Follow::FollowedId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Follow::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Follow {
    Table,
    Id,
    FollowerId,
    FollowedId,
    FollowType,
    CreatedAt,
}

#[derive(Iden)]
enum Person {
    Table,
    Id,
}
