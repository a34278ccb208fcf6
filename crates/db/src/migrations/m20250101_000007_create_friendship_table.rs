//! Create friendship table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Friendship::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Friendship::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Friendship::RequesterId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Friendship::AddresseeId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Friendship::Status)
                            .small_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Friendship::RequestDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Friendship::ResponseDate).timestamp_with_time_zone())
                    .check(Expr::col(Friendship::RequesterId).ne(Expr::col(Friendship::AddresseeId)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendship_requester")
                            .from(Friendship::Table, Friendship::RequesterId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendship_addressee")
                            .from(Friendship::Table, Friendship::AddresseeId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one row per unordered pair
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_friendship_pair
                ON friendship (LEAST(requester_id, addressee_id), GREATEST(requester_id, addressee_id));
                ",
            )
            .await?;

        // Index: (addressee_id, status) for pending request inboxes
        manager
            .create_index(
                Index::create()
                    .name("idx_friendship_addressee_status")
                    .table(Friendship::Table)
                    .col(Friendship::AddresseeId)
                    .col(Friendship::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Friendship::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Friendship {
    Table,
    Id,
    RequesterId,
    AddresseeId,
    Status,
    RequestDate,
    ResponseDate,
}

#[derive(Iden)]
enum Person {
    Table,
    Id,
}
