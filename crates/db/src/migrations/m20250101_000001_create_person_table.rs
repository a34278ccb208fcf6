//! Create person table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Person::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Person::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Person::DisplayName).string_len(128).not_null())
                    .col(ColumnDef::new(Person::Bio).text())
                    .col(ColumnDef::new(Person::AvatarUrl).string_len(1024))
                    .col(ColumnDef::new(Person::BannerUrl).string_len(1024))
                    .col(
                        ColumnDef::new(Person::IsPrivate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Person::WalletAddress).string_len(128))
                    .col(
                        ColumnDef::new(Person::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Person::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Person::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Person {
    Table,
    Id,
    DisplayName,
    Bio,
    AvatarUrl,
    BannerUrl,
    IsPrivate,
    WalletAddress,
    CreatedAt,
    UpdatedAt,
}
