//! Create NFT table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Nft::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Nft::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Nft::OwnerId).string_len(32).not_null())
                    .col(ColumnDef::new(Nft::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Nft::Description).text())
                    .col(ColumnDef::new(Nft::ImageUrl).string_len(1024).not_null())
                    .col(ColumnDef::new(Nft::ContractAddress).string_len(128).not_null())
                    .col(ColumnDef::new(Nft::TokenId).string_len(128).not_null())
                    .col(ColumnDef::new(Nft::Chain).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Nft::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_nft_owner")
                            .from(Nft::Table, Nft::OwnerId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_nft_contract_token")
                    .table(Nft::Table)
                    .col(Nft::ContractAddress)
                    .col(Nft::TokenId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_nft_owner_id")
                    .table(Nft::Table)
                    .col(Nft::OwnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Nft::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Nft {
    Table,
    Id,
    OwnerId,
    Name,
    Description,
    ImageUrl,
    ContractAddress,
    TokenId,
    Chain,
    CreatedAt,
}

#[derive(Iden)]
enum Person {
    Table,
    Id,
}
