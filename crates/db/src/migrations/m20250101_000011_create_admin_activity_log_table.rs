//! Create admin activity log table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdminActivityLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdminActivityLog::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdminActivityLog::UserId).string_len(32))
                    .col(
                        ColumnDef::new(AdminActivityLog::ActionType)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdminActivityLog::ActionTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AdminActivityLog::IpAddress).string_len(64))
                    .col(
                        ColumnDef::new(AdminActivityLog::IsSuccessful)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdminActivityLog::PagePath)
                            .string_len(1024)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdminActivityLog::DurationMs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(AdminActivityLog::ErrorMessage).text())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_admin_activity_log_action_time")
                    .table(AdminActivityLog::Table)
                    .col(AdminActivityLog::ActionTime)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminActivityLog::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AdminActivityLog {
    Table,
    Id,
    UserId,
    ActionType,
    ActionTime,
    IpAddress,
    IsSuccessful,
    PagePath,
    DurationMs,
    ErrorMessage,
}
