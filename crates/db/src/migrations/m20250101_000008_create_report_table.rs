//! Create report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Report::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Report::ReporterId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::TargetId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::ReportType).string_len(16).not_null())
                    .col(ColumnDef::new(Report::Reason).text().not_null())
                    .col(
                        ColumnDef::new(Report::Status)
                            .small_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Report::ResolverId).string_len(32))
                    .col(ColumnDef::new(Report::ProcessTime).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_reporter")
                            .from(Report::Table, Report::ReporterId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (status, created_at) for the moderation queue
        manager
            .create_index(
                Index::create()
                    .name("idx_report_status_created_at")
                    .table(Report::Table)
                    .col(Report::Status)
                    .col(Report::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: (reporter_id, target_id, report_type) for duplicate checks
        manager
            .create_index(
                Index::create()
                    .name("idx_report_reporter_target")
                    .table(Report::Table)
                    .col(Report::ReporterId)
                    .col(Report::TargetId)
                    .col(Report::ReportType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
    ReporterId,
    TargetId,
    ReportType,
    Reason,
    Status,
    ResolverId,
    ProcessTime,
    CreatedAt,
}

#[derive(Iden)]
enum Person {
    Table,
    Id,
}
