//! Create notification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notification::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Notification::ReceiverId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notification::SenderId).string_len(32))
                    .col(
                        ColumnDef::new(Notification::NotificationType)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notification::RelatedId).string_len(32))
                    .col(ColumnDef::new(Notification::Content).text())
                    .col(
                        ColumnDef::new(Notification::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notification::SentTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Notification::ReadTime).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_receiver")
                            .from(Notification::Table, Notification::ReceiverId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_sender")
                            .from(Notification::Table, Notification::SenderId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (receiver_id, is_read, sent_time) for the inbox and unread counts
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_receiver_read_sent")
                    .table(Notification::Table)
                    .col(Notification::ReceiverId)
                    .col(Notification::IsRead)
                    .col(Notification::SentTime)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Notification {
    Table,
    Id,
    ReceiverId,
    SenderId,
    NotificationType,
    RelatedId,
    Content,
    IsRead,
    SentTime,
    ReadTime,
}

#[derive(Iden)]
enum Person {
    Table,
    Id,
}
