//! Create message table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Message::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Message::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Message::SenderId).string_len(32).not_null())
                    .col(ColumnDef::new(Message::ReceiverId).string_len(32).not_null())
                    .col(ColumnDef::new(Message::Content).text().not_null())
                    .col(
                        ColumnDef::new(Message::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Message::SentTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Message::ReadTime).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_sender")
                            .from(Message::Table, Message::SenderId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_receiver")
                            .from(Message::Table, Message::ReceiverId)
                            .to(Person::Table, Person::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (sender_id, receiver_id, sent_time) for conversations
        manager
            .create_index(
                Index::create()
                    .name("idx_message_sender_receiver_sent")
                    .table(Message::Table)
                    .col(Message::SenderId)
                    .col(Message::ReceiverId)
                    .col(Message::SentTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_message_receiver_read")
                    .table(Message::Table)
                    .col(Message::ReceiverId)
                    .col(Message::IsRead)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Message::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
    SenderId,
    ReceiverId,
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
