//! Direct message entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "message")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub sender_id: String,

    pub receiver_id: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    #[sea_orm(default_value = false)]
    pub is_read: bool,

    pub sent_time: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub read_time: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::SenderId",
        to = "super::person::Column::Id",
        on_delete = "Cascade"
    )]
    Sender,

    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::ReceiverId",
        to = "super::person::Column::Id",
        on_delete = "Cascade"
    )]
    Receiver,
}

impl ActiveModelBehavior for ActiveModel {}
