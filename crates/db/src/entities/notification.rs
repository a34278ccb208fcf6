//! Notification entity.
//!
//! `notification_type` is an open integer tag; [`kind`] lists the values
//! the application itself emits.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification type tags emitted by the services.
pub mod kind {
    pub const SYSTEM: i32 = 0;
    pub const FOLLOW: i32 = 1;
    pub const FRIEND_REQUEST: i32 = 2;
    pub const FRIEND_ACCEPTED: i32 = 3;
    pub const PRAISE: i32 = 4;
    pub const COLLECT: i32 = 5;
    pub const MESSAGE: i32 = 6;
    pub const REPORT_RESOLVED: i32 = 7;
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The person receiving the notification
    pub receiver_id: String,

    /// The person who triggered it (NULL for system notifications)
    #[sea_orm(nullable)]
    pub sender_id: Option<String>,

    pub notification_type: i32,

    /// Related article / request / report ID
    #[sea_orm(nullable)]
    pub related_id: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,

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
        from = "Column::ReceiverId",
        to = "super::person::Column::Id",
        on_delete = "Cascade"
    )]
    Receiver,

    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::SenderId",
        to = "super::person::Column::Id",
        on_delete = "Cascade"
    )]
    Sender,
}

impl ActiveModelBehavior for ActiveModel {}
