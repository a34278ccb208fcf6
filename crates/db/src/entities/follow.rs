//! Follow entity (directed edge between persons).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `follow_type` for following a person.
pub const FOLLOW_TYPE_PERSON: i32 = 0;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follow")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The person who is following
    pub follower_id: String,

    /// The person being followed
    pub followed_id: String,

    /// Kind of follow edge
    #[sea_orm(default_value = 0)]
    pub follow_type: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::FollowerId",
        to = "super::person::Column::Id",
        on_delete = "Cascade"
    )]
    Follower,

    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::FollowedId",
        to = "super::person::Column::Id",
        on_delete = "Cascade"
    )]
    Followed,
}

impl ActiveModelBehavior for ActiveModel {}
