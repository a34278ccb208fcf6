//! Person entity (public profile identity, separate from the login credential).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "person")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub display_name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    #[sea_orm(nullable)]
    pub banner_url: Option<String>,

    /// Private profiles hide their follower lists from non-friends.
    #[sea_orm(default_value = false)]
    pub is_private: bool,

    /// Wallet address shown next to the NFT showcase.
    #[sea_orm(nullable)]
    pub wallet_address: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::user::Entity")]
    User,

    #[sea_orm(has_many = "super::article::Entity")]
    Article,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::article::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Article.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
