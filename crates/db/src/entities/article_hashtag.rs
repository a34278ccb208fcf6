//! Article ↔ hashtag link.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "article_hashtag")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub article_id: String,

    #[sea_orm(primary_key, auto_increment = false)]
    pub hashtag_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::article::Entity",
        from = "Column::ArticleId",
        to = "super::article::Column::Id",
        on_delete = "Cascade"
    )]
    Article,

    #[sea_orm(
        belongs_to = "super::hashtag::Entity",
        from = "Column::HashtagId",
        to = "super::hashtag::Column::Id",
        on_delete = "Cascade"
    )]
    Hashtag,
}

impl ActiveModelBehavior for ActiveModel {}
