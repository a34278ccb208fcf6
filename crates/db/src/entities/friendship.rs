//! Friendship entity.
//!
//! A friendship is stored as a directed request from `requester_id` to
//! `addressee_id`. The reverse direction would be a separate row, so
//! symmetric lookups have to check both.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Friendship status.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    #[sea_orm(num_value = 0)]
    #[default]
    Pending,
    #[sea_orm(num_value = 1)]
    Accepted,
    #[sea_orm(num_value = 2)]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "friendship")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub requester_id: String,

    pub addressee_id: String,

    pub status: FriendshipStatus,

    pub request_date: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub response_date: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// The other side of the friendship, seen from `person_id`.
    #[must_use]
    pub fn other_party(&self, person_id: &str) -> &str {
        if self.requester_id == person_id {
            &self.addressee_id
        } else {
            &self.requester_id
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::RequesterId",
        to = "super::person::Column::Id",
        on_delete = "Cascade"
    )]
    Requester,

    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::AddresseeId",
        to = "super::person::Column::Id",
        on_delete = "Cascade"
    )]
    Addressee,
}

impl ActiveModelBehavior for ActiveModel {}
