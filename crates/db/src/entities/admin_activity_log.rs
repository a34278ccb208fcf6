//! Admin activity log entity (append-only audit trail).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Action type recorded for login attempts.
pub const ACTION_LOGIN: &str = "Login";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_activity_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Acting user (NULL for failed logins with an unknown identifier)
    #[sea_orm(nullable)]
    pub user_id: Option<String>,

    pub action_type: String,

    pub action_time: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub ip_address: Option<String>,

    pub is_successful: bool,

    pub page_path: String,

    /// Request duration in milliseconds
    pub duration_ms: i64,

    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
