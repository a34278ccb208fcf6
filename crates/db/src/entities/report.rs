//! Report entity (user or article reported to the admins).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What kind of target a report points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "article")]
    Article,
}

/// Report status. `Processed` and `Rejected` are terminal.
///
/// Serialized as its numeric code, the same code the dashboard filter takes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(into = "i16", try_from = "i16")]
pub enum ReportStatus {
    #[sea_orm(num_value = 0)]
    #[default]
    Pending,
    #[sea_orm(num_value = 1)]
    Processed,
    #[sea_orm(num_value = 2)]
    Rejected,
}

impl ReportStatus {
    /// Numeric code used on the dashboard query string.
    #[must_use]
    pub const fn code(&self) -> i16 {
        match self {
            Self::Pending => 0,
            Self::Processed => 1,
            Self::Rejected => 2,
        }
    }

    /// Parse the numeric code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Pending),
            1 => Some(Self::Processed),
            2 => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Whether the report has been resolved.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl From<ReportStatus> for i16 {
    fn from(status: ReportStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i16> for ReportStatus {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown report status {code}"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Person who filed the report
    pub reporter_id: String,

    /// Person ID or article ID depending on `report_type`
    pub target_id: String,

    pub report_type: ReportType,

    #[sea_orm(column_type = "Text")]
    pub reason: String,

    pub status: ReportStatus,

    /// Admin person who resolved the report
    #[sea_orm(nullable)]
    pub resolver_id: Option<String>,

    #[sea_orm(nullable)]
    pub process_time: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::person::Entity",
        from = "Column::ReporterId",
        to = "super::person::Column::Id",
        on_delete = "Cascade"
    )]
    Reporter,
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_as_code() {
        assert_eq!(serde_json::to_string(&ReportStatus::Processed).unwrap(), "1");
        assert_eq!(
            serde_json::from_str::<ReportStatus>("2").unwrap(),
            ReportStatus::Rejected
        );
        assert!(serde_json::from_str::<ReportStatus>("7").is_err());
        assert!(serde_json::from_str::<ReportStatus>("\"pending\"").is_err());
    }
}
