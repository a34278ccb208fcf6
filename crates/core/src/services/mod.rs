//! Business logic services.

#![allow(missing_docs)]

pub mod activity_log;
pub mod article;
pub mod auth;
pub mod dashboard;
pub mod follow;
pub mod friendship;
pub mod hashtag;
pub mod messaging;
pub mod nft;
pub mod notification;
pub mod person;
pub mod praise_collect;
pub mod report;

use chrono::{DateTime, Duration, Utc};
use matrix_common::{AppError, AppResult};

/// Longest retention window the cleanup endpoints accept.
pub const MAX_RETENTION_DAYS: i64 = 36_500;

/// Cutoff for a retention cleanup: rows older than `days` days.
pub(crate) fn retention_cutoff(days: i64) -> AppResult<DateTime<Utc>> {
    if !(1..=MAX_RETENTION_DAYS).contains(&days) {
        return Err(AppError::validation(
            "days",
            format!("must be between 1 and {MAX_RETENTION_DAYS}"),
        ));
    }

    Duration::try_days(days)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .ok_or_else(|| AppError::validation("days", "out of range"))
}

pub use activity_log::{ActivityLogService, RecordActivityInput};
pub use article::{ArticleService, ArticleView, CreateArticleInput, UploadInput};
pub use auth::{
    AuthService, AuthStatus, GoogleOAuthClient, GoogleProfile, LoginInput, LoginOutcome,
    RegisterInput, hash_password, verify_password,
};
pub use dashboard::{DashboardService, DashboardStats};
pub use follow::FollowService;
pub use friendship::{FriendshipService, FriendshipStatusView};
pub use hashtag::HashtagService;
pub use messaging::{MessagingService, SendMessageInput};
pub use nft::{AddNftInput, NftService};
pub use notification::NotificationService;
pub use person::{PersonService, UpdateProfileInput};
pub use praise_collect::{PraiseCollectService, ToggleResult};
pub use report::{CreateReportInput, ReportService, ReportView};
