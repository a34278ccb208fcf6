//! Repositories: one per aggregate, each wrapping the shared connection.

mod admin_activity_log;
mod article;
mod follow;
mod friendship;
mod hashtag;
mod message;
mod nft;
mod notification;
mod person;
mod praise_collect;
mod report;
mod user;

pub use admin_activity_log::{ActivityLogFilter, AdminActivityLogRepository};
pub use article::ArticleRepository;
pub use follow::FollowRepository;
pub use friendship::FriendshipRepository;
pub use hashtag::HashtagRepository;
pub use message::MessageRepository;
pub use nft::NftRepository;
pub use notification::NotificationRepository;
pub use person::PersonRepository;
pub use praise_collect::{PraiseCollectRepository, ToggleOutcome};
pub use report::{ReportFilter, ReportRepository};
pub use user::UserRepository;
