//! Database entities.

#![allow(missing_docs)]

pub mod admin_activity_log;
pub mod article;
pub mod article_attachment;
pub mod article_hashtag;
pub mod follow;
pub mod friendship;
pub mod hashtag;
pub mod message;
pub mod nft;
pub mod notification;
pub mod person;
pub mod praise_collect;
pub mod report;
pub mod user;

pub use admin_activity_log::Entity as AdminActivityLog;
pub use article::Entity as Article;
pub use article_attachment::Entity as ArticleAttachment;
pub use article_hashtag::Entity as ArticleHashtag;
pub use follow::Entity as Follow;
pub use friendship::Entity as Friendship;
pub use hashtag::Entity as Hashtag;
pub use message::Entity as Message;
pub use nft::Entity as Nft;
pub use notification::Entity as Notification;
pub use person::Entity as Person;
pub use praise_collect::Entity as PraiseCollect;
pub use report::Entity as Report;
pub use user::Entity as User;
