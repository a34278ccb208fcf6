//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_person_table;
mod m20250101_000002_create_user_table;
mod m20250101_000003_create_article_table;
mod m20250101_000004_create_article_attachment_table;
mod m20250101_000005_create_hashtag_tables;
mod m20250101_000006_create_follow_table;
mod m20250101_000007_create_friendship_table;
mod m20250101_000008_create_report_table;
mod m20250101_000009_create_notification_table;
mod m20250101_000010_create_praise_collect_table;
mod m20250101_000011_create_admin_activity_log_table;
mod m20250101_000012_create_message_table;
mod m20250101_000013_create_nft_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_person_table::Migration),
            Box::new(m20250101_000002_create_user_table::Migration),
            Box::new(m20250101_000003_create_article_table::Migration),
            Box::new(m20250101_000004_create_article_attachment_table::Migration),
            Box::new(m20250101_000005_create_hashtag_tables::Migration),
            Box::new(m20250101_000006_create_follow_table::Migration),
            Box::new(m20250101_000007_create_friendship_table::Migration),
            Box::new(m20250101_000008_create_report_table::Migration),
            Box::new(m20250101_000009_create_notification_table::Migration),
            Box::new(m20250101_000010_create_praise_collect_table::Migration),
            Box::new(m20250101_000011_create_admin_activity_log_table::Migration),
            Box::new(m20250101_000012_create_message_table::Migration),
            Box::new(m20250101_000013_create_nft_table::Migration),
        ]
    }
}
