//! Report moderation service.
//!
//! Reports move from `Pending` to either `Processed` or `Rejected` and never
//! leave those states. Listing resolves a human-readable label for each
//! target with one lookup per target kind per page.

use std::collections::HashMap;

use crate::services::notification::NotificationService;
use chrono::Utc;
use matrix_common::{AppError, AppResult, IdGenerator, PageRequest, Paged};
use matrix_db::{
    entities::{
        notification::kind,
        report::{self, ReportStatus, ReportType},
    },
    repositories::{ArticleRepository, PersonRepository, ReportFilter, ReportRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Longest accepted reason, in characters.
const MAX_REASON_CHARS: usize = 500;

/// Characters of article content shown as a report target label.
const SNIPPET_CHARS: usize = 50;

/// Input for filing a report.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportInput {
    #[validate(length(min = 1, max = 64))]
    pub target_id: String,
    pub report_type: ReportType,
    pub reason: String,
}

/// A report with its target's display label.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    #[serde(flatten)]
    pub report: report::Model,
    /// Display name for user reports, content snippet for article reports.
    /// `None` when the target no longer exists.
    pub target_display: Option<String>,
}

/// Report service for business logic.
#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    person_repo: PersonRepository,
    article_repo: ArticleRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(
        report_repo: ReportRepository,
        person_repo: PersonRepository,
        article_repo: ArticleRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            report_repo,
            person_repo,
            article_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// File a report.
    pub async fn create_report(
        &self,
        reporter_id: &str,
        input: CreateReportInput,
    ) -> AppResult<report::Model> {
        input.validate()?;

        let reason = input.reason.trim();
        let reason_len = reason.chars().count();
        if reason_len == 0 || reason_len > MAX_REASON_CHARS {
            return Err(AppError::validation(
                "reason",
                format!("must be 1 to {MAX_REASON_CHARS} characters"),
            ));
        }

        match input.report_type {
            ReportType::User => {
                if input.target_id == reporter_id {
                    return Err(AppError::BadRequest("Cannot report yourself".to_string()));
                }
                if !self.person_repo.exists(&input.target_id).await? {
                    return Err(AppError::NotFound(format!(
                        "Person {} not found",
                        input.target_id
                    )));
                }
            }
            ReportType::Article => {
                let article = self
                    .article_repo
                    .find_visible(&input.target_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Article {} not found", input.target_id))
                    })?;
                if article.author_id == reporter_id {
                    return Err(AppError::BadRequest(
                        "Cannot report your own article".to_string(),
                    ));
                }
            }
        }

        if self
            .has_pending_report(reporter_id, &input.target_id, input.report_type)
            .await?
        {
            return Err(AppError::Conflict(
                "You already have a pending report for this target".to_string(),
            ));
        }

        let model = report::ActiveModel {
            id: Set(self.id_gen.generate()),
            reporter_id: Set(reporter_id.to_string()),
            target_id: Set(input.target_id),
            report_type: Set(input.report_type),
            reason: Set(reason.to_string()),
            status: Set(ReportStatus::Pending),
            resolver_id: Set(None),
            process_time: Set(None),
            created_at: Set(Utc::now().into()),
        };

        let created = self.report_repo.create(model).await?;

        tracing::info!(
            report_id = %created.id,
            reporter_id = %reporter_id,
            target_id = %created.target_id,
            report_type = ?created.report_type,
            "Report filed"
        );

        Ok(created)
    }

    /// Whether an identical report is still waiting for an admin.
    pub async fn has_pending_report(
        &self,
        reporter_id: &str,
        target_id: &str,
        report_type: ReportType,
    ) -> AppResult<bool> {
        self.report_repo
            .has_pending(reporter_id, target_id, report_type)
            .await
    }

    /// Mark a pending report processed.
    pub async fn process_report(&self, report_id: &str, admin_id: &str) -> AppResult<report::Model> {
        self.resolve(report_id, admin_id, ReportStatus::Processed)
            .await
    }

    /// Mark a pending report rejected.
    pub async fn reject_report(&self, report_id: &str, admin_id: &str) -> AppResult<report::Model> {
        self.resolve(report_id, admin_id, ReportStatus::Rejected)
            .await
    }

    async fn resolve(
        &self,
        report_id: &str,
        admin_id: &str,
        status: ReportStatus,
    ) -> AppResult<report::Model> {
        let report = self
            .report_repo
            .find_by_id(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {report_id} not found")))?;

        if report.status.is_terminal() {
            return Err(AppError::BadRequest(
                "Report has already been resolved".to_string(),
            ));
        }

        if self.report_repo.resolve(report_id, status, admin_id).await? == 0 {
            return Err(AppError::BadRequest(
                "Report has already been resolved".to_string(),
            ));
        }

        tracing::info!(report_id = %report_id, admin_id = %admin_id, status = ?status, "Report resolved");

        self.notification_service
            .notify(
                &report.reporter_id,
                admin_id,
                kind::REPORT_RESOLVED,
                Some(report_id),
            )
            .await;

        Ok(report::Model {
            status,
            resolver_id: Some(admin_id.to_string()),
            process_time: Some(Utc::now().into()),
            ..report
        })
    }

    /// Get one report with its target label.
    pub async fn get_report(&self, report_id: &str) -> AppResult<Option<ReportView>> {
        let Some(report) = self.report_repo.find_by_id(report_id).await? else {
            return Ok(None);
        };

        let mut views = self.attach_targets(vec![report]).await?;
        Ok(views.pop())
    }

    /// The moderation queue, newest first.
    pub async fn get_reports(
        &self,
        filter: &ReportFilter,
        page: PageRequest,
    ) -> AppResult<Paged<ReportView>> {
        let (items, total) = self.report_repo.find_filtered(filter, page).await?;
        let views = self.attach_targets(items).await?;
        Ok(Paged::new(views, page, total))
    }

    /// Reports still waiting for an admin.
    pub async fn count_pending_reports(&self) -> AppResult<u64> {
        self.report_repo
            .count_by_status(ReportStatus::Pending)
            .await
    }

    async fn attach_targets(&self, reports: Vec<report::Model>) -> AppResult<Vec<ReportView>> {
        let ids_of = |wanted: ReportType| -> Vec<String> {
            let mut ids: Vec<String> = reports
                .iter()
                .filter(|r| r.report_type == wanted)
                .map(|r| r.target_id.clone())
                .collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        };

        let person_ids = ids_of(ReportType::User);
        let article_ids = ids_of(ReportType::Article);

        let names: HashMap<String, String> = self
            .person_repo
            .find_by_ids(&person_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p.display_name))
            .collect();

        let snippets: HashMap<String, String> = self
            .article_repo
            .find_by_ids(&article_ids)
            .await?
            .into_iter()
            .map(|a| (a.id, snippet(&a.content)))
            .collect();

        Ok(reports
            .into_iter()
            .map(|report| {
                let target_display = match report.report_type {
                    ReportType::User => names.get(&report.target_id).cloned(),
                    ReportType::Article => snippets.get(&report.target_id).cloned(),
                };
                ReportView {
                    report,
                    target_display,
                }
            })
            .collect())
    }
}

/// First characters of `content`, with an ellipsis when cut.
fn snippet(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use matrix_db::{
        entities::{article, notification, person},
        repositories::NotificationRepository,
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_report(id: &str, target: &str, kind_: ReportType, status: ReportStatus) -> report::Model {
        report::Model {
            id: id.to_string(),
            reporter_id: "p1".to_string(),
            target_id: target.to_string(),
            report_type: kind_,
            reason: "spam".to_string(),
            status,
            resolver_id: None,
            process_time: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_person(id: &str, name: &str) -> person::Model {
        person::Model {
            id: id.to_string(),
            display_name: name.to_string(),
            bio: None,
            avatar_url: None,
            banner_url: None,
            is_private: false,
            wallet_address: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_article(id: &str, content: &str) -> article::Model {
        article::Model {
            id: id.to_string(),
            author_id: "p9".to_string(),
            content: content.to_string(),
            praise_count: 0,
            collect_count: 0,
            is_deleted: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_notification() -> notification::Model {
        notification::Model {
            id: "n1".to_string(),
            receiver_id: "p1".to_string(),
            sender_id: Some("admin".to_string()),
            notification_type: kind::REPORT_RESOLVED,
            related_id: Some("r1".to_string()),
            content: None,
            is_read: false,
            sent_time: Utc::now().into(),
            read_time: None,
        }
    }

    fn empty() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    fn count(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }
    }

    fn service(
        report_db: MockDatabase,
        person_db: MockDatabase,
        article_db: MockDatabase,
        notif_db: MockDatabase,
    ) -> ReportService {
        ReportService::new(
            ReportRepository::new(Arc::new(report_db.into_connection())),
            PersonRepository::new(Arc::new(person_db.into_connection())),
            ArticleRepository::new(Arc::new(article_db.into_connection())),
            NotificationService::new(
                NotificationRepository::new(Arc::new(notif_db.into_connection())),
                PersonRepository::new(Arc::new(
                    MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
                )),
            ),
        )
    }

    fn input(target: &str, report_type: ReportType, reason: &str) -> CreateReportInput {
        CreateReportInput {
            target_id: target.to_string(),
            report_type,
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_snippet() {
        assert_eq!(snippet("short"), "short");

        let long = "a".repeat(60);
        let cut = snippet(&long);
        assert_eq!(cut.chars().count(), SNIPPET_CHARS + 1);
        assert!(cut.ends_with('…'));

        assert_eq!(snippet(&"b".repeat(SNIPPET_CHARS)), "b".repeat(SNIPPET_CHARS));
    }

    #[tokio::test]
    async fn test_cannot_report_self() {
        let service = service(empty(), empty(), empty(), empty());

        let result = service
            .create_report("p1", input("p1", ReportType::User, "spam"))
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_blank_reason_rejected() {
        let service = service(empty(), empty(), empty(), empty());

        let result = service
            .create_report("p1", input("p2", ReportType::User, "   "))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = service
            .create_report("p1", input("p2", ReportType::User, &"x".repeat(501)))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_pending_report_conflicts() {
        let service = service(
            empty().append_query_results([[count(1)]]),
            empty().append_query_results([[create_test_person("p2", "Bob")]]),
            empty(),
            empty(),
        );

        let result = service
            .create_report("p1", input("p2", ReportType::User, "spam"))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_report() {
        let service = service(
            empty()
                .append_query_results([[count(0)]])
                .append_query_results([[create_test_report(
                    "r1",
                    "a1",
                    ReportType::Article,
                    ReportStatus::Pending,
                )]]),
            empty(),
            empty().append_query_results([[create_test_article("a1", "hello")]]),
            empty(),
        );

        let created = service
            .create_report("p1", input("a1", ReportType::Article, "  spam  "))
            .await
            .unwrap();
        assert_eq!(created.status, ReportStatus::Pending);
    }

    #[tokio::test]
    async fn test_process_missing_report() {
        let service = service(
            empty().append_query_results([Vec::<report::Model>::new()]),
            empty(),
            empty(),
            empty(),
        );

        let result = service.process_report("missing", "admin").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_resolved_report_stays_resolved() {
        let service = service(
            empty().append_query_results([[create_test_report(
                "r1",
                "p2",
                ReportType::User,
                ReportStatus::Processed,
            )]]),
            empty(),
            empty(),
            empty(),
        );

        let result = service.reject_report("r1", "admin").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_process_report() {
        let service = service(
            empty()
                .append_query_results([[create_test_report(
                    "r1",
                    "p2",
                    ReportType::User,
                    ReportStatus::Pending,
                )]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
            empty(),
            empty(),
            empty().append_query_results([[create_test_notification()]]),
        );

        let processed = service.process_report("r1", "admin").await.unwrap();
        assert_eq!(processed.status, ReportStatus::Processed);
        assert_eq!(processed.resolver_id.as_deref(), Some("admin"));
        assert!(processed.process_time.is_some());
    }

    #[tokio::test]
    async fn test_get_reports_resolves_targets() {
        let long = "x".repeat(80);
        let service = service(
            empty()
                .append_query_results([[count(2)]])
                .append_query_results([[
                    create_test_report("r1", "p2", ReportType::User, ReportStatus::Pending),
                    create_test_report("r2", "a1", ReportType::Article, ReportStatus::Pending),
                ]]),
            empty().append_query_results([[create_test_person("p2", "Bob")]]),
            empty().append_query_results([[create_test_article("a1", &long)]]),
            empty(),
        );

        let page = service
            .get_reports(&ReportFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].target_display.as_deref(), Some("Bob"));
        assert!(page.items[1]
            .target_display
            .as_deref()
            .unwrap()
            .ends_with('…'));
    }
}
