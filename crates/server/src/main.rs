//! Matrix server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{Router, middleware};
use matrix_api::{AppState, create_post_router, middleware::auth_middleware, router as api_router};
use matrix_common::{Config, LocalStorage, StorageBackend};
use matrix_core::{
    ActivityLogService, ArticleService, AuthService, DashboardService, FollowService,
    FriendshipService, HashtagService, MessagingService, NftService, NotificationService,
    PersonService, PraiseCollectService, ReportService,
};
use matrix_db::repositories::{
    AdminActivityLogRepository, ArticleRepository, FollowRepository, FriendshipRepository,
    HashtagRepository, MessageRepository, NftRepository, NotificationRepository,
    PersonRepository, PraiseCollectRepository, ReportRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Room for multipart boundaries and the text fields of the post form.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "matrix=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wire repositories and services over one connection pool.
fn build_state(config: &Config, db: sea_orm::DatabaseConnection) -> anyhow::Result<AppState> {
    let db = Arc::new(db);

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let person_repo = PersonRepository::new(Arc::clone(&db));
    let follow_repo = FollowRepository::new(Arc::clone(&db));
    let friendship_repo = FriendshipRepository::new(Arc::clone(&db));
    let report_repo = ReportRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let praise_collect_repo = PraiseCollectRepository::new(Arc::clone(&db));
    let article_repo = ArticleRepository::new(Arc::clone(&db));
    let hashtag_repo = HashtagRepository::new(Arc::clone(&db));
    let message_repo = MessageRepository::new(Arc::clone(&db));
    let nft_repo = NftRepository::new(Arc::clone(&db));
    let log_repo = AdminActivityLogRepository::new(Arc::clone(&db));

    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::from_config(&config.storage));

    // Initialize services
    let notification_service = NotificationService::new(notification_repo.clone(), person_repo.clone());
    let auth_service = AuthService::new(user_repo.clone(), &config.auth)
        .context("Failed to create auth service")?;
    let person_service = PersonService::new(person_repo.clone());
    let follow_service = FollowService::new(
        follow_repo,
        person_repo.clone(),
        notification_service.clone(),
    );
    let friendship_service = FriendshipService::new(
        friendship_repo,
        person_repo.clone(),
        notification_service.clone(),
    );
    let report_service = ReportService::new(
        report_repo.clone(),
        person_repo.clone(),
        article_repo.clone(),
        notification_service.clone(),
    );
    let praise_collect_service = PraiseCollectService::new(
        praise_collect_repo,
        article_repo.clone(),
        notification_service.clone(),
    );
    let article_service = ArticleService::new(
        article_repo.clone(),
        hashtag_repo.clone(),
        storage,
        &config.uploads,
    );
    let hashtag_service = HashtagService::new(hashtag_repo);
    let messaging_service =
        MessagingService::new(message_repo, person_repo, notification_service.clone());
    let nft_service = NftService::new(nft_repo);
    let activity_log_service = ActivityLogService::new(log_repo);
    let dashboard_service =
        DashboardService::new(user_repo, article_repo, report_repo, notification_repo);

    Ok(AppState {
        auth_service,
        person_service,
        follow_service,
        friendship_service,
        report_service,
        notification_service,
        praise_collect_service,
        article_service,
        hashtag_service,
        messaging_service,
        nft_service,
        activity_log_service,
        dashboard_service,
        cookie_secure: config.auth.cookie_secure,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    init_tracing(config.logging.json);
    info!("Starting Matrix server...");

    // Connect to database
    let db = matrix_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    matrix_db::migrate(&db).await?;
    info!("Migrations completed");

    let state = build_state(&config, db)?;

    let body_limit = config.uploads.max_files * config.uploads.max_file_size as usize
        + FORM_OVERHEAD_BYTES;

    // Build router
    let mut app = Router::new()
        .nest("/api", api_router(state.clone()))
        .merge(create_post_router(body_limit));

    // Serve uploads ourselves unless they live on another host
    let files_mount = config.storage.base_url.trim_end_matches('/');
    if files_mount.starts_with('/') {
        app = app.nest_service(files_mount, ServeDir::new(&config.storage.base_path));
    }

    let app = app
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shut down gracefully");
    Ok(())
}
