//! API middleware.

#![allow(missing_docs)]

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, OriginalUri, State},
    http::{Extensions, HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use matrix_core::{
    ActivityLogService, ArticleService, AuthService, DashboardService, FollowService,
    FriendshipService, HashtagService, MessagingService, NftService, NotificationService,
    PersonService, PraiseCollectService, RecordActivityInput, ReportService,
};

use crate::extractors::{CurrentUser, Locale};

/// Name of the session cookie.
pub const AUTH_COOKIE: &str = "AuthToken";

/// Name of the culture cookie.
pub const CULTURE_COOKIE: &str = ".AspNetCore.Culture";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub person_service: PersonService,
    pub follow_service: FollowService,
    pub friendship_service: FriendshipService,
    pub report_service: ReportService,
    pub notification_service: NotificationService,
    pub praise_collect_service: PraiseCollectService,
    pub article_service: ArticleService,
    pub hashtag_service: HashtagService,
    pub messaging_service: MessagingService,
    pub nft_service: NftService,
    pub activity_log_service: ActivityLogService,
    pub dashboard_service: DashboardService,
    /// Mark the session cookie `Secure`.
    pub cookie_secure: bool,
}

/// Authentication middleware.
///
/// Reads the token from the `AuthToken` cookie or a bearer header. A
/// valid token puts a [`CurrentUser`] into the request extensions; an
/// invalid one is ignored so the request continues as a guest.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());

    let token = jar
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| bearer_token(req.headers()));

    if let Some(token) = token {
        match state.auth_service.verify_token(&token) {
            Ok(claims) => {
                req.extensions_mut().insert(CurrentUser::from_claims(claims));
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring invalid auth token"),
        }
    }

    if let Some(locale) = jar.get(CULTURE_COOKIE).and_then(|c| parse_culture(c.value())) {
        req.extensions_mut().insert(Locale(locale));
    }

    next.run(req).await
}

/// Records every request it wraps into the admin activity log.
pub async fn activity_log_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();

    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| req.uri().path().to_string(), |uri| uri.path().to_string());
    let action_type = format!("{} {path}", req.method());
    let user_id = req
        .extensions()
        .get::<CurrentUser>()
        .map(|u| u.user_id.clone());
    let ip_address = client_ip(req.headers(), req.extensions());

    let response = next.run(req).await;

    let status = response.status();
    let is_successful = status.as_u16() < 400;
    let error_message = (!is_successful).then(|| {
        format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Request failed")
        )
    });

    let input = RecordActivityInput {
        user_id,
        action_type,
        ip_address,
        is_successful,
        page_path: path,
        duration_ms: elapsed_ms(started),
        error_message,
    };

    if let Err(e) = state.activity_log_service.record(input).await {
        tracing::warn!(error = %e, "Failed to record admin activity");
    }

    response
}

/// Milliseconds since `started`.
pub fn elapsed_ms(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}

/// Client address: first `X-Forwarded-For` hop, else the peer address.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<String> {
    forwarded_for(headers).or_else(|| {
        extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Parse a culture cookie value such as `c=en-US|uic=en-US`.
///
/// The value may arrive URL-encoded. The UI culture wins over the
/// formatting culture.
#[must_use]
pub fn parse_culture(value: &str) -> Option<String> {
    let decoded = urlencoding::decode(value).ok()?;

    let mut culture = None;
    let mut ui_culture = None;
    for part in decoded.split('|') {
        if let Some(v) = part.strip_prefix("uic=") {
            ui_culture = Some(v.trim());
        } else if let Some(v) = part.strip_prefix("c=") {
            culture = Some(v.trim());
        }
    }

    ui_culture
        .or(culture)
        .filter(|c| !c.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_parse_culture() {
        assert_eq!(parse_culture("c=en-US|uic=en-US").as_deref(), Some("en-US"));
        assert_eq!(parse_culture("c=zh-CN|uic=en-GB").as_deref(), Some("en-GB"));
        assert_eq!(parse_culture("c%3Dfr-FR%7Cuic%3Dfr-FR").as_deref(), Some("fr-FR"));
        assert_eq!(parse_culture("c=ja-JP").as_deref(), Some("ja-JP"));
        assert_eq!(parse_culture("garbage"), None);
        assert_eq!(parse_culture("c=|uic="), None);
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let req = Request::builder()
            .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap();
        assert_eq!(
            client_ip(req.headers(), req.extensions()).as_deref(),
            Some("203.0.113.7")
        );

        let mut req = Request::builder().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        assert_eq!(
            client_ip(req.headers(), req.extensions()).as_deref(),
            Some("127.0.0.1")
        );
    }
}
