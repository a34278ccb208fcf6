//! Authentication endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use matrix_common::{AppError, AppResult};
use matrix_core::{AuthStatus, LoginInput, LoginOutcome, RegisterInput};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{ClientIp, Culture, MaybeAuthUser},
    middleware::{AUTH_COOKIE, AppState, elapsed_ms},
    response::ApiResponse,
};

/// Cookie holding the OAuth `state` between the redirect and the callback.
const OAUTH_STATE_COOKIE: &str = "OAuthState";

const LOGIN_PATH: &str = "/api/login";

/// Register/login response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
}

impl AuthResponse {
    fn success(outcome: &LoginOutcome) -> Self {
        Self {
            success: true,
            errors: None,
            user_id: Some(outcome.user.id.clone()),
            person_id: Some(outcome.user.person_id.clone()),
        }
    }
}

/// Google callback query.
#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Build the session cookie. Remembered sessions persist until the token
/// expires; others end with the browser.
fn session_cookie(outcome: &LoginOutcome, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((AUTH_COOKIE, outcome.token.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict);

    if outcome.remember_me {
        let seconds = (outcome.expires_at - Utc::now()).num_seconds().max(0);
        cookie = cookie.max_age(time::Duration::seconds(seconds));
    }

    cookie.build()
}

/// Render a failed register/login as `{ success: false, errors }`.
///
/// Server errors keep the standard error body.
fn auth_failure(error: AppError) -> Response {
    if error.is_server_error() {
        return error.into_response();
    }

    let errors = match &error {
        AppError::Validation(fields) => fields
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field}: {m}")))
            .collect(),
        AppError::Unauthorized => vec!["Invalid username or password".to_string()],
        other => vec![other.public_message()],
    };

    let body = AuthResponse {
        success: false,
        errors: Some(errors),
        user_id: None,
        person_id: None,
    };
    (error.status_code(), Json(body)).into_response()
}

/// Create an account and sign it in.
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterInput>,
) -> Response {
    match state.auth_service.register(req).await {
        Ok(outcome) => {
            let jar = jar.add(session_cookie(&outcome, state.cookie_secure));
            (jar, Json(AuthResponse::success(&outcome))).into_response()
        }
        Err(e) => auth_failure(e),
    }
}

/// Log in with email or username and password.
async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    jar: CookieJar,
    Json(req): Json<LoginInput>,
) -> Response {
    let started = Instant::now();
    let result = state.auth_service.login(req).await;

    let (user_id, error_message) = match &result {
        Ok(outcome) => (Some(outcome.user.id.clone()), None),
        Err(e) => (None, Some(e.to_string())),
    };
    state
        .activity_log_service
        .record_login(user_id, ip, LOGIN_PATH, elapsed_ms(started), error_message)
        .await;

    match result {
        Ok(outcome) => {
            let jar = jar.add(session_cookie(&outcome, state.cookie_secure));
            (jar, Json(AuthResponse::success(&outcome))).into_response()
        }
        Err(e) => auth_failure(e),
    }
}

/// Clear the session cookie.
async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

/// Who the caller is, plus their culture cookie.
async fn status(
    MaybeAuthUser(user): MaybeAuthUser,
    Culture(culture): Culture,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<AuthStatus>> {
    let claims = user.as_ref().map(|u| &u.claims);
    Ok(ApiResponse::ok(state.auth_service.auth_status(claims, culture)))
}

/// Redirect to Google's consent page.
async fn google(State(state): State<AppState>, jar: CookieJar) -> AppResult<impl IntoResponse> {
    let oauth_state = state.auth_service.generate_state();
    let url = state.auth_service.google_authorize_url(&oauth_state)?;

    let cookie = Cookie::build((OAUTH_STATE_COOKIE, oauth_state))
        .path("/api/auth")
        .http_only(true)
        .secure(state.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(10));

    Ok((jar.add(cookie), Redirect::to(&url)))
}

/// Finish a Google login and go to the home page.
async fn google_callback(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    jar: CookieJar,
    Query(query): Query<GoogleCallbackQuery>,
) -> AppResult<impl IntoResponse> {
    if let Some(error) = query.error {
        return Err(AppError::BadRequest(format!("Google login failed: {error}")));
    }

    let expected = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    if expected.is_none() || expected != query.state {
        return Err(AppError::BadRequest("Invalid OAuth state".to_string()));
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let started = Instant::now();
    let result = state.auth_service.login_with_google(&code).await;

    let (user_id, error_message) = match &result {
        Ok(outcome) => (Some(outcome.user.id.clone()), None),
        Err(e) => (None, Some(e.to_string())),
    };
    state
        .activity_log_service
        .record_login(
            user_id,
            ip,
            "/api/auth/google/callback",
            elapsed_ms(started),
            error_message,
        )
        .await;

    let outcome = result?;
    let jar = jar
        .remove(Cookie::build(OAUTH_STATE_COOKIE).path("/api/auth"))
        .add(session_cookie(&outcome, state.cookie_secure));

    Ok((jar, Redirect::to("/")))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/auth/status", get(status))
        .route("/auth/google", get(google))
        .route("/auth/google/callback", get(google_callback))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use matrix_db::entities::user::{self, UserRole};

    fn outcome(remember_me: bool) -> LoginOutcome {
        LoginOutcome {
            user: user::Model {
                id: "u1".to_string(),
                person_id: "p1".to_string(),
                email: "alice@example.com".to_string(),
                username: "alice".to_string(),
                username_lower: "alice".to_string(),
                password_hash: None,
                google_subject: None,
                role: UserRole::User,
                is_active: true,
                created_at: Utc::now().into(),
                last_login_at: None,
            },
            token: "token".to_string(),
            expires_at: Utc::now() + chrono::Duration::days(30),
            remember_me,
        }
    }

    #[test]
    fn test_session_cookie_flags() {
        let cookie = session_cookie(&outcome(false), true);
        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert!(cookie.max_age().is_none());
    }

    #[test]
    fn test_remembered_session_cookie_persists() {
        let cookie = session_cookie(&outcome(true), true);
        let max_age = cookie.max_age().unwrap();
        assert!(max_age > time::Duration::days(29));
    }

    #[test]
    fn test_auth_failure_status() {
        assert_eq!(
            auth_failure(AppError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            auth_failure(AppError::Conflict("taken".to_string())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            auth_failure(AppError::validation("email", "invalid")).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
