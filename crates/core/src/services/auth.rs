//! Authentication service: registration, password and Google logins, tokens.

use std::time::Duration as StdDuration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use matrix_common::{
    AppError, AppResult, Claims, IdGenerator, JwtService,
    config::{AuthConfig, GoogleOAuthConfig},
};
use matrix_db::{
    entities::{
        person,
        user::{self, UserRole},
    },
    repositories::UserRepository,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use url::Url;
use validator::{Validate, ValidationError};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Input for creating an account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(
        length(min = 3, max = 32, message = "must be 3 to 32 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(length(min = 8, max = 128, message = "must be 8 to 128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub display_name: Option<String>,
    #[serde(default)]
    pub remember_me: bool,
}

/// Input for a password login.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    /// Email address or username.
    #[serde(alias = "email", alias = "username")]
    #[validate(length(min = 1, max = 254))]
    pub identifier: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: user::Model,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Whether the session should outlive the browser.
    pub remember_me: bool,
}

/// Who is asking, as far as the auth cookie says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub person_id: Option<String>,
    pub role: Option<String>,
    pub culture: Option<String>,
}

/// Profile returned by Google's userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Google OAuth 2.0 authorization-code client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl GoogleOAuthClient {
    /// Create a client from its configuration.
    pub fn new(config: &GoogleOAuthConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(10))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url: config.redirect_url.clone(),
        })
    }

    /// URL the browser is sent to for consent.
    pub fn authorize_url(&self, state: &str) -> AppResult<String> {
        let url = Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to build authorize URL: {e}")))?;

        Ok(url.into())
    }

    /// Exchange an authorization code and fetch the user's profile.
    pub async fn fetch_profile(&self, code: &str) -> AppResult<GoogleProfile> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http_client
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Google token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %body, "Google rejected authorization code");
            return Err(AppError::Unauthorized);
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse Google token response: {e}"))
        })?;

        let response = self
            .http_client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Google userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Google userinfo error: {}",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse Google userinfo: {e}"))
        })
    }
}

/// Authentication service for business logic.
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt: JwtService,
    google: Option<GoogleOAuthClient>,
    session_ttl: Duration,
    remember_ttl: Duration,
    id_gen: IdGenerator,
}

impl AuthService {
    /// Create a new auth service.
    pub fn new(user_repo: UserRepository, config: &AuthConfig) -> AppResult<Self> {
        let google = config
            .google
            .as_ref()
            .map(GoogleOAuthClient::new)
            .transpose()?;

        Ok(Self {
            user_repo,
            jwt: JwtService::from_config(config),
            google,
            session_ttl: Duration::hours(config.session_hours),
            remember_ttl: Duration::days(config.remember_days),
            id_gen: IdGenerator::new(),
        })
    }

    /// Create an account and sign it in.
    pub async fn register(&self, input: RegisterInput) -> AppResult<LoginOutcome> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        let username = input.username.trim().to_string();

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }
        if self.user_repo.find_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let display_name = input
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&username)
            .to_string();

        let (_, user) = self
            .create_account(email, username, display_name, Some(password_hash), None)
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");

        self.issue_session(user, input.remember_me)
    }

    /// Log in with email or username and password.
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginOutcome> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_login(&input.identifier)
            .await?
            .ok_or(AppError::Unauthorized)?;

        // OAuth-only accounts have no password to check
        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AppError::Unauthorized);
        };

        if !verify_password(&input.password, hash)? {
            return Err(AppError::Unauthorized);
        }

        if !user.is_active {
            return Err(AppError::Forbidden("Account is disabled".to_string()));
        }

        self.user_repo.touch_last_login(&user.id).await?;
        tracing::info!(user_id = %user.id, "User logged in");

        self.issue_session(user, input.remember_me)
    }

    /// Google consent URL, or `BadRequest` when Google login is off.
    pub fn google_authorize_url(&self, state: &str) -> AppResult<String> {
        self.google_client()?.authorize_url(state)
    }

    /// Complete a Google login.
    ///
    /// Links by Google subject first, then by verified email; otherwise a
    /// new account is created.
    pub async fn login_with_google(&self, code: &str) -> AppResult<LoginOutcome> {
        let profile = self.google_client()?.fetch_profile(code).await?;
        self.login_with_google_profile(profile).await
    }

    async fn login_with_google_profile(&self, profile: GoogleProfile) -> AppResult<LoginOutcome> {
        let user = if let Some(user) = self.user_repo.find_by_google_subject(&profile.sub).await? {
            user
        } else {
            let verified_email = profile
                .email
                .as_deref()
                .filter(|_| profile.email_verified)
                .map(str::to_lowercase)
                .ok_or_else(|| {
                    AppError::BadRequest("Google account has no verified email".to_string())
                })?;

            if let Some(existing) = self.user_repo.find_by_email(&verified_email).await? {
                let mut active: user::ActiveModel = existing.into();
                active.google_subject = Set(Some(profile.sub.clone()));
                let linked = self.user_repo.update(active).await?;
                tracing::info!(user_id = %linked.id, "Linked Google account");
                linked
            } else {
                let username = self.unique_username(&verified_email).await?;
                let display_name = profile
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| username.clone());

                let (_, user) = self
                    .create_account(
                        verified_email,
                        username,
                        display_name,
                        None,
                        Some(profile.sub.clone()),
                    )
                    .await?;
                tracing::info!(user_id = %user.id, "Registered user via Google");
                user
            }
        };

        if !user.is_active {
            return Err(AppError::Forbidden("Account is disabled".to_string()));
        }

        self.user_repo.touch_last_login(&user.id).await?;
        self.issue_session(user, true)
    }

    /// Verify an auth token.
    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        self.jwt.verify(token)
    }

    /// Describe the caller.
    #[must_use]
    pub fn auth_status(&self, claims: Option<&Claims>, culture: Option<String>) -> AuthStatus {
        match claims {
            Some(claims) => AuthStatus {
                authenticated: true,
                user_id: Some(claims.sub.clone()),
                person_id: Some(claims.pid.clone()),
                role: Some(claims.role.clone()),
                culture,
            },
            None => AuthStatus {
                authenticated: false,
                user_id: None,
                person_id: None,
                role: None,
                culture,
            },
        }
    }

    /// Random value for the OAuth `state` parameter.
    #[must_use]
    pub fn generate_state(&self) -> String {
        self.id_gen.generate_token()
    }

    fn google_client(&self) -> AppResult<&GoogleOAuthClient> {
        self.google
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("Google login is not configured".to_string()))
    }

    fn issue_session(&self, user: user::Model, remember_me: bool) -> AppResult<LoginOutcome> {
        let ttl = if remember_me {
            self.remember_ttl
        } else {
            self.session_ttl
        };

        let token = self
            .jwt
            .issue(&user.id, &user.person_id, user.role.as_str(), ttl)?;

        Ok(LoginOutcome {
            user,
            token,
            expires_at: Utc::now() + ttl,
            remember_me,
        })
    }

    async fn create_account(
        &self,
        email: String,
        username: String,
        display_name: String,
        password_hash: Option<String>,
        google_subject: Option<String>,
    ) -> AppResult<(person::Model, user::Model)> {
        let now = Utc::now();
        let person_id = self.id_gen.generate();

        let person = person::ActiveModel {
            id: Set(person_id.clone()),
            display_name: Set(display_name),
            bio: Set(None),
            avatar_url: Set(None),
            banner_url: Set(None),
            is_private: Set(false),
            wallet_address: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let user = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            person_id: Set(person_id),
            email: Set(email),
            username_lower: Set(username.to_lowercase()),
            username: Set(username),
            password_hash: Set(password_hash),
            google_subject: Set(google_subject),
            role: Set(UserRole::User),
            is_active: Set(true),
            created_at: Set(now.into()),
            last_login_at: Set(None),
        };

        self.user_repo.create_with_person(person, user).await
    }

    /// Username derived from the email's local part, suffixed until free.
    async fn unique_username(&self, email: &str) -> AppResult<String> {
        let base = username_from_email(email);
        if self.user_repo.find_by_username(&base).await?.is_none() {
            return Ok(base);
        }

        for _ in 0..5 {
            let token = self.id_gen.generate_token();
            let candidate = format!("{base}_{}", &token[..6]);
            if self.user_repo.find_by_username(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }

        Err(AppError::Conflict(
            "Could not allocate a username".to_string(),
        ))
    }
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        let mut err = ValidationError::new("username");
        err.message = Some("may only contain letters, digits and underscores".into());
        Err(err)
    }
}

fn username_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let mut name: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(24)
        .collect();

    if name.len() < 3 {
        name.push_str("user");
    }
    name
}

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
