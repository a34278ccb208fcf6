//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use matrix_common::{AppError, Claims};
use matrix_db::entities::user::UserRole;

use crate::middleware::client_ip;

/// The caller, as established by the auth middleware from a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: String,
    pub person_id: String,
    pub role: UserRole,
    pub claims: Claims,
}

impl CurrentUser {
    /// Build from verified claims. Unknown roles fall back to `user`.
    #[must_use]
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            person_id: claims.pid.clone(),
            role: UserRole::from_name(&claims.role).unwrap_or_default(),
            claims,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Request-scoped UI culture read from the `.AspNetCore.Culture` cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<CurrentUser>().cloned()))
    }
}

/// Authenticated admin. Guests get 401, non-admins 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(Self(user))
    }
}

/// Culture extractor; `None` when no culture cookie was sent.
#[derive(Debug, Clone)]
pub struct Culture(pub Option<String>);

impl<S> FromRequestParts<S> for Culture
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Locale>().map(|l| l.0.clone())))
    }
}

/// Client address for logging: `X-Forwarded-For` or the peer address.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(client_ip(&parts.headers, &parts.extensions)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: &str) -> Claims {
        Claims {
            sub: "u1".to_string(),
            pid: "p1".to_string(),
            role: role.to_string(),
            iss: "matrix".to_string(),
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn test_current_user_from_claims() {
        let user = CurrentUser::from_claims(claims("admin"));
        assert_eq!(user.user_id, "u1");
        assert_eq!(user.person_id, "p1");
        assert!(user.is_admin());

        let user = CurrentUser::from_claims(claims("superuser"));
        assert_eq!(user.role, UserRole::User);
        assert!(!user.is_admin());
    }
}
