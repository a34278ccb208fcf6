//! JWT issuance and verification for the `AuthToken` cookie.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult, config::AuthConfig};

/// Claims carried by an auth token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    /// Person ID owned by the user.
    pub pid: String,
    /// Role name (`user` or `admin`).
    pub role: String,
    /// Issuer.
    pub iss: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

/// Signs and validates HS256 tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// Create a service from a shared secret and issuer.
    #[must_use]
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
        }
    }

    /// Create a service from the auth configuration.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_key, config.jwt_issuer.clone())
    }

    /// Issue a token valid for `ttl`.
    pub fn issue(
        &self,
        user_id: &str,
        person_id: &str,
        role: &str,
        ttl: Duration,
    ) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            pid: person_id.to_string(),
            role: role.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify signature, issuer and expiry.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[self.issuer.as_str()]);

        match jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                if e.kind() == &ErrorKind::ExpiredSignature {
                    tracing::debug!("Rejected expired auth token");
                } else {
                    tracing::debug!(error = %e, "Rejected invalid auth token");
                }
                Err(AppError::Unauthorized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let jwt = JwtService::new("test-secret", "matrix");
        let token = jwt
            .issue("user1", "person1", "admin", Duration::hours(1))
            .unwrap();

        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.sub, "user1");
        assert_eq!(claims.pid, "person1");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.iss, "matrix");
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let jwt = JwtService::new("test-secret", "matrix");
        let token = jwt
            .issue("user1", "person1", "user", Duration::hours(-2))
            .unwrap();

        assert!(matches!(jwt.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_wrong_issuer_or_key_is_rejected() {
        let issuer_a = JwtService::new("test-secret", "matrix");
        let issuer_b = JwtService::new("test-secret", "someone-else");
        let other_key = JwtService::new("other-secret", "matrix");

        let token = issuer_a
            .issue("user1", "person1", "user", Duration::hours(1))
            .unwrap();

        assert!(issuer_b.verify(&token).is_err());
        assert!(other_key.verify(&token).is_err());
    }
}
