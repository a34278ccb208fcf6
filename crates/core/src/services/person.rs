//! Person (profile) service.

use chrono::Utc;
use matrix_common::{AppError, AppResult};
use matrix_db::{entities::person, repositories::PersonRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Input for updating one's own profile. Absent fields are left alone;
/// an empty string clears an optional field.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub display_name: Option<String>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub bio: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    #[validate(url)]
    pub banner_url: Option<String>,
    pub is_private: Option<bool>,
    #[validate(custom(function = "validate_wallet_address"))]
    pub wallet_address: Option<String>,
}

/// Person service for business logic.
#[derive(Clone)]
pub struct PersonService {
    person_repo: PersonRepository,
}

impl PersonService {
    /// Create a new person service.
    #[must_use]
    pub const fn new(person_repo: PersonRepository) -> Self {
        Self { person_repo }
    }

    pub async fn get_person(&self, id: &str) -> AppResult<Option<person::Model>> {
        self.person_repo.find_by_id(id).await
    }

    /// Look up several persons at once. Unknown IDs are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<person::Model>> {
        self.person_repo.find_by_ids(ids).await
    }

    /// Update the caller's own profile.
    pub async fn update_profile(
        &self,
        person_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<person::Model> {
        // Blank optional fields mean "clear", so validate them trimmed
        let input = UpdateProfileInput {
            display_name: input.display_name.map(|n| n.trim().to_string()),
            bio: input.bio.map(|b| b.trim().to_string()),
            avatar_url: input.avatar_url.filter(|u| !u.trim().is_empty()),
            banner_url: input.banner_url.filter(|u| !u.trim().is_empty()),
            wallet_address: input.wallet_address.map(|w| w.trim().to_string()),
            is_private: input.is_private,
        };
        input.validate()?;

        let person = self
            .person_repo
            .find_by_id(person_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Person {person_id} not found")))?;

        let mut active: person::ActiveModel = person.into();

        if let Some(display_name) = input.display_name {
            active.display_name = Set(display_name);
        }
        if let Some(bio) = input.bio {
            active.bio = Set(Some(bio).filter(|b| !b.is_empty()));
        }
        if input.avatar_url.is_some() {
            active.avatar_url = Set(input.avatar_url);
        }
        if input.banner_url.is_some() {
            active.banner_url = Set(input.banner_url);
        }
        if let Some(is_private) = input.is_private {
            active.is_private = Set(is_private);
        }
        if let Some(wallet) = input.wallet_address {
            active.wallet_address = Set(Some(wallet.to_lowercase()).filter(|w| !w.is_empty()));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        let updated = self.person_repo.update(active).await?;
        tracing::debug!(person_id = %person_id, "Updated profile");
        Ok(updated)
    }
}

/// `0x` followed by 40 hex digits. Empty clears the address.
fn validate_wallet_address(address: &str) -> Result<(), ValidationError> {
    if address.is_empty() {
        return Ok(());
    }

    let valid = address
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()));

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("wallet_address");
        err.message = Some("must be 0x followed by 40 hex digits".into());
        Err(err)
    }
}
