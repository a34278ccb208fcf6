//! NFT showcase service.

use chrono::Utc;
use matrix_common::{AppError, AppResult, IdGenerator};
use matrix_db::{entities::nft, repositories::NftRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for adding an NFT to one's showcase.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddNftInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(url)]
    pub image_url: String,
    #[validate(length(min = 1, max = 100))]
    pub contract_address: String,
    #[validate(length(min = 1, max = 100))]
    pub token_id: String,
    #[validate(length(min = 1, max = 32))]
    pub chain: String,
}

/// NFT service for business logic.
#[derive(Clone)]
pub struct NftService {
    nft_repo: NftRepository,
    id_gen: IdGenerator,
}

impl NftService {
    /// Create a new NFT service.
    #[must_use]
    pub const fn new(nft_repo: NftRepository) -> Self {
        Self {
            nft_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// NFTs shown on a person's profile, newest first.
    pub async fn list_for_person(&self, person_id: &str) -> AppResult<Vec<nft::Model>> {
        self.nft_repo.find_by_owner(person_id).await
    }

    /// Add an NFT. A token can be shown by one person only.
    pub async fn add_nft(&self, owner_id: &str, input: AddNftInput) -> AppResult<nft::Model> {
        input.validate()?;

        let contract_address = input.contract_address.trim().to_lowercase();
        let token_id = input.token_id.trim().to_string();

        if self
            .nft_repo
            .find_by_token(&contract_address, &token_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("This NFT is already listed".to_string()));
        }

        let model = nft::ActiveModel {
            id: Set(self.id_gen.generate()),
            owner_id: Set(owner_id.to_string()),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description.filter(|d| !d.trim().is_empty())),
            image_url: Set(input.image_url),
            contract_address: Set(contract_address),
            token_id: Set(token_id),
            chain: Set(input.chain.trim().to_lowercase()),
            created_at: Set(Utc::now().into()),
        };

        let created = self.nft_repo.create(model).await?;
        tracing::info!(nft_id = %created.id, owner_id = %owner_id, "NFT added");
        Ok(created)
    }

    /// Remove an NFT from its owner's showcase.
    pub async fn remove_nft(&self, id: &str, owner_id: &str) -> AppResult<()> {
        let nft = self
            .nft_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("NFT {id} not found")))?;

        if nft.owner_id != owner_id {
            return Err(AppError::Forbidden("Not your NFT".to_string()));
        }

        self.nft_repo.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_nft(owner_id: &str) -> nft::Model {
        nft::Model {
            id: "nft1".to_string(),
            owner_id: owner_id.to_string(),
            name: "Punk".to_string(),
            description: None,
            image_url: "https://example.com/punk.png".to_string(),
            contract_address: "0xabc".to_string(),
            token_id: "42".to_string(),
            chain: "ethereum".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn input() -> AddNftInput {
        AddNftInput {
            name: "Punk".to_string(),
            description: None,
            image_url: "https://example.com/punk.png".to_string(),
            contract_address: "0xABC".to_string(),
            token_id: "42".to_string(),
            chain: "Ethereum".to_string(),
        }
    }

    fn service(db: MockDatabase) -> NftService {
        NftService::new(NftRepository::new(Arc::new(db.into_connection())))
    }

    #[tokio::test]
    async fn test_duplicate_token_conflicts() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_nft("p2")]]),
        );

        let result = service.add_nft("p1", input()).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_add_nft() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<nft::Model>::new()])
                .append_query_results([[create_test_nft("p1")]]),
        );

        let created = service.add_nft("p1", input()).await.unwrap();
        assert_eq!(created.owner_id, "p1");
    }

    #[tokio::test]
    async fn test_only_owner_can_remove() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_nft("p1")]]),
        );

        let result = service.remove_nft("nft1", "p2").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
