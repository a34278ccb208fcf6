//! NFT repository.

use std::sync::Arc;

use crate::entities::{Nft, nft};
use matrix_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// NFT repository for database operations.
#[derive(Clone)]
pub struct NftRepository {
    db: Arc<DatabaseConnection>,
}

impl NftRepository {
    /// Create a new NFT repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an NFT by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<nft::Model>> {
        Nft::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// NFTs showcased by a person, newest first.
    pub async fn find_by_owner(&self, owner_id: &str) -> AppResult<Vec<nft::Model>> {
        Nft::find()
            .filter(nft::Column::OwnerId.eq(owner_id))
            .order_by_desc(nft::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an NFT by its on-chain identity.
    pub async fn find_by_token(
        &self,
        contract_address: &str,
        token_id: &str,
    ) -> AppResult<Option<nft::Model>> {
        Nft::find()
            .filter(nft::Column::ContractAddress.eq(contract_address))
            .filter(nft::Column::TokenId.eq(token_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new NFT entry.
    pub async fn create(&self, model: nft::ActiveModel) -> AppResult<nft::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an NFT entry.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = Nft::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
