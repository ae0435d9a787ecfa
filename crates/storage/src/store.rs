//! The persistence contract the reconciliation core depends on.
//!
//! Every entity is upserted: `load` by id, mutate or initialize, `save`.
//! Append-only history rows only need `save`.

use thiserror::Error;

use crate::models::*;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Keyed entity upsert primitives.
#[allow(async_fn_in_trait)]
pub trait EntityStore {
    async fn load_account(&self, id: &str) -> Result<Option<Account>, StoreError>;
    async fn save_account(&self, account: &Account) -> Result<(), StoreError>;

    async fn load_contract(&self, id: &str) -> Result<Option<Contract>, StoreError>;
    async fn save_contract(&self, contract: &Contract) -> Result<(), StoreError>;

    async fn load_token(&self, id: &str) -> Result<Option<Token>, StoreError>;
    async fn save_token(&self, token: &Token) -> Result<(), StoreError>;

    async fn save_sale(&self, sale: &Sale) -> Result<(), StoreError>;
    async fn save_transfer(&self, transfer: &Transfer) -> Result<(), StoreError>;

    async fn load_splitter(&self, id: &str) -> Result<Option<RoyaltySplitter>, StoreError>;
    async fn save_splitter(&self, splitter: &RoyaltySplitter) -> Result<(), StoreError>;

    async fn load_royalty_balance(&self, id: &str) -> Result<Option<RoyaltyBalance>, StoreError>;
    async fn save_royalty_balance(&self, balance: &RoyaltyBalance) -> Result<(), StoreError>;

    async fn save_royalty_received(&self, received: &RoyaltyReceived) -> Result<(), StoreError>;
    async fn save_royalty_token_received(
        &self,
        received: &RoyaltyTokenReceived,
    ) -> Result<(), StoreError>;
    async fn save_royalty_withdraw(&self, withdraw: &RoyaltyWithdraw) -> Result<(), StoreError>;
    async fn save_royalty_token_withdraw(
        &self,
        withdraw: &RoyaltyTokenWithdraw,
    ) -> Result<(), StoreError>;

    async fn load_marketplace(&self, id: &str) -> Result<Option<Marketplace>, StoreError>;
    async fn save_marketplace(&self, marketplace: &Marketplace) -> Result<(), StoreError>;

    async fn load_listing(&self, id: &str) -> Result<Option<Listing>, StoreError>;
    async fn save_listing(&self, listing: &Listing) -> Result<(), StoreError>;

    async fn save_purchase(&self, purchase: &Purchase) -> Result<(), StoreError>;
    async fn save_fee_withdrawal(&self, withdrawal: &FeeWithdrawal) -> Result<(), StoreError>;
}
