//! Royalty splitter reconciliation.
//!
//! Splitters are first observed via two independent sources: the factory's
//! SplitterCreated event or the instance's own Initialized event. Both paths
//! converge on one entity keyed by splitter address.
//!
//! Cached balances are always re-fetched from live contract state after a
//! mutating event, never derived by summing audit rows. A failed read leaves
//! the cached value stale but not corrupted; the audit row is appended
//! unconditionally.

use alloy::primitives::{Address, U256};

use strdomains_chain::EventMeta;
use strdomains_storage::ids;
use strdomains_storage::models::{
    RoyaltyBalance, RoyaltyReceived, RoyaltySplitter, RoyaltyTokenReceived, RoyaltyTokenWithdraw,
    RoyaltyWithdraw,
};
use strdomains_storage::store::{EntityStore, StoreError};

use crate::{Reconciler, oracle::StateOracle, watch::WatchRegistry};

impl<S, O, W> Reconciler<S, O, W>
where
    S: EntityStore,
    O: StateOracle,
    W: WatchRegistry,
{
    pub(crate) async fn handle_splitter_created(
        &self,
        meta: &EventMeta,
        splitter_address: Address,
        creator: Address,
        treasury: Address,
        creator_bps: u16,
        treasury_bps: u16,
    ) -> Result<(), StoreError> {
        let splitter_id = ids::address_id(splitter_address);

        // The factory event is authoritative for beneficiaries and ratios.
        let splitter = RoyaltySplitter {
            id: splitter_id.clone(),
            address: splitter_id,
            token: None,
            creator: Some(self.ensure_account(creator).await?),
            treasury: Some(self.ensure_account(treasury).await?),
            creator_bps: i64::from(creator_bps),
            treasury_bps: i64::from(treasury_bps),
            eth_balance: "0".to_string(),
            creator_eth_balance: "0".to_string(),
            treasury_eth_balance: "0".to_string(),
            created_at: meta.block_timestamp as i64,
            block_number: meta.block_number as i64,
            transaction_hash: meta.transaction_hash.clone(),
        };

        // Route the new instance's future events to this handler set.
        self.watches.watch(splitter_address);

        self.store.save_splitter(&splitter).await?;

        tracing::info!(splitter = %splitter_address, "Splitter created");
        Ok(())
    }

    pub(crate) async fn handle_splitter_initialized(
        &self,
        meta: &EventMeta,
        creator: Address,
        treasury: Address,
        creator_bps: u16,
        treasury_bps: u16,
    ) -> Result<(), StoreError> {
        let splitter_id = ids::address_id(meta.address);

        // Idempotent whether this arrives after SplitterCreated or is the
        // very first sighting of the address.
        let mut splitter = match self.store.load_splitter(&splitter_id).await? {
            Some(splitter) => splitter,
            None => RoyaltySplitter {
                id: splitter_id.clone(),
                address: splitter_id,
                token: None,
                creator: None,
                treasury: None,
                creator_bps: 0,
                treasury_bps: 0,
                eth_balance: "0".to_string(),
                creator_eth_balance: "0".to_string(),
                treasury_eth_balance: "0".to_string(),
                created_at: meta.block_timestamp as i64,
                block_number: meta.block_number as i64,
                transaction_hash: meta.transaction_hash.clone(),
            },
        };

        splitter.creator = Some(self.ensure_account(creator).await?);
        splitter.treasury = Some(self.ensure_account(treasury).await?);
        splitter.creator_bps = i64::from(creator_bps);
        splitter.treasury_bps = i64::from(treasury_bps);
        splitter.created_at = meta.block_timestamp as i64;
        splitter.block_number = meta.block_number as i64;
        splitter.transaction_hash = meta.transaction_hash.clone();

        self.store.save_splitter(&splitter).await
    }

    pub(crate) async fn handle_splits_updated(
        &self,
        meta: &EventMeta,
        creator_bps: u16,
        treasury_bps: u16,
    ) -> Result<(), StoreError> {
        let splitter_id = ids::address_id(meta.address);
        let Some(mut splitter) = self.store.load_splitter(&splitter_id).await? else {
            tracing::debug!(splitter = %splitter_id, "Splits update for unknown splitter, skipping");
            return Ok(());
        };

        splitter.creator_bps = i64::from(creator_bps);
        splitter.treasury_bps = i64::from(treasury_bps);
        self.store.save_splitter(&splitter).await
    }

    pub(crate) async fn handle_royalty_received(
        &self,
        meta: &EventMeta,
        from: Address,
        amount: U256,
    ) -> Result<(), StoreError> {
        let splitter_id = ids::address_id(meta.address);
        let Some(mut splitter) = self.store.load_splitter(&splitter_id).await? else {
            tracing::debug!(splitter = %splitter_id, "Royalty received for unknown splitter, skipping");
            return Ok(());
        };

        self.refresh_native_balances(meta.address, &mut splitter).await;

        let received = RoyaltyReceived {
            id: ids::tx_log_id(&meta.transaction_hash, meta.log_index),
            splitter: splitter.id.clone(),
            from_address: ids::address_id(from),
            amount: amount.to_string(),
            timestamp: meta.block_timestamp as i64,
            block_number: meta.block_number as i64,
            transaction_hash: meta.transaction_hash.clone(),
        };

        self.store.save_royalty_received(&received).await?;
        self.store.save_splitter(&splitter).await
    }

    pub(crate) async fn handle_royalty_withdraw(
        &self,
        meta: &EventMeta,
        to: Address,
        amount: U256,
    ) -> Result<(), StoreError> {
        let splitter_id = ids::address_id(meta.address);
        let Some(mut splitter) = self.store.load_splitter(&splitter_id).await? else {
            tracing::debug!(splitter = %splitter_id, "Royalty withdraw for unknown splitter, skipping");
            return Ok(());
        };

        self.refresh_native_balances(meta.address, &mut splitter).await;

        let withdraw = RoyaltyWithdraw {
            id: ids::tx_log_id(&meta.transaction_hash, meta.log_index),
            splitter: splitter.id.clone(),
            to_address: ids::address_id(to),
            amount: amount.to_string(),
            timestamp: meta.block_timestamp as i64,
            block_number: meta.block_number as i64,
            transaction_hash: meta.transaction_hash.clone(),
        };

        self.store.save_royalty_withdraw(&withdraw).await?;
        self.store.save_splitter(&splitter).await
    }

    pub(crate) async fn handle_royalty_token_received(
        &self,
        meta: &EventMeta,
        asset: Address,
        from: Address,
        amount: U256,
    ) -> Result<(), StoreError> {
        let splitter_id = ids::address_id(meta.address);
        let Some(splitter) = self.store.load_splitter(&splitter_id).await? else {
            tracing::debug!(splitter = %splitter_id, "Token royalty for unknown splitter, skipping");
            return Ok(());
        };

        let mut balance = self.load_or_new_balance(&splitter, asset).await?;
        self.refresh_asset_balances(meta.address, asset, &splitter, &mut balance)
            .await;

        let received = RoyaltyTokenReceived {
            id: ids::tx_log_id(&meta.transaction_hash, meta.log_index),
            splitter: splitter.id.clone(),
            token: ids::address_id(asset),
            from_address: ids::address_id(from),
            amount: amount.to_string(),
            timestamp: meta.block_timestamp as i64,
            block_number: meta.block_number as i64,
            transaction_hash: meta.transaction_hash.clone(),
        };

        self.store.save_royalty_token_received(&received).await?;
        self.store.save_royalty_balance(&balance).await
    }

    pub(crate) async fn handle_royalty_token_withdraw(
        &self,
        meta: &EventMeta,
        asset: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), StoreError> {
        let splitter_id = ids::address_id(meta.address);
        let Some(splitter) = self.store.load_splitter(&splitter_id).await? else {
            tracing::debug!(splitter = %splitter_id, "Token withdraw for unknown splitter, skipping");
            return Ok(());
        };

        let mut balance = self.load_or_new_balance(&splitter, asset).await?;
        self.refresh_asset_balances(meta.address, asset, &splitter, &mut balance)
            .await;

        let withdraw = RoyaltyTokenWithdraw {
            id: ids::tx_log_id(&meta.transaction_hash, meta.log_index),
            splitter: splitter.id.clone(),
            token: ids::address_id(asset),
            to_address: ids::address_id(to),
            amount: amount.to_string(),
            timestamp: meta.block_timestamp as i64,
            block_number: meta.block_number as i64,
            transaction_hash: meta.transaction_hash.clone(),
        };

        self.store.save_royalty_token_withdraw(&withdraw).await?;
        self.store.save_royalty_balance(&balance).await
    }

    /// Refresh cached native balances for both beneficiaries. Both reads
    /// must succeed, otherwise the cached values are left untouched.
    async fn refresh_native_balances(&self, address: Address, splitter: &mut RoyaltySplitter) {
        let (Some(creator), Some(treasury)) = (
            parse_beneficiary(&splitter.creator),
            parse_beneficiary(&splitter.treasury),
        ) else {
            return;
        };

        let creator_balance = self.oracle.native_balance(address, creator).await;
        let treasury_balance = self.oracle.native_balance(address, treasury).await;

        if let (Ok(creator_balance), Ok(treasury_balance)) = (creator_balance, treasury_balance) {
            splitter.creator_eth_balance = creator_balance.to_string();
            splitter.treasury_eth_balance = treasury_balance.to_string();
            splitter.eth_balance = (creator_balance + treasury_balance).to_string();
        }
    }

    /// Refresh the per-asset balance pair, each side independently. A missing
    /// beneficiary or failed read leaves that side's value unchanged.
    async fn refresh_asset_balances(
        &self,
        address: Address,
        asset: Address,
        splitter: &RoyaltySplitter,
        balance: &mut RoyaltyBalance,
    ) {
        if let Some(creator) = parse_beneficiary(&splitter.creator) {
            if let Ok(value) = self.oracle.erc20_balance(address, asset, creator).await {
                balance.creator_balance = value.to_string();
            }
        }
        if let Some(treasury) = parse_beneficiary(&splitter.treasury) {
            if let Ok(value) = self.oracle.erc20_balance(address, asset, treasury).await {
                balance.treasury_balance = value.to_string();
            }
        }
    }

    async fn load_or_new_balance(
        &self,
        splitter: &RoyaltySplitter,
        asset: Address,
    ) -> Result<RoyaltyBalance, StoreError> {
        let balance_id = ids::royalty_balance_id(&splitter.id, asset);
        Ok(match self.store.load_royalty_balance(&balance_id).await? {
            Some(balance) => balance,
            None => RoyaltyBalance {
                id: balance_id,
                splitter: splitter.id.clone(),
                token: ids::address_id(asset),
                creator_balance: "0".to_string(),
                treasury_balance: "0".to_string(),
            },
        })
    }
}

/// Beneficiary account ids are lower-hex addresses; absent means the splitter
/// was lazily created and behaves like a failed read.
fn parse_beneficiary(account: &Option<String>) -> Option<Address> {
    account.as_deref().and_then(|a| a.parse().ok())
}
