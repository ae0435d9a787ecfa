//! Token lifecycle: mint, transfer, recorded sales, splitter assignment, and
//! collection config updates.
//!
//! Events referencing an unknown token id are dropped: tokens only come into
//! existence via Minted, so an unseen id is an ordering anomaly, not an
//! error.

use alloy::primitives::{Address, U256};

use strdomains_chain::{EventMeta, ZERO_ADDRESS};
use strdomains_storage::ids;
use strdomains_storage::models::{RoyaltySplitter, Sale, Token, Transfer};
use strdomains_storage::store::{EntityStore, StoreError};

use crate::{Reconciler, clamp_i64, oracle::StateOracle, watch::WatchRegistry};

impl<S, O, W> Reconciler<S, O, W>
where
    S: EntityStore,
    O: StateOracle,
    W: WatchRegistry,
{
    pub(crate) async fn handle_minted(
        &self,
        meta: &EventMeta,
        token_id: U256,
        to: Address,
        creator: Address,
        token_uri: &str,
        domain: &str,
    ) -> Result<(), StoreError> {
        let mut contract = self.ensure_contract(meta.address).await?;

        let owner = self.ensure_account(to).await?;
        let creator_id = self.ensure_account(creator).await?;

        let token = Token {
            id: ids::token_id(token_id),
            token_id: token_id.to_string(),
            owner,
            creator: creator_id,
            token_uri: token_uri.to_string(),
            domain_name: domain.to_string(),
            minted_at: meta.block_timestamp as i64,
            last_sale_price: None,
            last_sale_at: None,
            royalty_splitter: None,
            royalty_bps: None,
            block_number: meta.block_number as i64,
            transaction_hash: meta.transaction_hash.clone(),
        };

        // Refresh the mint counter from the contract, best-effort.
        if let Ok(last_id) = self.oracle.last_minted_id(meta.address).await {
            contract.last_id = last_id.to_string();
        }

        self.store.save_contract(&contract).await?;
        self.store.save_token(&token).await?;

        tracing::info!(token = %token.id, domain = %token.domain_name, "Minted token");
        Ok(())
    }

    pub(crate) async fn handle_token_splitter_set(
        &self,
        meta: &EventMeta,
        token_id: U256,
        splitter_address: Address,
        royalty_bps: u16,
    ) -> Result<(), StoreError> {
        let token_entity_id = ids::token_id(token_id);
        let Some(mut token) = self.store.load_token(&token_entity_id).await? else {
            tracing::debug!(token = %token_entity_id, "Splitter set for unknown token, skipping");
            return Ok(());
        };

        let splitter_id = ids::address_id(splitter_address);
        let mut splitter = match self.store.load_splitter(&splitter_id).await? {
            Some(splitter) => splitter,
            None => RoyaltySplitter {
                id: splitter_id.clone(),
                address: splitter_id.clone(),
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

        token.royalty_splitter = Some(splitter.id.clone());
        token.royalty_bps = Some(i64::from(royalty_bps));
        splitter.token = Some(token.id.clone());
        splitter.block_number = meta.block_number as i64;
        splitter.transaction_hash = meta.transaction_hash.clone();

        self.store.save_splitter(&splitter).await?;
        self.store.save_token(&token).await?;
        Ok(())
    }

    pub(crate) async fn handle_sale_recorded(
        &self,
        meta: &EventMeta,
        token_id: U256,
        buyer: Address,
        price: U256,
        at: U256,
    ) -> Result<(), StoreError> {
        let token_entity_id = ids::token_id(token_id);
        let Some(mut token) = self.store.load_token(&token_entity_id).await? else {
            tracing::debug!(token = %token_entity_id, "Sale recorded for unknown token, skipping");
            return Ok(());
        };

        token.last_sale_price = Some(price.to_string());
        token.last_sale_at = Some(clamp_i64(at));

        let sale = Sale {
            id: ids::tx_log_id(&meta.transaction_hash, meta.log_index),
            token: token.id.clone(),
            buyer: self.ensure_account(buyer).await?,
            price: price.to_string(),
            timestamp: clamp_i64(at),
            block_number: meta.block_number as i64,
            transaction_hash: meta.transaction_hash.clone(),
        };

        self.store.save_sale(&sale).await?;
        self.store.save_token(&token).await?;
        Ok(())
    }

    pub(crate) async fn handle_transfer(
        &self,
        meta: &EventMeta,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<(), StoreError> {
        // Transfers from the zero address are mint artifacts; Minted already
        // captured ownership.
        if from == ZERO_ADDRESS {
            return Ok(());
        }

        let token_entity_id = ids::token_id(token_id);
        let Some(mut token) = self.store.load_token(&token_entity_id).await? else {
            tracing::debug!(token = %token_entity_id, "Transfer of unknown token, skipping");
            return Ok(());
        };

        token.owner = self.ensure_account(to).await?;

        let transfer = Transfer {
            id: ids::tx_log_id(&meta.transaction_hash, meta.log_index),
            token: token.id.clone(),
            from_address: self.ensure_account(from).await?,
            to_address: token.owner.clone(),
            timestamp: meta.block_timestamp as i64,
            block_number: meta.block_number as i64,
            transaction_hash: meta.transaction_hash.clone(),
        };

        self.store.save_transfer(&transfer).await?;
        self.store.save_token(&token).await?;
        Ok(())
    }

    pub(crate) async fn handle_treasury_updated(
        &self,
        meta: &EventMeta,
        new_treasury: Address,
    ) -> Result<(), StoreError> {
        let mut contract = self.ensure_contract(meta.address).await?;
        contract.treasury = ids::address_id(new_treasury);
        self.store.save_contract(&contract).await
    }

    pub(crate) async fn handle_default_royalty_updated(
        &self,
        meta: &EventMeta,
        bps: u16,
    ) -> Result<(), StoreError> {
        let mut contract = self.ensure_contract(meta.address).await?;
        contract.default_royalty_bps = i64::from(bps);
        self.store.save_contract(&contract).await
    }

    pub(crate) async fn handle_splitter_factory_updated(
        &self,
        meta: &EventMeta,
        new_factory: Address,
    ) -> Result<(), StoreError> {
        let mut contract = self.ensure_contract(meta.address).await?;
        contract.splitter_factory = ids::address_id(new_factory);
        self.store.save_contract(&contract).await
    }
}
