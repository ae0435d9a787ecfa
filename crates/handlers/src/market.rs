//! Marketplace reconciliation: listing lifecycle, purchases, fee
//! withdrawals.
//!
//! Listing states: created (active), updated (active, price changed),
//! canceled (inactive, terminal), purchased (inactive, terminal, linked to a
//! Purchase). A listing first observed via an update/cancel event is
//! synthesized with sentinel values so later queries do not error on a
//! missing id; a purchase against a listing with no backing token is dropped
//! rather than partially recorded.

use alloy::primitives::{Address, U256};

use strdomains_chain::EventMeta;
use strdomains_storage::ids;
use strdomains_storage::models::{FeeWithdrawal, Listing, Purchase};
use strdomains_storage::store::{EntityStore, StoreError};

use crate::{Reconciler, oracle::StateOracle, watch::WatchRegistry};

impl<S, O, W> Reconciler<S, O, W>
where
    S: EntityStore,
    O: StateOracle,
    W: WatchRegistry,
{
    pub(crate) async fn handle_listed(
        &self,
        meta: &EventMeta,
        listing_id: U256,
        seller: Address,
        nft: Address,
        token_id: U256,
        price: U256,
    ) -> Result<(), StoreError> {
        let mut marketplace = self.ensure_marketplace(meta.address).await?;

        if let Ok(last) = self.oracle.last_listing_id(meta.address).await {
            marketplace.last_listing_id = last.to_string();
        }
        marketplace.block_number = meta.block_number as i64;
        marketplace.transaction_hash = meta.transaction_hash.clone();

        // Downstream price/royalty queries need the token's metadata, so a
        // listing cannot retroactively synthesize one. Drop the event.
        let token_entity_id = ids::token_id(token_id);
        let Some(token) = self.store.load_token(&token_entity_id).await? else {
            tracing::warn!(
                listing = %listing_id,
                token = %token_entity_id,
                "Listed event references unknown token, dropping"
            );
            return Ok(());
        };

        let listing = Listing {
            id: ids::listing_id(listing_id),
            listing_id: listing_id.to_string(),
            marketplace: marketplace.id.clone(),
            seller: self.ensure_account(seller).await?,
            nft: ids::address_id(nft),
            token: Some(token.id),
            token_id: token_id.to_string(),
            price: price.to_string(),
            active: true,
            purchase: None,
            created_at: meta.block_timestamp as i64,
            updated_at: None,
            canceled_at: None,
            block_number: meta.block_number as i64,
            transaction_hash: meta.transaction_hash.clone(),
        };

        self.store.save_listing(&listing).await?;
        self.store.save_marketplace(&marketplace).await?;

        tracing::info!(listing = %listing.id, price = %listing.price, "Listing created");
        Ok(())
    }

    pub(crate) async fn handle_listing_updated(
        &self,
        meta: &EventMeta,
        listing_id: U256,
        new_price: U256,
    ) -> Result<(), StoreError> {
        let mut listing = self
            .load_or_synthesize_listing(meta, listing_id, true)
            .await?;

        listing.price = new_price.to_string();
        listing.updated_at = Some(meta.block_timestamp as i64);

        self.store.save_listing(&listing).await
    }

    pub(crate) async fn handle_listing_canceled(
        &self,
        meta: &EventMeta,
        listing_id: U256,
    ) -> Result<(), StoreError> {
        let mut listing = self
            .load_or_synthesize_listing(meta, listing_id, false)
            .await?;

        listing.active = false;
        listing.canceled_at = Some(meta.block_timestamp as i64);

        self.store.save_listing(&listing).await
    }

    pub(crate) async fn handle_purchased(
        &self,
        meta: &EventMeta,
        listing_id: U256,
        buyer: Address,
        price: U256,
        royalty_receiver: Address,
        royalty_amount: U256,
        fee_amount: U256,
        seller_amount: U256,
    ) -> Result<(), StoreError> {
        let mut marketplace = self.ensure_marketplace(meta.address).await?;

        if let Ok(fees) = self.oracle.accrued_fees(meta.address).await {
            marketplace.accrued_fees = fees.to_string();
        }
        marketplace.block_number = meta.block_number as i64;
        marketplace.transaction_hash = meta.transaction_hash.clone();

        let listing_entity_id = ids::listing_id(listing_id);
        let mut listing = match self.store.load_listing(&listing_entity_id).await? {
            Some(listing) => listing,
            None => {
                // Creation predates indexing start: synthesize the terminal
                // placeholder, but with no backing token the purchase itself
                // cannot be recorded.
                let placeholder = self
                    .load_or_synthesize_listing(meta, listing_id, false)
                    .await?;
                self.store.save_listing(&placeholder).await?;
                tracing::warn!(
                    listing = %listing_entity_id,
                    "Purchase of never-observed listing, placeholder only"
                );
                return Ok(());
            }
        };

        listing.active = false;

        // A synthesized listing carries token id 0 with no backing Token
        // entity; dropping beats recording a purchase with no token.
        let token = match &listing.token {
            Some(token_id) => self.store.load_token(token_id).await?,
            None => None,
        };
        let Some(token) = token else {
            tracing::warn!(listing = %listing.id, "Purchase references missing token, dropping");
            return Ok(());
        };

        let purchase = Purchase {
            id: ids::tx_log_id(&meta.transaction_hash, meta.log_index),
            marketplace: marketplace.id.clone(),
            listing: listing.id.clone(),
            listing_id: listing_id.to_string(),
            buyer: self.ensure_account(buyer).await?,
            token: token.id,
            price: price.to_string(),
            royalty_receiver: ids::address_id(royalty_receiver),
            royalty_amount: royalty_amount.to_string(),
            fee_amount: fee_amount.to_string(),
            seller_amount: seller_amount.to_string(),
            timestamp: meta.block_timestamp as i64,
            block_number: meta.block_number as i64,
            transaction_hash: meta.transaction_hash.clone(),
        };

        listing.purchase = Some(purchase.id.clone());

        self.store.save_purchase(&purchase).await?;
        self.store.save_listing(&listing).await?;
        self.store.save_marketplace(&marketplace).await?;

        tracing::info!(listing = %listing.id, buyer = %buyer, "Listing purchased");
        Ok(())
    }

    pub(crate) async fn handle_fee_withdrawn(
        &self,
        meta: &EventMeta,
        to: Address,
        amount: U256,
    ) -> Result<(), StoreError> {
        let mut marketplace = self.ensure_marketplace(meta.address).await?;

        if let Ok(fees) = self.oracle.accrued_fees(meta.address).await {
            marketplace.accrued_fees = fees.to_string();
        }
        marketplace.block_number = meta.block_number as i64;
        marketplace.transaction_hash = meta.transaction_hash.clone();

        let withdrawal = FeeWithdrawal {
            id: ids::tx_log_id(&meta.transaction_hash, meta.log_index),
            marketplace: marketplace.id.clone(),
            to_address: ids::address_id(to),
            amount: amount.to_string(),
            timestamp: meta.block_timestamp as i64,
            block_number: meta.block_number as i64,
            transaction_hash: meta.transaction_hash.clone(),
        };

        self.store.save_fee_withdrawal(&withdrawal).await?;
        self.store.save_marketplace(&marketplace).await
    }

    /// Load a listing, or synthesize a placeholder for one whose creation
    /// predates indexing start: sentinel zero-address seller, token id 0, no
    /// token ref.
    async fn load_or_synthesize_listing(
        &self,
        meta: &EventMeta,
        listing_id: U256,
        active: bool,
    ) -> Result<Listing, StoreError> {
        let listing_entity_id = ids::listing_id(listing_id);
        if let Some(listing) = self.store.load_listing(&listing_entity_id).await? {
            return Ok(listing);
        }

        let marketplace = self.ensure_marketplace(meta.address).await?;

        tracing::warn!(
            listing = %listing_entity_id,
            "Listing never observed, synthesizing placeholder"
        );

        Ok(Listing {
            id: listing_entity_id,
            listing_id: listing_id.to_string(),
            marketplace: marketplace.id,
            seller: self.ensure_account(Address::ZERO).await?,
            nft: ids::address_id(Address::ZERO),
            token: None,
            token_id: "0".to_string(),
            price: "0".to_string(),
            active,
            purchase: None,
            created_at: meta.block_timestamp as i64,
            updated_at: None,
            canceled_at: None,
            block_number: meta.block_number as i64,
            transaction_hash: meta.transaction_hash.clone(),
        })
    }
}
