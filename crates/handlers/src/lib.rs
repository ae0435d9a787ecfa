//! Event-to-state reconciliation.
//!
//! One handler per event, invoked synchronously in block-and-log order by the
//! delivery loop. Handlers upsert entities (load by id, mutate or initialize,
//! persist) and append immutable history rows. Live contract reads are
//! best-effort: a failed read leaves the cached field at its previous value
//! and never aborts the handler. Store errors are the only thing that
//! propagates.

use alloy::primitives::U256;

use strdomains_chain::ChainEvent;
use strdomains_storage::store::{EntityStore, StoreError};

use crate::oracle::StateOracle;
use crate::watch::WatchRegistry;

pub mod contract_state;
pub mod identity;
pub mod market;
pub mod splitter;
pub mod token;
pub mod watch;

pub use strdomains_chain::oracle;

/// Reconciles decoded chain events against the entity store.
///
/// Generic over the persistence, live-read and watch-registration
/// collaborators so the reconciliation rules are testable in isolation.
pub struct Reconciler<S, O, W> {
    pub(crate) store: S,
    pub(crate) oracle: O,
    pub(crate) watches: W,
}

impl<S, O, W> Reconciler<S, O, W>
where
    S: EntityStore,
    O: StateOracle,
    W: WatchRegistry,
{
    pub fn new(store: S, oracle: O, watches: W) -> Self {
        Self {
            store,
            oracle,
            watches,
        }
    }

    /// Apply a single event. Exactly one handler runs per event.
    pub async fn apply(&self, event: &ChainEvent) -> Result<(), StoreError> {
        match event {
            ChainEvent::Minted {
                meta,
                token_id,
                to,
                creator,
                token_uri,
                domain,
            } => {
                self.handle_minted(meta, *token_id, *to, *creator, token_uri, domain)
                    .await
            }
            ChainEvent::Transfer {
                meta,
                from,
                to,
                token_id,
            } => self.handle_transfer(meta, *from, *to, *token_id).await,
            ChainEvent::SaleRecorded {
                meta,
                token_id,
                buyer,
                price,
                at,
            } => {
                self.handle_sale_recorded(meta, *token_id, *buyer, *price, *at)
                    .await
            }
            ChainEvent::TokenSplitterSet {
                meta,
                token_id,
                splitter,
                royalty_bps,
            } => {
                self.handle_token_splitter_set(meta, *token_id, *splitter, *royalty_bps)
                    .await
            }
            ChainEvent::TreasuryUpdated { meta, new_treasury } => {
                self.handle_treasury_updated(meta, *new_treasury).await
            }
            ChainEvent::DefaultRoyaltyUpdated { meta, bps } => {
                self.handle_default_royalty_updated(meta, *bps).await
            }
            ChainEvent::SplitterFactoryUpdated { meta, new_factory } => {
                self.handle_splitter_factory_updated(meta, *new_factory).await
            }
            ChainEvent::SplitterCreated {
                meta,
                splitter,
                creator,
                treasury,
                creator_bps,
                treasury_bps,
            } => {
                self.handle_splitter_created(
                    meta,
                    *splitter,
                    *creator,
                    *treasury,
                    *creator_bps,
                    *treasury_bps,
                )
                .await
            }
            ChainEvent::SplitterInitialized {
                meta,
                creator,
                treasury,
                creator_bps,
                treasury_bps,
            } => {
                self.handle_splitter_initialized(
                    meta,
                    *creator,
                    *treasury,
                    *creator_bps,
                    *treasury_bps,
                )
                .await
            }
            ChainEvent::SplitsUpdated {
                meta,
                creator_bps,
                treasury_bps,
            } => {
                self.handle_splits_updated(meta, *creator_bps, *treasury_bps)
                    .await
            }
            ChainEvent::RoyaltyReceived { meta, from, amount } => {
                self.handle_royalty_received(meta, *from, *amount).await
            }
            ChainEvent::RoyaltyTokenReceived {
                meta,
                token,
                from,
                amount,
            } => {
                self.handle_royalty_token_received(meta, *token, *from, *amount)
                    .await
            }
            ChainEvent::RoyaltyWithdraw { meta, to, amount } => {
                self.handle_royalty_withdraw(meta, *to, *amount).await
            }
            ChainEvent::RoyaltyTokenWithdraw {
                meta,
                token,
                to,
                amount,
            } => {
                self.handle_royalty_token_withdraw(meta, *token, *to, *amount)
                    .await
            }
            ChainEvent::Listed {
                meta,
                listing_id,
                seller,
                nft,
                token_id,
                price,
            } => {
                self.handle_listed(meta, *listing_id, *seller, *nft, *token_id, *price)
                    .await
            }
            ChainEvent::ListingUpdated {
                meta,
                listing_id,
                new_price,
            } => self.handle_listing_updated(meta, *listing_id, *new_price).await,
            ChainEvent::ListingCanceled { meta, listing_id } => {
                self.handle_listing_canceled(meta, *listing_id).await
            }
            ChainEvent::Purchased {
                meta,
                listing_id,
                buyer,
                price,
                royalty_receiver,
                royalty_amount,
                fee_amount,
                seller_amount,
            } => {
                self.handle_purchased(
                    meta,
                    *listing_id,
                    *buyer,
                    *price,
                    *royalty_receiver,
                    *royalty_amount,
                    *fee_amount,
                    *seller_amount,
                )
                .await
            }
            ChainEvent::FeeWithdrawn { meta, to, amount } => {
                self.handle_fee_withdrawn(meta, *to, *amount).await
            }
        }
    }
}

/// Clamp a uint256-valued timestamp into i64 column range.
pub(crate) fn clamp_i64(value: U256) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
