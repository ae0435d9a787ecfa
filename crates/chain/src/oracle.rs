//! Live contract-state reads.
//!
//! Handlers treat every read as best-effort: a failure leaves the affected
//! cached field at its previous value and never aborts the handler.

use alloy::primitives::{Address, U256};
use thiserror::Error;

use crate::abi::{Marketplace, RoyaltySplitter, StrDomainsNFT};
use crate::provider::ChainProvider;

/// A live read that did not produce a value (reverted call, unreachable node).
#[derive(Debug, Error)]
#[error("live read failed: {0}")]
pub struct ReadFailed(pub String);

/// Point-in-time reads against current contract state.
///
/// Each call returns either a value or an explicit failure; callers must
/// check before using the value and never substitute zero for a failure.
#[allow(async_fn_in_trait)]
pub trait StateOracle {
    /// `getLastId()` on the collection.
    async fn last_minted_id(&self, collection: Address) -> Result<U256, ReadFailed>;

    /// `ethBalance(account)` on a splitter.
    async fn native_balance(&self, splitter: Address, account: Address) -> Result<U256, ReadFailed>;

    /// `erc20Balance(asset, account)` on a splitter.
    async fn erc20_balance(
        &self,
        splitter: Address,
        asset: Address,
        account: Address,
    ) -> Result<U256, ReadFailed>;

    /// `feeTreasury()` on the marketplace.
    async fn fee_treasury(&self, marketplace: Address) -> Result<Address, ReadFailed>;

    /// `marketplaceFeeBps()` on the marketplace.
    async fn marketplace_fee_bps(&self, marketplace: Address) -> Result<u16, ReadFailed>;

    /// `accruedFees()` on the marketplace.
    async fn accrued_fees(&self, marketplace: Address) -> Result<U256, ReadFailed>;

    /// `lastListingId()` on the marketplace.
    async fn last_listing_id(&self, marketplace: Address) -> Result<U256, ReadFailed>;
}

/// RPC-backed oracle over the `sol!` view bindings.
#[derive(Clone)]
pub struct RpcOracle {
    provider: ChainProvider,
}

impl RpcOracle {
    pub fn new(provider: ChainProvider) -> Self {
        Self { provider }
    }
}

fn read_err(e: alloy::contract::Error) -> ReadFailed {
    ReadFailed(e.to_string())
}

impl StateOracle for RpcOracle {
    async fn last_minted_id(&self, collection: Address) -> Result<U256, ReadFailed> {
        StrDomainsNFT::new(collection, &self.provider)
            .getLastId()
            .call()
            .await
            .map_err(read_err)
    }

    async fn native_balance(&self, splitter: Address, account: Address) -> Result<U256, ReadFailed> {
        RoyaltySplitter::new(splitter, &self.provider)
            .ethBalance(account)
            .call()
            .await
            .map_err(read_err)
    }

    async fn erc20_balance(
        &self,
        splitter: Address,
        asset: Address,
        account: Address,
    ) -> Result<U256, ReadFailed> {
        RoyaltySplitter::new(splitter, &self.provider)
            .erc20Balance(asset, account)
            .call()
            .await
            .map_err(read_err)
    }

    async fn fee_treasury(&self, marketplace: Address) -> Result<Address, ReadFailed> {
        Marketplace::new(marketplace, &self.provider)
            .feeTreasury()
            .call()
            .await
            .map_err(read_err)
    }

    async fn marketplace_fee_bps(&self, marketplace: Address) -> Result<u16, ReadFailed> {
        Marketplace::new(marketplace, &self.provider)
            .marketplaceFeeBps()
            .call()
            .await
            .map_err(read_err)
    }

    async fn accrued_fees(&self, marketplace: Address) -> Result<U256, ReadFailed> {
        Marketplace::new(marketplace, &self.provider)
            .accruedFees()
            .call()
            .await
            .map_err(read_err)
    }

    async fn last_listing_id(&self, marketplace: Address) -> Result<U256, ReadFailed> {
        Marketplace::new(marketplace, &self.provider)
            .lastListingId()
            .call()
            .await
            .map_err(read_err)
    }
}
