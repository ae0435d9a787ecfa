//! Lazily created singletons caching global contract configuration.

use alloy::primitives::{Address, B256};

use strdomains_storage::ids;
use strdomains_storage::models::{Contract, Marketplace};
use strdomains_storage::store::{EntityStore, StoreError};

use crate::{Reconciler, oracle::StateOracle, watch::WatchRegistry};

impl<S, O, W> Reconciler<S, O, W>
where
    S: EntityStore,
    O: StateOracle,
    W: WatchRegistry,
{
    /// Load the collection config snapshot, zero-filling it on first sight.
    /// Later handlers overwrite individual fields, last write wins.
    pub(crate) async fn ensure_contract(&self, address: Address) -> Result<Contract, StoreError> {
        let id = ids::address_id(address);
        if let Some(contract) = self.store.load_contract(&id).await? {
            return Ok(contract);
        }

        let contract = Contract {
            id,
            treasury: ids::address_id(Address::ZERO),
            splitter_factory: ids::address_id(Address::ZERO),
            default_royalty_bps: 0,
            last_id: "0".to_string(),
        };
        self.store.save_contract(&contract).await?;
        Ok(contract)
    }

    /// Load the marketplace singleton, bootstrapping it from authoritative
    /// contract reads on first touch. Each read falls back to zero on its
    /// own; a failed read never blocks the bootstrap.
    pub(crate) async fn ensure_marketplace(
        &self,
        address: Address,
    ) -> Result<Marketplace, StoreError> {
        let id = ids::address_id(address);
        if let Some(marketplace) = self.store.load_marketplace(&id).await? {
            return Ok(marketplace);
        }

        let fee_treasury = match self.oracle.fee_treasury(address).await {
            Ok(treasury) => ids::address_id(treasury),
            Err(_) => ids::address_id(Address::ZERO),
        };
        let marketplace_fee_bps = match self.oracle.marketplace_fee_bps(address).await {
            Ok(bps) => i64::from(bps),
            Err(_) => 0,
        };
        let accrued_fees = match self.oracle.accrued_fees(address).await {
            Ok(fees) => fees.to_string(),
            Err(_) => "0".to_string(),
        };
        let last_listing_id = match self.oracle.last_listing_id(address).await {
            Ok(last) => last.to_string(),
            Err(_) => "0".to_string(),
        };

        let marketplace = Marketplace {
            id,
            fee_treasury,
            marketplace_fee_bps,
            accrued_fees,
            last_listing_id,
            created_at: 0,
            block_number: 0,
            transaction_hash: format!("{:#x}", B256::ZERO),
        };
        self.store.save_marketplace(&marketplace).await?;

        tracing::info!(marketplace = %address, "Bootstrapped marketplace state");
        Ok(marketplace)
    }
}
