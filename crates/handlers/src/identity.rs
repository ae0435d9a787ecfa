//! Identity resolver: stable account references keyed by lower-hex address.

use alloy::primitives::Address;

use strdomains_storage::ids;
use strdomains_storage::models::Account;
use strdomains_storage::store::{EntityStore, StoreError};

use crate::{Reconciler, oracle::StateOracle, watch::WatchRegistry};

impl<S, O, W> Reconciler<S, O, W>
where
    S: EntityStore,
    O: StateOracle,
    W: WatchRegistry,
{
    /// Load the account for an address, creating an empty record on first
    /// sight. Returns the account id.
    pub(crate) async fn ensure_account(&self, address: Address) -> Result<String, StoreError> {
        let id = ids::address_id(address);
        if self.store.load_account(&id).await?.is_none() {
            self.store.save_account(&Account { id: id.clone() }).await?;
        }
        Ok(id)
    }
}
