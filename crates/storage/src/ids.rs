//! Deterministic entity id composition.

use alloy::primitives::{Address, U256};

/// Lower-hex address id (`0x`-prefixed), used for accounts, contracts,
/// splitters and marketplaces.
pub fn address_id(address: Address) -> String {
    format!("{address:#x}")
}

/// Decimal token entity id.
pub fn token_id(token_id: U256) -> String {
    token_id.to_string()
}

/// Decimal listing entity id.
pub fn listing_id(listing_id: U256) -> String {
    listing_id.to_string()
}

/// Id for immutable history rows: tx-hash + log-index.
pub fn tx_log_id(transaction_hash: &str, log_index: u64) -> String {
    format!("{transaction_hash}-{log_index}")
}

/// Id for a per-asset royalty balance: splitter address id + asset address.
pub fn royalty_balance_id(splitter_id: &str, asset: Address) -> String {
    format!("{splitter_id}-{asset:#x}")
}
