//! Entity models for the derived index.
//!
//! All `uint256`-sourced amounts, prices, balances and counters are stored as
//! decimal TEXT strings; basis points, timestamps and block numbers fit i64.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ─── Account ────────────────────────────────────────────────────────────────

/// A referenceable identity, keyed by lower-hex address. No mutable fields.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: String,
}

// ─── Contract ───────────────────────────────────────────────────────────────

/// Per-collection configuration snapshot, keyed by collection address.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contract {
    pub id: String,
    pub treasury: String,
    pub splitter_factory: String,
    pub default_royalty_bps: i64,
    pub last_id: String,
}

// ─── Token ──────────────────────────────────────────────────────────────────

/// A minted domain NFT. Keyed by decimal token id.
///
/// `creator`, `minted_at` and `domain_name` are immutable after mint; the
/// owner ref is reassigned on every non-mint transfer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Token {
    pub id: String,
    pub token_id: String,
    /// Account id of the current owner.
    pub owner: String,
    /// Account id of the minter.
    pub creator: String,
    pub token_uri: String,
    pub domain_name: String,
    pub minted_at: i64,
    pub last_sale_price: Option<String>,
    pub last_sale_at: Option<i64>,
    /// RoyaltySplitter id, once one has been assigned.
    pub royalty_splitter: Option<String>,
    pub royalty_bps: Option<i64>,
    pub block_number: i64,
    pub transaction_hash: String,
}

// ─── Sale ───────────────────────────────────────────────────────────────────

/// Immutable record of a recorded sale. Keyed by tx-hash + log-index.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sale {
    pub id: String,
    pub token: String,
    pub buyer: String,
    pub price: String,
    pub timestamp: i64,
    pub block_number: i64,
    pub transaction_hash: String,
}

// ─── Transfer ───────────────────────────────────────────────────────────────

/// Immutable record of a non-mint ownership transfer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transfer {
    pub id: String,
    pub token: String,
    pub from_address: String,
    pub to_address: String,
    pub timestamp: i64,
    pub block_number: i64,
    pub transaction_hash: String,
}

// ─── RoyaltySplitter ────────────────────────────────────────────────────────

/// A royalty-splitting contract instance, keyed by its address.
///
/// Beneficiaries are optional because a splitter first observed through a
/// `TokenSplitterSet` event has no creator/treasury on record yet; the
/// factory-creation and initialization paths both populate them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoyaltySplitter {
    pub id: String,
    pub address: String,
    /// Token id this splitter is attached to, if known.
    pub token: Option<String>,
    pub creator: Option<String>,
    pub treasury: Option<String>,
    pub creator_bps: i64,
    pub treasury_bps: i64,
    /// Cached native-currency balances, refreshed from live reads.
    pub eth_balance: String,
    pub creator_eth_balance: String,
    pub treasury_eth_balance: String,
    pub created_at: i64,
    pub block_number: i64,
    pub transaction_hash: String,
}

// ─── RoyaltyBalance ─────────────────────────────────────────────────────────

/// Per-asset balances of a splitter, keyed by splitter + asset address.
/// Lazily created on first receipt or withdrawal of that asset.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoyaltyBalance {
    pub id: String,
    pub splitter: String,
    /// ERC-20 asset address.
    pub token: String,
    pub creator_balance: String,
    pub treasury_balance: String,
}

// ─── Royalty audit trail ────────────────────────────────────────────────────
// Balances are never derived by summing these rows; they are observational
// history only. All keyed by tx-hash + log-index.

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoyaltyReceived {
    pub id: String,
    pub splitter: String,
    pub from_address: String,
    pub amount: String,
    pub timestamp: i64,
    pub block_number: i64,
    pub transaction_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoyaltyTokenReceived {
    pub id: String,
    pub splitter: String,
    pub token: String,
    pub from_address: String,
    pub amount: String,
    pub timestamp: i64,
    pub block_number: i64,
    pub transaction_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoyaltyWithdraw {
    pub id: String,
    pub splitter: String,
    pub to_address: String,
    pub amount: String,
    pub timestamp: i64,
    pub block_number: i64,
    pub transaction_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoyaltyTokenWithdraw {
    pub id: String,
    pub splitter: String,
    pub token: String,
    pub to_address: String,
    pub amount: String,
    pub timestamp: i64,
    pub block_number: i64,
    pub transaction_hash: String,
}

// ─── Marketplace ────────────────────────────────────────────────────────────

/// Marketplace singleton, keyed by marketplace address. Bootstrapped from
/// authoritative contract reads on first touch.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Marketplace {
    pub id: String,
    pub fee_treasury: String,
    pub marketplace_fee_bps: i64,
    pub accrued_fees: String,
    pub last_listing_id: String,
    pub created_at: i64,
    pub block_number: i64,
    pub transaction_hash: String,
}

// ─── Listing ────────────────────────────────────────────────────────────────

/// An offer to sell a token, tracked through its lifecycle.
///
/// A listing first observed via an update/cancel event (creation predates
/// indexing start) is synthesized with a sentinel zero-address seller, token
/// id 0 and no token ref.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Listing {
    pub id: String,
    pub listing_id: String,
    pub marketplace: String,
    pub seller: String,
    /// NFT collection contract address.
    pub nft: String,
    /// Token entity id, absent on synthesized placeholders.
    pub token: Option<String>,
    pub token_id: String,
    pub price: String,
    pub active: bool,
    /// Purchase id once the listing has been bought.
    pub purchase: Option<String>,
    pub created_at: i64,
    pub updated_at: Option<i64>,
    pub canceled_at: Option<i64>,
    pub block_number: i64,
    pub transaction_hash: String,
}

// ─── Purchase ───────────────────────────────────────────────────────────────

/// Immutable record of a completed purchase, with the amount breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Purchase {
    pub id: String,
    pub marketplace: String,
    pub listing: String,
    pub listing_id: String,
    pub buyer: String,
    pub token: String,
    pub price: String,
    pub royalty_receiver: String,
    pub royalty_amount: String,
    pub fee_amount: String,
    pub seller_amount: String,
    pub timestamp: i64,
    pub block_number: i64,
    pub transaction_hash: String,
}

// ─── FeeWithdrawal ──────────────────────────────────────────────────────────

/// Immutable record of a marketplace fee withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeeWithdrawal {
    pub id: String,
    pub marketplace: String,
    pub to_address: String,
    pub amount: String,
    pub timestamp: i64,
    pub block_number: i64,
    pub transaction_hash: String,
}
