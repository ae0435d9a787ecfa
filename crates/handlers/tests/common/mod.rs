//! In-memory collaborators for exercising the reconciler without Postgres or
//! an RPC node.

// Not every test binary touches every map or fixture.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use alloy::primitives::{Address, U256};

use strdomains_chain::EventMeta;
use strdomains_chain::oracle::{ReadFailed, StateOracle};
use strdomains_handlers::watch::WatchRegistry;
use strdomains_storage::models::*;
use strdomains_storage::store::{EntityStore, StoreError};

// ─── Entity store ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    pub accounts: Mutex<HashMap<String, Account>>,
    pub contracts: Mutex<HashMap<String, Contract>>,
    pub tokens: Mutex<HashMap<String, Token>>,
    pub sales: Mutex<HashMap<String, Sale>>,
    pub transfers: Mutex<HashMap<String, Transfer>>,
    pub splitters: Mutex<HashMap<String, RoyaltySplitter>>,
    pub royalty_balances: Mutex<HashMap<String, RoyaltyBalance>>,
    pub royalty_received: Mutex<HashMap<String, RoyaltyReceived>>,
    pub royalty_token_received: Mutex<HashMap<String, RoyaltyTokenReceived>>,
    pub royalty_withdrawals: Mutex<HashMap<String, RoyaltyWithdraw>>,
    pub royalty_token_withdrawals: Mutex<HashMap<String, RoyaltyTokenWithdraw>>,
    pub marketplaces: Mutex<HashMap<String, Marketplace>>,
    pub listings: Mutex<HashMap<String, Listing>>,
    pub purchases: Mutex<HashMap<String, Purchase>>,
    pub fee_withdrawals: Mutex<HashMap<String, FeeWithdrawal>>,
}

macro_rules! mem_load {
    ($self:ident, $map:ident, $id:ident) => {
        Ok($self.$map.lock().unwrap().get($id).cloned())
    };
}

macro_rules! mem_save {
    ($self:ident, $map:ident, $entity:ident) => {{
        $self
            .$map
            .lock()
            .unwrap()
            .insert($entity.id.clone(), $entity.clone());
        Ok(())
    }};
}

impl EntityStore for &MemoryStore {
    async fn load_account(&self, id: &str) -> Result<Option<Account>, StoreError> {
        mem_load!(self, accounts, id)
    }
    async fn save_account(&self, account: &Account) -> Result<(), StoreError> {
        mem_save!(self, accounts, account)
    }

    async fn load_contract(&self, id: &str) -> Result<Option<Contract>, StoreError> {
        mem_load!(self, contracts, id)
    }
    async fn save_contract(&self, contract: &Contract) -> Result<(), StoreError> {
        mem_save!(self, contracts, contract)
    }

    async fn load_token(&self, id: &str) -> Result<Option<Token>, StoreError> {
        mem_load!(self, tokens, id)
    }
    async fn save_token(&self, token: &Token) -> Result<(), StoreError> {
        mem_save!(self, tokens, token)
    }

    async fn save_sale(&self, sale: &Sale) -> Result<(), StoreError> {
        mem_save!(self, sales, sale)
    }
    async fn save_transfer(&self, transfer: &Transfer) -> Result<(), StoreError> {
        mem_save!(self, transfers, transfer)
    }

    async fn load_splitter(&self, id: &str) -> Result<Option<RoyaltySplitter>, StoreError> {
        mem_load!(self, splitters, id)
    }
    async fn save_splitter(&self, splitter: &RoyaltySplitter) -> Result<(), StoreError> {
        mem_save!(self, splitters, splitter)
    }

    async fn load_royalty_balance(&self, id: &str) -> Result<Option<RoyaltyBalance>, StoreError> {
        mem_load!(self, royalty_balances, id)
    }
    async fn save_royalty_balance(&self, balance: &RoyaltyBalance) -> Result<(), StoreError> {
        mem_save!(self, royalty_balances, balance)
    }

    async fn save_royalty_received(&self, received: &RoyaltyReceived) -> Result<(), StoreError> {
        mem_save!(self, royalty_received, received)
    }
    async fn save_royalty_token_received(
        &self,
        received: &RoyaltyTokenReceived,
    ) -> Result<(), StoreError> {
        mem_save!(self, royalty_token_received, received)
    }
    async fn save_royalty_withdraw(&self, withdraw: &RoyaltyWithdraw) -> Result<(), StoreError> {
        mem_save!(self, royalty_withdrawals, withdraw)
    }
    async fn save_royalty_token_withdraw(
        &self,
        withdraw: &RoyaltyTokenWithdraw,
    ) -> Result<(), StoreError> {
        mem_save!(self, royalty_token_withdrawals, withdraw)
    }

    async fn load_marketplace(&self, id: &str) -> Result<Option<Marketplace>, StoreError> {
        mem_load!(self, marketplaces, id)
    }
    async fn save_marketplace(&self, marketplace: &Marketplace) -> Result<(), StoreError> {
        mem_save!(self, marketplaces, marketplace)
    }

    async fn load_listing(&self, id: &str) -> Result<Option<Listing>, StoreError> {
        mem_load!(self, listings, id)
    }
    async fn save_listing(&self, listing: &Listing) -> Result<(), StoreError> {
        mem_save!(self, listings, listing)
    }

    async fn save_purchase(&self, purchase: &Purchase) -> Result<(), StoreError> {
        mem_save!(self, purchases, purchase)
    }
    async fn save_fee_withdrawal(&self, withdrawal: &FeeWithdrawal) -> Result<(), StoreError> {
        mem_save!(self, fee_withdrawals, withdrawal)
    }
}

// ─── Live-state oracle ──────────────────────────────────────────────────────

/// Scriptable oracle: `None`/missing entries behave as failed reads.
#[derive(Default, Clone)]
pub struct ScriptedOracle {
    pub last_minted_id: Option<u64>,
    /// Native balance per beneficiary account.
    pub native_balances: HashMap<Address, u64>,
    /// ERC-20 balance per (asset, beneficiary account).
    pub erc20_balances: HashMap<(Address, Address), u64>,
    pub fee_treasury: Option<Address>,
    pub marketplace_fee_bps: Option<u16>,
    pub accrued_fees: Option<u64>,
    pub last_listing_id: Option<u64>,
}

fn scripted<T>(value: Option<T>) -> Result<T, ReadFailed> {
    value.ok_or_else(|| ReadFailed("scripted failure".into()))
}

impl StateOracle for ScriptedOracle {
    async fn last_minted_id(&self, _collection: Address) -> Result<U256, ReadFailed> {
        scripted(self.last_minted_id.map(U256::from))
    }

    async fn native_balance(
        &self,
        _splitter: Address,
        account: Address,
    ) -> Result<U256, ReadFailed> {
        scripted(self.native_balances.get(&account).copied().map(U256::from))
    }

    async fn erc20_balance(
        &self,
        _splitter: Address,
        asset: Address,
        account: Address,
    ) -> Result<U256, ReadFailed> {
        scripted(
            self.erc20_balances
                .get(&(asset, account))
                .copied()
                .map(U256::from),
        )
    }

    async fn fee_treasury(&self, _marketplace: Address) -> Result<Address, ReadFailed> {
        scripted(self.fee_treasury)
    }

    async fn marketplace_fee_bps(&self, _marketplace: Address) -> Result<u16, ReadFailed> {
        scripted(self.marketplace_fee_bps)
    }

    async fn accrued_fees(&self, _marketplace: Address) -> Result<U256, ReadFailed> {
        scripted(self.accrued_fees.map(U256::from))
    }

    async fn last_listing_id(&self, _marketplace: Address) -> Result<U256, ReadFailed> {
        scripted(self.last_listing_id.map(U256::from))
    }
}

// ─── Watch registry ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingWatches {
    pub watched: Mutex<Vec<Address>>,
}

impl WatchRegistry for &RecordingWatches {
    fn watch(&self, address: Address) {
        self.watched.lock().unwrap().push(address);
    }
}

// ─── Fixtures ───────────────────────────────────────────────────────────────

pub const TS: u64 = 1_700_000_000;

/// Event position fixture; tx hash derives from (block, log index) so
/// distinct events get distinct history ids.
pub fn meta(address: Address, block: u64, log_index: u64) -> EventMeta {
    EventMeta {
        address,
        block_number: block,
        block_timestamp: TS + block,
        transaction_hash: format!("0x{:064x}", (block << 16) | log_index),
        log_index,
    }
}

pub fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn hex(address: Address) -> String {
    format!("{address:#x}")
}
