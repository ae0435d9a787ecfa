//! PostgreSQL implementation of the entity store, plus read-side query
//! helpers for the API server.

use sqlx::PgPool;

use crate::models::*;
use crate::store::{EntityStore, StoreError};

/// Postgres-backed entity store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Addresses of all splitters seen so far, used to seed the dynamic
    /// watch set on startup.
    pub async fn list_splitter_addresses(&self) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT address FROM royalty_splitters")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Get the last indexed block from persistent state.
    pub async fn get_last_indexed_block(&self) -> Result<i64, StoreError> {
        let row: (String,) =
            sqlx::query_as("SELECT value FROM indexer_state WHERE key = 'last_indexed_block'")
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0.parse::<i64>().unwrap_or(0))
    }

    /// Set the last indexed block in persistent state.
    pub async fn set_last_indexed_block(&self, block_number: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE indexer_state SET value = $1 WHERE key = 'last_indexed_block'")
            .bind(block_number.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl EntityStore for PgStore {
    async fn load_account(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Ok(sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn save_account(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO accounts (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(&account.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn load_contract(&self, id: &str) -> Result<Option<Contract>, StoreError> {
        Ok(sqlx::query_as::<_, Contract>("SELECT * FROM contracts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn save_contract(&self, contract: &Contract) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO contracts (id, treasury, splitter_factory, default_royalty_bps, last_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                treasury = EXCLUDED.treasury,
                splitter_factory = EXCLUDED.splitter_factory,
                default_royalty_bps = EXCLUDED.default_royalty_bps,
                last_id = EXCLUDED.last_id
            "#,
        )
        .bind(&contract.id)
        .bind(&contract.treasury)
        .bind(&contract.splitter_factory)
        .bind(contract.default_royalty_bps)
        .bind(&contract.last_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_token(&self, id: &str) -> Result<Option<Token>, StoreError> {
        Ok(sqlx::query_as::<_, Token>("SELECT * FROM tokens WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn save_token(&self, token: &Token) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO tokens (id, token_id, owner, creator, token_uri, domain_name, minted_at,
                                last_sale_price, last_sale_at, royalty_splitter, royalty_bps,
                                block_number, transaction_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                token_id = EXCLUDED.token_id,
                owner = EXCLUDED.owner,
                creator = EXCLUDED.creator,
                token_uri = EXCLUDED.token_uri,
                domain_name = EXCLUDED.domain_name,
                minted_at = EXCLUDED.minted_at,
                last_sale_price = EXCLUDED.last_sale_price,
                last_sale_at = EXCLUDED.last_sale_at,
                royalty_splitter = EXCLUDED.royalty_splitter,
                royalty_bps = EXCLUDED.royalty_bps,
                block_number = EXCLUDED.block_number,
                transaction_hash = EXCLUDED.transaction_hash
            "#,
        )
        .bind(&token.id)
        .bind(&token.token_id)
        .bind(&token.owner)
        .bind(&token.creator)
        .bind(&token.token_uri)
        .bind(&token.domain_name)
        .bind(token.minted_at)
        .bind(&token.last_sale_price)
        .bind(token.last_sale_at)
        .bind(&token.royalty_splitter)
        .bind(token.royalty_bps)
        .bind(token.block_number)
        .bind(&token.transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_sale(&self, sale: &Sale) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sales (id, token, buyer, price, timestamp, block_number, transaction_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                token = EXCLUDED.token,
                buyer = EXCLUDED.buyer,
                price = EXCLUDED.price,
                timestamp = EXCLUDED.timestamp,
                block_number = EXCLUDED.block_number,
                transaction_hash = EXCLUDED.transaction_hash
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.token)
        .bind(&sale.buyer)
        .bind(&sale.price)
        .bind(sale.timestamp)
        .bind(sale.block_number)
        .bind(&sale.transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_transfer(&self, transfer: &Transfer) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO transfers (id, token, from_address, to_address, timestamp, block_number, transaction_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                token = EXCLUDED.token,
                from_address = EXCLUDED.from_address,
                to_address = EXCLUDED.to_address,
                timestamp = EXCLUDED.timestamp,
                block_number = EXCLUDED.block_number,
                transaction_hash = EXCLUDED.transaction_hash
            "#,
        )
        .bind(&transfer.id)
        .bind(&transfer.token)
        .bind(&transfer.from_address)
        .bind(&transfer.to_address)
        .bind(transfer.timestamp)
        .bind(transfer.block_number)
        .bind(&transfer.transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_splitter(&self, id: &str) -> Result<Option<RoyaltySplitter>, StoreError> {
        Ok(
            sqlx::query_as::<_, RoyaltySplitter>("SELECT * FROM royalty_splitters WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn save_splitter(&self, splitter: &RoyaltySplitter) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO royalty_splitters (id, address, token, creator, treasury, creator_bps,
                                           treasury_bps, eth_balance, creator_eth_balance,
                                           treasury_eth_balance, created_at, block_number,
                                           transaction_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                address = EXCLUDED.address,
                token = EXCLUDED.token,
                creator = EXCLUDED.creator,
                treasury = EXCLUDED.treasury,
                creator_bps = EXCLUDED.creator_bps,
                treasury_bps = EXCLUDED.treasury_bps,
                eth_balance = EXCLUDED.eth_balance,
                creator_eth_balance = EXCLUDED.creator_eth_balance,
                treasury_eth_balance = EXCLUDED.treasury_eth_balance,
                created_at = EXCLUDED.created_at,
                block_number = EXCLUDED.block_number,
                transaction_hash = EXCLUDED.transaction_hash
            "#,
        )
        .bind(&splitter.id)
        .bind(&splitter.address)
        .bind(&splitter.token)
        .bind(&splitter.creator)
        .bind(&splitter.treasury)
        .bind(splitter.creator_bps)
        .bind(splitter.treasury_bps)
        .bind(&splitter.eth_balance)
        .bind(&splitter.creator_eth_balance)
        .bind(&splitter.treasury_eth_balance)
        .bind(splitter.created_at)
        .bind(splitter.block_number)
        .bind(&splitter.transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_royalty_balance(&self, id: &str) -> Result<Option<RoyaltyBalance>, StoreError> {
        Ok(
            sqlx::query_as::<_, RoyaltyBalance>("SELECT * FROM royalty_balances WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn save_royalty_balance(&self, balance: &RoyaltyBalance) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO royalty_balances (id, splitter, token, creator_balance, treasury_balance)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                splitter = EXCLUDED.splitter,
                token = EXCLUDED.token,
                creator_balance = EXCLUDED.creator_balance,
                treasury_balance = EXCLUDED.treasury_balance
            "#,
        )
        .bind(&balance.id)
        .bind(&balance.splitter)
        .bind(&balance.token)
        .bind(&balance.creator_balance)
        .bind(&balance.treasury_balance)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_royalty_received(&self, received: &RoyaltyReceived) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO royalty_received (id, splitter, from_address, amount, timestamp, block_number, transaction_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                splitter = EXCLUDED.splitter,
                from_address = EXCLUDED.from_address,
                amount = EXCLUDED.amount,
                timestamp = EXCLUDED.timestamp,
                block_number = EXCLUDED.block_number,
                transaction_hash = EXCLUDED.transaction_hash
            "#,
        )
        .bind(&received.id)
        .bind(&received.splitter)
        .bind(&received.from_address)
        .bind(&received.amount)
        .bind(received.timestamp)
        .bind(received.block_number)
        .bind(&received.transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_royalty_token_received(
        &self,
        received: &RoyaltyTokenReceived,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO royalty_token_received (id, splitter, token, from_address, amount, timestamp, block_number, transaction_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                splitter = EXCLUDED.splitter,
                token = EXCLUDED.token,
                from_address = EXCLUDED.from_address,
                amount = EXCLUDED.amount,
                timestamp = EXCLUDED.timestamp,
                block_number = EXCLUDED.block_number,
                transaction_hash = EXCLUDED.transaction_hash
            "#,
        )
        .bind(&received.id)
        .bind(&received.splitter)
        .bind(&received.token)
        .bind(&received.from_address)
        .bind(&received.amount)
        .bind(received.timestamp)
        .bind(received.block_number)
        .bind(&received.transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_royalty_withdraw(&self, withdraw: &RoyaltyWithdraw) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO royalty_withdrawals (id, splitter, to_address, amount, timestamp, block_number, transaction_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                splitter = EXCLUDED.splitter,
                to_address = EXCLUDED.to_address,
                amount = EXCLUDED.amount,
                timestamp = EXCLUDED.timestamp,
                block_number = EXCLUDED.block_number,
                transaction_hash = EXCLUDED.transaction_hash
            "#,
        )
        .bind(&withdraw.id)
        .bind(&withdraw.splitter)
        .bind(&withdraw.to_address)
        .bind(&withdraw.amount)
        .bind(withdraw.timestamp)
        .bind(withdraw.block_number)
        .bind(&withdraw.transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_royalty_token_withdraw(
        &self,
        withdraw: &RoyaltyTokenWithdraw,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO royalty_token_withdrawals (id, splitter, token, to_address, amount, timestamp, block_number, transaction_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                splitter = EXCLUDED.splitter,
                token = EXCLUDED.token,
                to_address = EXCLUDED.to_address,
                amount = EXCLUDED.amount,
                timestamp = EXCLUDED.timestamp,
                block_number = EXCLUDED.block_number,
                transaction_hash = EXCLUDED.transaction_hash
            "#,
        )
        .bind(&withdraw.id)
        .bind(&withdraw.splitter)
        .bind(&withdraw.token)
        .bind(&withdraw.to_address)
        .bind(&withdraw.amount)
        .bind(withdraw.timestamp)
        .bind(withdraw.block_number)
        .bind(&withdraw.transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_marketplace(&self, id: &str) -> Result<Option<Marketplace>, StoreError> {
        Ok(
            sqlx::query_as::<_, Marketplace>("SELECT * FROM marketplaces WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn save_marketplace(&self, marketplace: &Marketplace) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO marketplaces (id, fee_treasury, marketplace_fee_bps, accrued_fees,
                                      last_listing_id, created_at, block_number, transaction_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                fee_treasury = EXCLUDED.fee_treasury,
                marketplace_fee_bps = EXCLUDED.marketplace_fee_bps,
                accrued_fees = EXCLUDED.accrued_fees,
                last_listing_id = EXCLUDED.last_listing_id,
                created_at = EXCLUDED.created_at,
                block_number = EXCLUDED.block_number,
                transaction_hash = EXCLUDED.transaction_hash
            "#,
        )
        .bind(&marketplace.id)
        .bind(&marketplace.fee_treasury)
        .bind(marketplace.marketplace_fee_bps)
        .bind(&marketplace.accrued_fees)
        .bind(&marketplace.last_listing_id)
        .bind(marketplace.created_at)
        .bind(marketplace.block_number)
        .bind(&marketplace.transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_listing(&self, id: &str) -> Result<Option<Listing>, StoreError> {
        Ok(sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn save_listing(&self, listing: &Listing) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO listings (id, listing_id, marketplace, seller, nft, token, token_id, price,
                                  active, purchase, created_at, updated_at, canceled_at,
                                  block_number, transaction_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (id) DO UPDATE SET
                listing_id = EXCLUDED.listing_id,
                marketplace = EXCLUDED.marketplace,
                seller = EXCLUDED.seller,
                nft = EXCLUDED.nft,
                token = EXCLUDED.token,
                token_id = EXCLUDED.token_id,
                price = EXCLUDED.price,
                active = EXCLUDED.active,
                purchase = EXCLUDED.purchase,
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at,
                canceled_at = EXCLUDED.canceled_at,
                block_number = EXCLUDED.block_number,
                transaction_hash = EXCLUDED.transaction_hash
            "#,
        )
        .bind(&listing.id)
        .bind(&listing.listing_id)
        .bind(&listing.marketplace)
        .bind(&listing.seller)
        .bind(&listing.nft)
        .bind(&listing.token)
        .bind(&listing.token_id)
        .bind(&listing.price)
        .bind(listing.active)
        .bind(&listing.purchase)
        .bind(listing.created_at)
        .bind(listing.updated_at)
        .bind(listing.canceled_at)
        .bind(listing.block_number)
        .bind(&listing.transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_purchase(&self, purchase: &Purchase) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO purchases (id, marketplace, listing, listing_id, buyer, token, price,
                                   royalty_receiver, royalty_amount, fee_amount, seller_amount,
                                   timestamp, block_number, transaction_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO UPDATE SET
                marketplace = EXCLUDED.marketplace,
                listing = EXCLUDED.listing,
                listing_id = EXCLUDED.listing_id,
                buyer = EXCLUDED.buyer,
                token = EXCLUDED.token,
                price = EXCLUDED.price,
                royalty_receiver = EXCLUDED.royalty_receiver,
                royalty_amount = EXCLUDED.royalty_amount,
                fee_amount = EXCLUDED.fee_amount,
                seller_amount = EXCLUDED.seller_amount,
                timestamp = EXCLUDED.timestamp,
                block_number = EXCLUDED.block_number,
                transaction_hash = EXCLUDED.transaction_hash
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.marketplace)
        .bind(&purchase.listing)
        .bind(&purchase.listing_id)
        .bind(&purchase.buyer)
        .bind(&purchase.token)
        .bind(&purchase.price)
        .bind(&purchase.royalty_receiver)
        .bind(&purchase.royalty_amount)
        .bind(&purchase.fee_amount)
        .bind(&purchase.seller_amount)
        .bind(purchase.timestamp)
        .bind(purchase.block_number)
        .bind(&purchase.transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_fee_withdrawal(&self, withdrawal: &FeeWithdrawal) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO fee_withdrawals (id, marketplace, to_address, amount, timestamp, block_number, transaction_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                marketplace = EXCLUDED.marketplace,
                to_address = EXCLUDED.to_address,
                amount = EXCLUDED.amount,
                timestamp = EXCLUDED.timestamp,
                block_number = EXCLUDED.block_number,
                transaction_hash = EXCLUDED.transaction_hash
            "#,
        )
        .bind(&withdrawal.id)
        .bind(&withdrawal.marketplace)
        .bind(&withdrawal.to_address)
        .bind(&withdrawal.amount)
        .bind(withdrawal.timestamp)
        .bind(withdrawal.block_number)
        .bind(&withdrawal.transaction_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ─── Read-side queries (API server) ─────────────────────────────────────────

/// Most recently minted tokens.
pub async fn get_recent_tokens(pool: &PgPool, limit: i64) -> Result<Vec<Token>, sqlx::Error> {
    sqlx::query_as::<_, Token>("SELECT * FROM tokens ORDER BY minted_at DESC LIMIT $1")
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// Single token by decimal id.
pub async fn get_token(pool: &PgPool, id: &str) -> Result<Option<Token>, sqlx::Error> {
    sqlx::query_as::<_, Token>("SELECT * FROM tokens WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Transfer history for a token, newest first.
pub async fn get_token_transfers(
    pool: &PgPool,
    token: &str,
    limit: i64,
) -> Result<Vec<Transfer>, sqlx::Error> {
    sqlx::query_as::<_, Transfer>(
        "SELECT * FROM transfers WHERE token = $1 ORDER BY block_number DESC LIMIT $2",
    )
    .bind(token)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Most recent sales across the collection.
pub async fn get_recent_sales(pool: &PgPool, limit: i64) -> Result<Vec<Sale>, sqlx::Error> {
    sqlx::query_as::<_, Sale>("SELECT * FROM sales ORDER BY timestamp DESC LIMIT $1")
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// Active listings ordered by numeric listing id.
pub async fn get_active_listings(pool: &PgPool, limit: i64) -> Result<Vec<Listing>, sqlx::Error> {
    sqlx::query_as::<_, Listing>(
        r#"
        SELECT * FROM listings
        WHERE active = TRUE
        ORDER BY CAST(listing_id AS NUMERIC) DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Single listing by decimal id.
pub async fn get_listing(pool: &PgPool, id: &str) -> Result<Option<Listing>, sqlx::Error> {
    sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Single splitter by lower-hex address id.
pub async fn get_splitter(
    pool: &PgPool,
    id: &str,
) -> Result<Option<RoyaltySplitter>, sqlx::Error> {
    sqlx::query_as::<_, RoyaltySplitter>("SELECT * FROM royalty_splitters WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}
