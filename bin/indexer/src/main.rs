//! StrDomains Indexer — materializes queryable entity state from the
//! collection, royalty-splitter-factory and marketplace event streams.
//!
//! Flow:
//! 1. Connect to chain RPC & PostgreSQL
//! 2. Seed the dynamic splitter watch set from previously indexed splitters
//! 3. Poll blocks in batches: peek at factory logs to widen the address
//!    filter with splitters created inside the batch, then apply the merged
//!    log set in strict (block, log index) order
//! 4. Feed each decoded event to the reconciler, one at a time
//!
//! Events are final when delivered; there is no reorg handling, only a
//! persistent block cursor.

use alloy::{
    primitives::Address,
    providers::Provider,
    rpc::types::{Filter, Log},
};
use eyre::Result;
use strdomains_chain::{ChainProvider, RpcOracle, decoder, provider};
use strdomains_core::{Settings, telemetry};
use strdomains_handlers::{Reconciler, watch::SharedWatchSet};
use strdomains_storage::{self as storage, PgStore};

/// The three statically watched contract addresses.
#[derive(Debug, Clone, Copy)]
struct WatchedContracts {
    collection: Address,
    factory: Address,
    marketplace: Address,
}

type AppReconciler = Reconciler<PgStore, RpcOracle, SharedWatchSet>;

#[tokio::main]
async fn main() -> Result<()> {
    // ── Initialisation ──────────────────────────────────────────────────
    telemetry::init();
    let settings = Settings::from_env()?;

    tracing::info!(rpc = %settings.rpc_url, "Starting StrDomains Indexer");

    let contracts = WatchedContracts {
        collection: settings.collection_address.parse()?,
        factory: settings.factory_address.parse()?,
        marketplace: settings.marketplace_address.parse()?,
    };

    // Connect to the database
    let pool = storage::connect(&settings.database_url).await?;
    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // Create the RPC provider
    let chain = provider::create_provider(&settings.rpc_url)?;
    tracing::info!("Connected to chain RPC");

    let store = PgStore::new(pool);

    // ── Watch-set seeding ───────────────────────────────────────────────
    // Splitters indexed in earlier runs must keep receiving their events.
    let watches = SharedWatchSet::new();
    let known = store.list_splitter_addresses().await?;
    watches.seed(known.iter().filter_map(|a| a.parse::<Address>().ok()));
    tracing::info!(splitters = watches.len(), "Seeded splitter watch set");

    let oracle = RpcOracle::new(chain.clone());
    let reconciler = Reconciler::new(store.clone(), oracle, watches.clone());

    // ── Main Indexing Loop ──────────────────────────────────────────────
    let mut last_block = store.get_last_indexed_block().await?;
    if last_block == 0 && settings.start_block > 0 {
        last_block = settings.start_block as i64 - 1;
    }

    tracing::info!(from_block = last_block + 1, "Starting indexing loop");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutting down gracefully…");
                break;
            }
            result = index_next_batch(
                &chain,
                &store,
                &reconciler,
                &watches,
                contracts,
                &mut last_block,
                &settings,
            ) => {
                match result {
                    Ok(indexed) => {
                        if !indexed {
                            // We're caught up — wait before polling again
                            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Indexing error, retrying in 5s…");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                }
            }
        }
    }

    tracing::info!("Indexer stopped.");
    Ok(())
}

/// Index the next batch of blocks. Returns `Ok(true)` if work was done,
/// `Ok(false)` if caught up.
async fn index_next_batch(
    chain: &ChainProvider,
    store: &PgStore,
    reconciler: &AppReconciler,
    watches: &SharedWatchSet,
    contracts: WatchedContracts,
    last_block: &mut i64,
    settings: &Settings,
) -> Result<bool> {
    let chain_head = chain.get_block_number().await? as i64;

    if *last_block >= chain_head {
        return Ok(false); // Caught up
    }

    let from = (*last_block + 1) as u64;
    let to = std::cmp::min(from + settings.batch_size - 1, chain_head as u64);

    tracing::info!(from = from, to = to, head = chain_head, "Indexing batch");

    // ── Filter construction ─────────────────────────────────────────────
    // Peek at the factory's logs first: a splitter created inside this
    // batch must be part of the main fetch so its own events in later
    // blocks of the same range are not missed. The peek only widens the
    // address filter; the events themselves are applied in stream order
    // below.
    let factory_filter = Filter::new()
        .address(contracts.factory)
        .from_block(from)
        .to_block(to);

    let factory_logs = chain.get_logs(&factory_filter).await?;

    let mut addresses = vec![contracts.collection, contracts.marketplace];
    addresses.extend(watches.snapshot());
    for log in &factory_logs {
        if let Some(decoder::ChainEvent::SplitterCreated { splitter, .. }) =
            decoder::decode_factory_log(log)
        {
            if !addresses.contains(&splitter) {
                addresses.push(splitter);
            }
        }
    }

    // ── Fetch and order ─────────────────────────────────────────────────
    let filter = Filter::new().address(addresses).from_block(from).to_block(to);

    let mut logs = chain.get_logs(&filter).await?;
    logs.extend(factory_logs);
    sort_chronologically(&mut logs);
    tracing::info!(count = logs.len(), "Fetched logs");

    let mut applied = 0usize;
    for log in &logs {
        let source = log.address();
        let event = if source == contracts.collection {
            decoder::decode_collection_log(log)
        } else if source == contracts.factory {
            decoder::decode_factory_log(log)
        } else if source == contracts.marketplace {
            decoder::decode_marketplace_log(log)
        } else if watches.contains(&source) {
            decoder::decode_splitter_log(log)
        } else {
            None
        };

        if let Some(event) = event {
            reconciler.apply(&event).await?;
            applied += 1;
        }
    }

    // ── Advance the cursor ──────────────────────────────────────────────
    store.set_last_indexed_block(to as i64).await?;
    *last_block = to as i64;

    tracing::info!(block = to, events = applied, "Batch complete");

    Ok(true)
}

/// Strict (block number, log index) order — the only ordering guarantee the
/// reconciler relies on.
fn sort_chronologically(logs: &mut [Log]) {
    logs.sort_by_key(|log| (log.block_number.unwrap_or(0), log.log_index.unwrap_or(0)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::LogData;

    fn log_at(address: Address, block: u64, index: u64) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address,
                data: LogData::default(),
            },
            block_hash: None,
            block_number: Some(block),
            block_timestamp: None,
            transaction_hash: None,
            transaction_index: None,
            log_index: Some(index),
            removed: false,
        }
    }

    // Factory logs are fetched separately but merged into one stream; the
    // sort must interleave them with collection/marketplace logs in strict
    // chain order.
    #[test]
    fn merged_logs_sort_across_contracts() {
        let factory = Address::repeat_byte(0xf1);
        let collection = Address::repeat_byte(0xc1);

        let mut logs = vec![
            log_at(factory, 11, 0),
            log_at(collection, 10, 2),
            log_at(collection, 11, 1),
            log_at(factory, 10, 0),
        ];
        sort_chronologically(&mut logs);

        let order: Vec<(u64, u64)> = logs
            .iter()
            .map(|log| (log.block_number.unwrap(), log.log_index.unwrap()))
            .collect();
        assert_eq!(order, [(10, 0), (10, 2), (11, 0), (11, 1)]);
    }
}
