mod common;

use alloy::primitives::U256;

use common::{MemoryStore, RecordingWatches, ScriptedOracle, addr, hex, meta};
use strdomains_chain::ChainEvent;
use strdomains_handlers::Reconciler;

const COLLECTION: u8 = 0xc1;
const MARKET: u8 = 0xd1;
const SELLER: u8 = 0xaa;
const BUYER: u8 = 0xbb;

fn oracle() -> ScriptedOracle {
    ScriptedOracle {
        fee_treasury: Some(addr(0x11)),
        marketplace_fee_bps: Some(200),
        accrued_fees: Some(0),
        last_listing_id: Some(7),
        ..Default::default()
    }
}

fn minted(token_id: u64) -> ChainEvent {
    ChainEvent::Minted {
        meta: meta(addr(COLLECTION), 5, 0),
        token_id: U256::from(token_id),
        to: addr(SELLER),
        creator: addr(SELLER),
        token_uri: format!("ipfs://meta/{token_id}"),
        domain: format!("name{token_id}.str"),
    }
}

fn listed(listing_id: u64, token_id: u64, price: u64, block: u64) -> ChainEvent {
    ChainEvent::Listed {
        meta: meta(addr(MARKET), block, 0),
        listing_id: U256::from(listing_id),
        seller: addr(SELLER),
        nft: addr(COLLECTION),
        token_id: U256::from(token_id),
        price: U256::from(price),
    }
}

#[tokio::test]
async fn first_touch_bootstraps_marketplace_from_reads() {
    let store = MemoryStore::default();
    let watches = RecordingWatches::default();
    let rec = Reconciler::new(&store, oracle(), &watches);

    rec.apply(&minted(1)).await.unwrap();
    rec.apply(&listed(7, 1, 500, 20)).await.unwrap();

    let marketplace = store
        .marketplaces
        .lock()
        .unwrap()
        .get(&hex(addr(MARKET)))
        .cloned()
        .unwrap();
    assert_eq!(marketplace.fee_treasury, hex(addr(0x11)));
    assert_eq!(marketplace.marketplace_fee_bps, 200);
    assert_eq!(marketplace.last_listing_id, "7");

    let listing = store.listings.lock().unwrap().get("7").cloned().unwrap();
    assert!(listing.active);
    assert_eq!(listing.price, "500");
    assert_eq!(listing.seller, hex(addr(SELLER)));
    assert_eq!(listing.token.as_deref(), Some("1"));
}

#[tokio::test]
async fn bootstrap_survives_failed_reads_with_zero_fallbacks() {
    let store = MemoryStore::default();
    let watches = RecordingWatches::default();
    let rec = Reconciler::new(&store, ScriptedOracle::default(), &watches);

    rec.apply(&ChainEvent::FeeWithdrawn {
        meta: meta(addr(MARKET), 20, 0),
        to: addr(0x11),
        amount: U256::from(5u64),
    })
    .await
    .unwrap();

    let marketplace = store
        .marketplaces
        .lock()
        .unwrap()
        .get(&hex(addr(MARKET)))
        .cloned()
        .unwrap();
    assert_eq!(marketplace.fee_treasury, format!("{:#x}", alloy::primitives::Address::ZERO));
    assert_eq!(marketplace.marketplace_fee_bps, 0);
    assert_eq!(marketplace.accrued_fees, "0");
    assert_eq!(marketplace.last_listing_id, "0");

    assert_eq!(store.fee_withdrawals.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn listed_with_unknown_token_is_dropped() {
    let store = MemoryStore::default();
    let watches = RecordingWatches::default();
    let rec = Reconciler::new(&store, oracle(), &watches);

    rec.apply(&listed(7, 1, 500, 20)).await.unwrap();

    assert!(store.listings.lock().unwrap().is_empty());
    // The marketplace singleton was still bootstrapped.
    assert_eq!(store.marketplaces.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn update_synthesizes_active_placeholder() {
    let store = MemoryStore::default();
    let watches = RecordingWatches::default();
    let rec = Reconciler::new(&store, oracle(), &watches);

    rec.apply(&ChainEvent::ListingUpdated {
        meta: meta(addr(MARKET), 20, 0),
        listing_id: U256::from(3),
        new_price: U256::from(900u64),
    })
    .await
    .unwrap();

    let listing = store.listings.lock().unwrap().get("3").cloned().unwrap();
    assert!(listing.active);
    assert_eq!(listing.price, "900");
    assert_eq!(listing.seller, format!("{:#x}", alloy::primitives::Address::ZERO));
    assert_eq!(listing.token_id, "0");
    assert!(listing.token.is_none());
    assert!(listing.updated_at.is_some());
}

#[tokio::test]
async fn cancel_synthesizes_inactive_placeholder() {
    let store = MemoryStore::default();
    let watches = RecordingWatches::default();
    let rec = Reconciler::new(&store, oracle(), &watches);

    rec.apply(&ChainEvent::ListingCanceled {
        meta: meta(addr(MARKET), 20, 0),
        listing_id: U256::from(3),
    })
    .await
    .unwrap();

    let listing = store.listings.lock().unwrap().get("3").cloned().unwrap();
    assert!(!listing.active);
    assert!(listing.canceled_at.is_some());
    assert!(listing.purchase.is_none());
}

#[tokio::test]
async fn cancel_deactivates_an_observed_listing() {
    let store = MemoryStore::default();
    let watches = RecordingWatches::default();
    let rec = Reconciler::new(&store, oracle(), &watches);

    rec.apply(&minted(1)).await.unwrap();
    rec.apply(&listed(7, 1, 500, 20)).await.unwrap();
    rec.apply(&ChainEvent::ListingCanceled {
        meta: meta(addr(MARKET), 21, 0),
        listing_id: U256::from(7),
    })
    .await
    .unwrap();

    let listing = store.listings.lock().unwrap().get("7").cloned().unwrap();
    assert!(!listing.active);
    // Creation-time fields survive the cancel.
    assert_eq!(listing.seller, hex(addr(SELLER)));
    assert_eq!(listing.price, "500");
}

#[tokio::test]
async fn purchase_closes_listing_with_amount_breakdown() {
    let store = MemoryStore::default();
    let watches = RecordingWatches::default();
    let mut o = oracle();
    o.accrued_fees = Some(10);
    let rec = Reconciler::new(&store, o, &watches);

    rec.apply(&minted(1)).await.unwrap();
    rec.apply(&listed(7, 1, 500, 20)).await.unwrap();

    let purchased = ChainEvent::Purchased {
        meta: meta(addr(MARKET), 21, 0),
        listing_id: U256::from(7),
        buyer: addr(BUYER),
        price: U256::from(500u64),
        royalty_receiver: addr(0xe1),
        royalty_amount: U256::from(25u64),
        fee_amount: U256::from(10u64),
        seller_amount: U256::from(465u64),
    };
    rec.apply(&purchased).await.unwrap();
    // Re-delivery overwrites the same rows.
    rec.apply(&purchased).await.unwrap();

    let listing = store.listings.lock().unwrap().get("7").cloned().unwrap();
    assert!(!listing.active);

    let purchases = store.purchases.lock().unwrap();
    assert_eq!(purchases.len(), 1);
    let purchase = purchases.values().next().unwrap();
    assert_eq!(listing.purchase.as_deref(), Some(purchase.id.as_str()));
    assert_eq!(purchase.buyer, hex(addr(BUYER)));
    assert_eq!(purchase.price, "500");
    assert_eq!(purchase.royalty_amount, "25");
    assert_eq!(purchase.fee_amount, "10");
    assert_eq!(purchase.seller_amount, "465");
    assert_eq!(purchase.token, "1");
    drop(purchases);

    let marketplace = store
        .marketplaces
        .lock()
        .unwrap()
        .get(&hex(addr(MARKET)))
        .cloned()
        .unwrap();
    assert_eq!(marketplace.accrued_fees, "10");
}

#[tokio::test]
async fn purchase_of_never_observed_listing_leaves_placeholder_only() {
    let store = MemoryStore::default();
    let watches = RecordingWatches::default();
    let rec = Reconciler::new(&store, oracle(), &watches);

    rec.apply(&ChainEvent::Purchased {
        meta: meta(addr(MARKET), 21, 0),
        listing_id: U256::from(9),
        buyer: addr(BUYER),
        price: U256::from(500u64),
        royalty_receiver: addr(0xe1),
        royalty_amount: U256::from(25u64),
        fee_amount: U256::from(10u64),
        seller_amount: U256::from(465u64),
    })
    .await
    .unwrap();

    assert!(store.purchases.lock().unwrap().is_empty());
    let listing = store.listings.lock().unwrap().get("9").cloned().unwrap();
    assert!(!listing.active);
    assert!(listing.token.is_none());
}

#[tokio::test]
async fn purchase_against_tokenless_listing_is_dropped() {
    let store = MemoryStore::default();
    let watches = RecordingWatches::default();
    let rec = Reconciler::new(&store, oracle(), &watches);

    // Placeholder from an update has no backing token.
    rec.apply(&ChainEvent::ListingUpdated {
        meta: meta(addr(MARKET), 20, 0),
        listing_id: U256::from(3),
        new_price: U256::from(900u64),
    })
    .await
    .unwrap();
    rec.apply(&ChainEvent::Purchased {
        meta: meta(addr(MARKET), 21, 0),
        listing_id: U256::from(3),
        buyer: addr(BUYER),
        price: U256::from(900u64),
        royalty_receiver: addr(0xe1),
        royalty_amount: U256::from(45u64),
        fee_amount: U256::from(18u64),
        seller_amount: U256::from(837u64),
    })
    .await
    .unwrap();

    assert!(store.purchases.lock().unwrap().is_empty());
    // The stored placeholder is left exactly as the update wrote it.
    let listing = store.listings.lock().unwrap().get("3").cloned().unwrap();
    assert!(listing.active);
    assert!(listing.purchase.is_none());
}

#[tokio::test]
async fn fee_withdrawal_refreshes_accrued_fees() {
    let store = MemoryStore::default();
    let watches = RecordingWatches::default();
    let mut o = oracle();
    o.accrued_fees = Some(123);
    let rec = Reconciler::new(&store, o, &watches);

    rec.apply(&ChainEvent::FeeWithdrawn {
        meta: meta(addr(MARKET), 30, 0),
        to: addr(0x11),
        amount: U256::from(100u64),
    })
    .await
    .unwrap();

    let marketplace = store
        .marketplaces
        .lock()
        .unwrap()
        .get(&hex(addr(MARKET)))
        .cloned()
        .unwrap();
    assert_eq!(marketplace.accrued_fees, "123");

    let withdrawals = store.fee_withdrawals.lock().unwrap();
    assert_eq!(withdrawals.len(), 1);
    assert_eq!(withdrawals.values().next().unwrap().amount, "100");
}
