use alloy::primitives::{Address, U256};
use alloy::rpc::types::Log;

use crate::abi::{Marketplace, RoyaltySplitter, RoyaltySplitterFactory, StrDomainsNFT};

/// Zero address constant used for mint-transfer filtering and sentinels.
pub const ZERO_ADDRESS: Address = Address::ZERO;

/// Block/log position and provenance shared by every decoded event.
#[derive(Debug, Clone)]
pub struct EventMeta {
    /// Emitting contract address.
    pub address: Address,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub transaction_hash: String,
    pub log_index: u64,
}

impl EventMeta {
    fn from_log(log: &Log) -> Option<Self> {
        let block_number = log.block_number?;
        let log_index = log.log_index?;
        let transaction_hash = log
            .transaction_hash
            .map(|h| format!("{h:#x}"))
            .unwrap_or_default();

        Some(Self {
            address: log.address(),
            block_number,
            block_timestamp: log.block_timestamp.unwrap_or(0),
            transaction_hash,
            log_index,
        })
    }
}

/// A decoded event from any of the watched contracts.
#[derive(Debug, Clone)]
pub enum ChainEvent {
    // === StrDomainsNFT collection ===
    Minted {
        meta: EventMeta,
        token_id: U256,
        to: Address,
        creator: Address,
        token_uri: String,
        domain: String,
    },
    Transfer {
        meta: EventMeta,
        from: Address,
        to: Address,
        token_id: U256,
    },
    SaleRecorded {
        meta: EventMeta,
        token_id: U256,
        buyer: Address,
        price: U256,
        at: U256,
    },
    TokenSplitterSet {
        meta: EventMeta,
        token_id: U256,
        splitter: Address,
        royalty_bps: u16,
    },
    TreasuryUpdated {
        meta: EventMeta,
        new_treasury: Address,
    },
    DefaultRoyaltyUpdated {
        meta: EventMeta,
        bps: u16,
    },
    SplitterFactoryUpdated {
        meta: EventMeta,
        new_factory: Address,
    },

    // === RoyaltySplitterFactory ===
    SplitterCreated {
        meta: EventMeta,
        splitter: Address,
        creator: Address,
        treasury: Address,
        creator_bps: u16,
        treasury_bps: u16,
    },

    // === RoyaltySplitter instances ===
    SplitterInitialized {
        meta: EventMeta,
        creator: Address,
        treasury: Address,
        creator_bps: u16,
        treasury_bps: u16,
    },
    SplitsUpdated {
        meta: EventMeta,
        creator_bps: u16,
        treasury_bps: u16,
    },
    RoyaltyReceived {
        meta: EventMeta,
        from: Address,
        amount: U256,
    },
    RoyaltyTokenReceived {
        meta: EventMeta,
        token: Address,
        from: Address,
        amount: U256,
    },
    RoyaltyWithdraw {
        meta: EventMeta,
        to: Address,
        amount: U256,
    },
    RoyaltyTokenWithdraw {
        meta: EventMeta,
        token: Address,
        to: Address,
        amount: U256,
    },

    // === Marketplace ===
    Listed {
        meta: EventMeta,
        listing_id: U256,
        seller: Address,
        nft: Address,
        token_id: U256,
        price: U256,
    },
    ListingUpdated {
        meta: EventMeta,
        listing_id: U256,
        new_price: U256,
    },
    ListingCanceled {
        meta: EventMeta,
        listing_id: U256,
    },
    Purchased {
        meta: EventMeta,
        listing_id: U256,
        buyer: Address,
        price: U256,
        royalty_receiver: Address,
        royalty_amount: U256,
        fee_amount: U256,
        seller_amount: U256,
    },
    FeeWithdrawn {
        meta: EventMeta,
        to: Address,
        amount: U256,
    },
}

impl ChainEvent {
    /// Position/provenance of the underlying log.
    pub fn meta(&self) -> &EventMeta {
        match self {
            ChainEvent::Minted { meta, .. }
            | ChainEvent::Transfer { meta, .. }
            | ChainEvent::SaleRecorded { meta, .. }
            | ChainEvent::TokenSplitterSet { meta, .. }
            | ChainEvent::TreasuryUpdated { meta, .. }
            | ChainEvent::DefaultRoyaltyUpdated { meta, .. }
            | ChainEvent::SplitterFactoryUpdated { meta, .. }
            | ChainEvent::SplitterCreated { meta, .. }
            | ChainEvent::SplitterInitialized { meta, .. }
            | ChainEvent::SplitsUpdated { meta, .. }
            | ChainEvent::RoyaltyReceived { meta, .. }
            | ChainEvent::RoyaltyTokenReceived { meta, .. }
            | ChainEvent::RoyaltyWithdraw { meta, .. }
            | ChainEvent::RoyaltyTokenWithdraw { meta, .. }
            | ChainEvent::Listed { meta, .. }
            | ChainEvent::ListingUpdated { meta, .. }
            | ChainEvent::ListingCanceled { meta, .. }
            | ChainEvent::Purchased { meta, .. }
            | ChainEvent::FeeWithdrawn { meta, .. } => meta,
        }
    }
}

/// Attempt to decode a log emitted by the StrDomainsNFT collection.
pub fn decode_collection_log(log: &Log) -> Option<ChainEvent> {
    let meta = EventMeta::from_log(log)?;

    if let Ok(decoded) = log.log_decode::<StrDomainsNFT::Minted>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::Minted {
            meta,
            token_id: d.tokenId,
            to: d.to,
            creator: d.creator,
            token_uri: d.tokenURI,
            domain: d.domain,
        });
    }
    if let Ok(decoded) = log.log_decode::<StrDomainsNFT::Transfer>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::Transfer {
            meta,
            from: d.from,
            to: d.to,
            token_id: d.tokenId,
        });
    }
    if let Ok(decoded) = log.log_decode::<StrDomainsNFT::SaleRecorded>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::SaleRecorded {
            meta,
            token_id: d.tokenId,
            buyer: d.buyer,
            price: d.price,
            at: d.at,
        });
    }
    if let Ok(decoded) = log.log_decode::<StrDomainsNFT::TokenSplitterSet>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::TokenSplitterSet {
            meta,
            token_id: d.tokenId,
            splitter: d.splitter,
            royalty_bps: d.royaltyBps,
        });
    }
    if let Ok(decoded) = log.log_decode::<StrDomainsNFT::TreasuryUpdated>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::TreasuryUpdated {
            meta,
            new_treasury: d.newTreasury,
        });
    }
    if let Ok(decoded) = log.log_decode::<StrDomainsNFT::DefaultRoyaltyUpdated>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::DefaultRoyaltyUpdated { meta, bps: d.bps });
    }
    if let Ok(decoded) = log.log_decode::<StrDomainsNFT::SplitterFactoryUpdated>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::SplitterFactoryUpdated {
            meta,
            new_factory: d.newFactory,
        });
    }

    None
}

/// Attempt to decode a log emitted by the RoyaltySplitterFactory.
pub fn decode_factory_log(log: &Log) -> Option<ChainEvent> {
    let meta = EventMeta::from_log(log)?;

    let decoded = log.log_decode::<RoyaltySplitterFactory::SplitterCreated>().ok()?;
    let d = decoded.inner.data;

    Some(ChainEvent::SplitterCreated {
        meta,
        splitter: d.splitter,
        creator: d.creator,
        treasury: d.treasury,
        creator_bps: d.creatorBps,
        treasury_bps: d.treasuryBps,
    })
}

/// Attempt to decode a log emitted by a watched RoyaltySplitter instance.
pub fn decode_splitter_log(log: &Log) -> Option<ChainEvent> {
    let meta = EventMeta::from_log(log)?;

    if let Ok(decoded) = log.log_decode::<RoyaltySplitter::Initialized>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::SplitterInitialized {
            meta,
            creator: d.creator,
            treasury: d.treasury,
            creator_bps: d.creatorBps,
            treasury_bps: d.treasuryBps,
        });
    }
    if let Ok(decoded) = log.log_decode::<RoyaltySplitter::SplitsUpdated>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::SplitsUpdated {
            meta,
            creator_bps: d.creatorBps,
            treasury_bps: d.treasuryBps,
        });
    }
    if let Ok(decoded) = log.log_decode::<RoyaltySplitter::Received>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::RoyaltyReceived {
            meta,
            from: d.from,
            amount: d.amount,
        });
    }
    if let Ok(decoded) = log.log_decode::<RoyaltySplitter::TokenReceived>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::RoyaltyTokenReceived {
            meta,
            token: d.token,
            from: d.from,
            amount: d.amount,
        });
    }
    if let Ok(decoded) = log.log_decode::<RoyaltySplitter::Withdraw>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::RoyaltyWithdraw {
            meta,
            to: d.to,
            amount: d.amount,
        });
    }
    if let Ok(decoded) = log.log_decode::<RoyaltySplitter::WithdrawToken>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::RoyaltyTokenWithdraw {
            meta,
            token: d.token,
            to: d.to,
            amount: d.amount,
        });
    }

    None
}

/// Attempt to decode a log emitted by the Marketplace.
pub fn decode_marketplace_log(log: &Log) -> Option<ChainEvent> {
    let meta = EventMeta::from_log(log)?;

    if let Ok(decoded) = log.log_decode::<Marketplace::Listed>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::Listed {
            meta,
            listing_id: d.listingId,
            seller: d.seller,
            nft: d.nft,
            token_id: d.tokenId,
            price: d.price,
        });
    }
    if let Ok(decoded) = log.log_decode::<Marketplace::ListingUpdated>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::ListingUpdated {
            meta,
            listing_id: d.listingId,
            new_price: d.newPrice,
        });
    }
    if let Ok(decoded) = log.log_decode::<Marketplace::ListingCanceled>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::ListingCanceled {
            meta,
            listing_id: d.listingId,
        });
    }
    if let Ok(decoded) = log.log_decode::<Marketplace::Purchased>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::Purchased {
            meta,
            listing_id: d.listingId,
            buyer: d.buyer,
            price: d.price,
            royalty_receiver: d.royaltyReceiver,
            royalty_amount: d.royaltyAmount,
            fee_amount: d.feeAmount,
            seller_amount: d.sellerAmount,
        });
    }
    if let Ok(decoded) = log.log_decode::<Marketplace::FeeWithdrawn>() {
        let d = decoded.inner.data;
        return Some(ChainEvent::FeeWithdrawn {
            meta,
            to: d.to,
            amount: d.amount,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{B256, LogData, U256, address};
    use alloy::sol_types::SolEvent;

    fn wrap(address: Address, data: LogData) -> Log {
        Log {
            inner: alloy::primitives::Log { address, data },
            block_hash: None,
            block_number: Some(42),
            block_timestamp: Some(1_700_000_000),
            transaction_hash: Some(B256::repeat_byte(0xab)),
            transaction_index: Some(0),
            log_index: Some(3),
            removed: false,
        }
    }

    #[test]
    fn decodes_minted() {
        let collection = address!("00000000000000000000000000000000000000c1");
        let ev = StrDomainsNFT::Minted {
            tokenId: U256::from(7),
            to: address!("00000000000000000000000000000000000000aa"),
            creator: address!("00000000000000000000000000000000000000bb"),
            tokenURI: "ipfs://meta/7".into(),
            domain: "alice.str".into(),
        };
        let log = wrap(collection, ev.encode_log_data());

        match decode_collection_log(&log) {
            Some(ChainEvent::Minted {
                meta,
                token_id,
                domain,
                ..
            }) => {
                assert_eq!(meta.address, collection);
                assert_eq!(meta.block_number, 42);
                assert_eq!(meta.log_index, 3);
                assert_eq!(token_id, U256::from(7));
                assert_eq!(domain, "alice.str");
            }
            other => panic!("unexpected decode result: {other:?}"),
        }
    }

    #[test]
    fn decodes_purchased_with_breakdown() {
        let market = address!("00000000000000000000000000000000000000d1");
        let ev = Marketplace::Purchased {
            listingId: U256::from(9),
            buyer: address!("00000000000000000000000000000000000000bb"),
            price: U256::from(500),
            royaltyReceiver: address!("00000000000000000000000000000000000000cc"),
            royaltyAmount: U256::from(25),
            feeAmount: U256::from(10),
            sellerAmount: U256::from(465),
        };
        let log = wrap(market, ev.encode_log_data());

        match decode_marketplace_log(&log) {
            Some(ChainEvent::Purchased {
                listing_id,
                price,
                seller_amount,
                ..
            }) => {
                assert_eq!(listing_id, U256::from(9));
                assert_eq!(price, U256::from(500));
                assert_eq!(seller_amount, U256::from(465));
            }
            other => panic!("unexpected decode result: {other:?}"),
        }
    }

    #[test]
    fn splitter_decoder_rejects_foreign_log() {
        let market = address!("00000000000000000000000000000000000000d1");
        let ev = Marketplace::ListingCanceled {
            listingId: U256::from(1),
        };
        let log = wrap(market, ev.encode_log_data());

        assert!(decode_splitter_log(&log).is_none());
    }

    #[test]
    fn meta_requires_block_position() {
        let factory = address!("00000000000000000000000000000000000000f1");
        let ev = RoyaltySplitterFactory::SplitterCreated {
            splitter: address!("00000000000000000000000000000000000000e1"),
            creator: address!("00000000000000000000000000000000000000aa"),
            treasury: address!("00000000000000000000000000000000000000bb"),
            creatorBps: 9000,
            treasuryBps: 1000,
        };
        let mut log = wrap(factory, ev.encode_log_data());
        log.block_number = None;

        assert!(decode_factory_log(&log).is_none());
    }
}
