pub mod abi;
pub mod decoder;
pub mod oracle;
pub mod provider;

pub use abi::{Marketplace, RoyaltySplitter, RoyaltySplitterFactory, StrDomainsNFT};
pub use decoder::{
    ChainEvent, EventMeta, ZERO_ADDRESS, decode_collection_log, decode_factory_log,
    decode_marketplace_log, decode_splitter_log,
};
pub use oracle::{ReadFailed, RpcOracle, StateOracle};
pub use provider::{ChainProvider, create_provider};
