use alloy::sol;

// ─── StrDomainsNFT Collection ───────────────────────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract StrDomainsNFT {
        // === Lifecycle events ===
        event Minted(
            uint256 indexed tokenId,
            address indexed to,
            address indexed creator,
            string tokenURI,
            string domain
        );
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
        event SaleRecorded(uint256 indexed tokenId, address indexed buyer, uint256 price, uint256 at);
        event TokenSplitterSet(uint256 indexed tokenId, address indexed splitter, uint16 royaltyBps);

        // === Collection config events ===
        event TreasuryUpdated(address indexed newTreasury);
        event DefaultRoyaltyUpdated(uint16 bps);
        event SplitterFactoryUpdated(address indexed newFactory);

        // === View functions ===
        function getLastId() external view returns (uint256);
        function treasury() external view returns (address);
        function defaultRoyaltyBps() external view returns (uint16);
    }
}

// ─── RoyaltySplitterFactory ─────────────────────────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract RoyaltySplitterFactory {
        event SplitterCreated(
            address indexed splitter,
            address indexed creator,
            address indexed treasury,
            uint16 creatorBps,
            uint16 treasuryBps
        );
    }
}

// ─── RoyaltySplitter (factory-spawned instances) ────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract RoyaltySplitter {
        event Initialized(
            address indexed creator,
            address indexed treasury,
            uint16 creatorBps,
            uint16 treasuryBps
        );
        event SplitsUpdated(uint16 creatorBps, uint16 treasuryBps);
        event Received(address indexed from, uint256 amount);
        event TokenReceived(address indexed token, address indexed from, uint256 amount);
        event Withdraw(address indexed to, uint256 amount);
        event WithdrawToken(address indexed token, address indexed to, uint256 amount);

        // === View functions ===
        function ethBalance(address account) external view returns (uint256);
        function erc20Balance(address token, address account) external view returns (uint256);
    }
}

// ─── Marketplace ────────────────────────────────────────────────────────────
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract Marketplace {
        event Listed(
            uint256 indexed listingId,
            address indexed seller,
            address indexed nft,
            uint256 tokenId,
            uint256 price
        );
        event ListingUpdated(uint256 indexed listingId, uint256 newPrice);
        event ListingCanceled(uint256 indexed listingId);
        event Purchased(
            uint256 indexed listingId,
            address indexed buyer,
            uint256 price,
            address royaltyReceiver,
            uint256 royaltyAmount,
            uint256 feeAmount,
            uint256 sellerAmount
        );
        event FeeWithdrawn(address indexed to, uint256 amount);

        // === View functions ===
        function feeTreasury() external view returns (address);
        function marketplaceFeeBps() external view returns (uint16);
        function accruedFees() external view returns (uint256);
        function lastListingId() external view returns (uint256);
    }
}
