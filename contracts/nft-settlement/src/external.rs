use commons::{AssetAmount, BasisPoints, ContractTokenId, FeeShare, PaymentAsset, Token};
use concordium_std::*;

/// Auction duration after the first qualifying bid. Every following
/// qualifying bid extends the deadline by the same duration.
pub const DEFAULT_BID_PERIOD: Duration = Duration::from_millis(86_400_000);

/// Bid increment applied when the listing does not specify one.
pub const DEFAULT_BID_INCREASE: BasisPoints = BasisPoints::new(100);

/// Smallest accepted caller supplied bid increment.
pub const MIN_SETTABLE_BID_INCREASE: BasisPoints = BasisPoints::new(1_000);

/// Largest accepted bid increment: doubling the previous bid.
pub const MAX_SETTABLE_BID_INCREASE: BasisPoints = BasisPoints::whole();

/// Largest accepted auction duration.
pub const MAX_BID_PERIOD: Duration = Duration::from_millis(365 * 86_400_000);

/// Largest allowed minimum price relative to the buy now price.
pub const MAX_MIN_PRICE_RATE: BasisPoints = BasisPoints::new(8_000);

/// Largest allowed number of tokens in a single listing.
pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct CreateAuctionParams {
    /// Primary token put up for auction.
    pub token: Token,
    /// Extra token IDs from the same contract, sold together with the
    /// primary token.
    pub batch: Vec<ContractTokenId>,
    /// Asset the auction is priced in.
    pub asset: PaymentAsset,
    /// Smallest bid that starts the auction clock.
    pub min_price: AssetAmount,
    /// Price that concludes the auction immediately. Disabled by default.
    pub buy_now_price: Option<AssetAmount>,
    /// Defaults to [`DEFAULT_BID_PERIOD`].
    pub bid_period: Option<Duration>,
    /// Defaults to [`DEFAULT_BID_INCREASE`]. Custom values must be at least
    /// [`MIN_SETTABLE_BID_INCREASE`].
    pub bid_increase: Option<BasisPoints>,
    /// Shares of the final price paid out to third parties.
    pub fees: Vec<FeeShare>,
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct CreateSaleParams {
    /// Primary token put up for sale.
    pub token: Token,
    /// Extra token IDs from the same contract, sold together with the
    /// primary token.
    pub batch: Vec<ContractTokenId>,
    /// Asset the sale is priced in.
    pub asset: PaymentAsset,
    /// Asking price.
    pub price: AssetAmount,
    /// If set, only this account may buy.
    pub whitelisted_buyer: Option<AccountAddress>,
    /// Shares of the final price paid out to third parties.
    pub fees: Vec<FeeShare>,
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct BidParams {
    pub token: Token,
    /// Asset the bid is made in. Must match the listing.
    pub asset: PaymentAsset,
    /// Bid amount for fungible token bids. CCD bids attach the amount
    /// instead and must leave this at zero.
    pub amount: AssetAmount,
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct CustomBidParams {
    pub token: Token,
    /// Asset the bid is made in. Must match the listing.
    pub asset: PaymentAsset,
    /// Bid amount for fungible token bids. CCD bids attach the amount
    /// instead and must leave this at zero.
    pub amount: AssetAmount,
    /// Account to receive the items instead of the bidder.
    pub recipient: AccountAddress,
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct UpdatePriceParams {
    pub token: Token,
    pub price: AssetAmount,
}

#[derive(Debug, Clone, SchemaType, Serialize)]
pub struct UpdateWhitelistedBuyerParams {
    pub token: Token,
    /// New whitelisted buyer, or `None` to open the sale to everyone.
    pub buyer: Option<AccountAddress>,
}
