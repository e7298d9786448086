use super::*;

/// The custom errors the contract can produce.
#[derive(Serialize, Debug, PartialEq, Eq, Reject, SchemaType)]
pub enum CustomContractError {
    /// Failed parsing the parameter (Error code: -1).
    #[from(ParseError)]
    ParseParams,
    /// Failed logging: Log is full (Error code: -2).
    LogFull,
    /// Failed logging: Log is malformed (Error code: -3).
    LogMalformed,
    /// Token is already listed for sale (Error code: -4).
    TokenAlreadyListedForSale,
    /// Unknown token (Error code: -5).
    UnknownToken,
    /// Only account addresses can call this function (Error code: -6).
    OnlyAccountAddress,
    /// This function must only be called by a contract (Error code: -7).
    ContractOnly,
    /// Only the seller can call this function (Error code: -8).
    OnlySeller,
    /// Only the whitelisted buyer can bid on this listing (Error code: -9).
    OnlyWhitelistedBuyer,
    /// Only the highest bidder can withdraw the bid (Error code: -10).
    OnlyHighestBidder,
    /// Seller is not allowed to bid on the own listing (Error code: -11).
    SellerCannotBid,
    /// Price cannot be zero (Error code: -12).
    ZeroPrice,
    /// Minimum price exceeds the allowed share of the buy now price
    /// (Error code: -13).
    MinPriceTooHigh,
    /// Custom bid increment is below the allowed floor (Error code: -14).
    IncreaseBelowFloor,
    /// Fee shares exceed the whole price (Error code: -15).
    FeeTotalExceeded,
    /// Too many tokens in a single listing (Error code: -16).
    BatchTooLarge,
    /// Bid does not meet the required amount (Error code: -17).
    BidTooLow,
    /// Bid was placed in the wrong payment asset (Error code: -18).
    WrongPaymentAsset,
    /// Bid amount cannot be zero (Error code: -19).
    ZeroBid,
    /// Bidder does not hold enough funds in the payment asset
    /// (Error code: -20).
    NotEnoughFunds,
    /// The listing has a qualifying bid (Error code: -21).
    AuctionHasValidBid,
    /// Attempt to settle the auction before its deadline (Error code: -22).
    AuctionStillActive,
    /// Attempt to bid after the auction deadline (Error code: -23).
    AuctionFinished,
    /// The listing is not a fixed price sale (Error code: -24).
    NotASale,
    /// This operation does not apply to fixed price sales (Error code: -25).
    NotApplicableForSale,
    /// There is no bid to accept (Error code: -26).
    NoBidToAccept,
    /// Token is not held by this contract (Error code: -27).
    ItemNotDeposited,
    /// No failed payment credits to withdraw (Error code: -28).
    NoCredits,
    /// Caller does not own or operate the token (Error code: -29).
    ItemNotOwned,
    /// Failed to invoke a contract (Error code: -30).
    InvokeContractError,
    /// Failed to invoke a transfer (Error code: -31).
    InvokeTransferError,
    /// Incompatible contract (Error code: -32).
    Incompatible,
    /// Unauthorized (Error code: -33).
    Unauthorized,
    /// Bid increment exceeds the allowed maximum (Error code: -34).
    IncreaseTooLarge,
    /// Auction duration exceeds the allowed maximum (Error code: -35).
    BidPeriodTooLong,
}

/// Mapping the logging errors to CustomContractError.
impl From<LogError> for CustomContractError {
    fn from(le: LogError) -> Self {
        match le {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}

/// Mapping errors related to contract invocations to CustomContractError.
impl<T> From<CallContractError<T>> for CustomContractError {
    fn from(_cce: CallContractError<T>) -> Self {
        Self::InvokeContractError
    }
}

/// Mapping errors related to transfer invocations to CustomContractError.
impl From<TransferError> for CustomContractError {
    fn from(_te: TransferError) -> Self {
        Self::InvokeTransferError
    }
}
