/// Tag for the Custom Listing event.
pub const LISTING_TAG: u8 = u8::MAX - 5;

/// Tag for the Custom Biding event.
pub const BIDING_TAG: u8 = u8::MAX - 6;

/// Tag for the Custom Bid Refund event.
pub const BID_REFUND_TAG: u8 = u8::MAX - 7;

/// Tag for the Custom Cancel Listing event.
pub const CANCEL_TAG: u8 = u8::MAX - 8;

/// Tag for the Custom Finalize Biding event.
pub const FINALIZE_TAG: u8 = u8::MAX - 9;

/// Tag for the Custom Credit event.
pub const CREDIT_TAG: u8 = u8::MAX - 10;

/// Tag for the Custom Credit Withdraw event.
pub const CREDIT_WITHDRAW_TAG: u8 = u8::MAX - 11;
