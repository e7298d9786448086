use commons::{
    AssetAmount, ContractTokenId, Credit, FeeShare, PaymentAsset, BIDING_TAG, BID_REFUND_TAG,
    CANCEL_TAG, CREDIT_TAG, CREDIT_WITHDRAW_TAG, FINALIZE_TAG, LISTING_TAG,
};
use concordium_std::*;

use crate::state::ListingKind;

/// Listing created event data.
#[derive(Debug, Serial)]
pub struct ListingEvent<'a> {
    /// NFT contract address.
    pub contract: &'a ContractAddress,
    /// Primary token identifier.
    pub id: &'a ContractTokenId,
    /// Seller account address.
    pub seller: &'a AccountAddress,
    pub kind: ListingKind,
    pub asset: PaymentAsset,
    /// Minimum price for auctions, asking price for sales.
    pub price: AssetAmount,
}

/// Bid event data.
#[derive(Debug, Serial)]
pub struct BidEvent<'a> {
    /// NFT contract address.
    pub contract: &'a ContractAddress,
    /// Primary token identifier.
    pub id: &'a ContractTokenId,
    /// Bidder account address.
    pub bidder: &'a AccountAddress,
    /// Bid amount.
    pub amount: AssetAmount,
}

/// Bid refund event data. Logged when a bid is outbid, withdrawn or voided.
#[derive(Debug, Serial)]
pub struct BidRefundEvent<'a> {
    /// NFT contract address.
    pub contract: &'a ContractAddress,
    /// Primary token identifier.
    pub id: &'a ContractTokenId,
    /// Bidder account address.
    pub bidder: &'a AccountAddress,
    /// Refunded amount.
    pub amount: AssetAmount,
}

/// Listing withdrawn event data.
#[derive(Debug, Serial)]
pub struct CancelEvent<'a> {
    /// NFT contract address.
    pub contract: &'a ContractAddress,
    /// Primary token identifier.
    pub id: &'a ContractTokenId,
    /// Seller account address.
    pub seller: &'a AccountAddress,
}

/// Settlement event data.
#[derive(Debug, Serial)]
pub struct FinalizeEvent<'a> {
    /// NFT contract address.
    pub contract: &'a ContractAddress,
    /// Primary token identifier.
    pub id: &'a ContractTokenId,
    /// Seller account address.
    pub seller: &'a AccountAddress,
    /// Account the final bid came from.
    pub winner: &'a AccountAddress,
    /// Final price.
    pub price: AssetAmount,
    /// Seller share after deducting fees.
    pub seller_share: AssetAmount,
    /// Fee shares deducted from the price.
    pub fees: &'a Vec<FeeShare>,
}

/// Failed payment delivery event data.
#[derive(Debug, Serial)]
pub struct CreditEvent<'a> {
    /// Account the payment was meant for.
    pub account: &'a AccountAddress,
    pub asset: PaymentAsset,
    pub amount: AssetAmount,
}

/// Credit withdrawal event data.
#[derive(Debug, Serial)]
pub struct CreditWithdrawEvent<'a> {
    /// Account withdrawing its credits.
    pub account: &'a AccountAddress,
    /// Everything paid out, one entry per asset.
    pub credits: &'a Vec<Credit>,
}

/// Tagged Custom event to be serialized for the event log.
#[derive(Debug)]
pub enum SettlementEvents<'a> {
    Listing(ListingEvent<'a>),
    Bid(BidEvent<'a>),
    BidRefund(BidRefundEvent<'a>),
    Cancel(CancelEvent<'a>),
    Finalize(FinalizeEvent<'a>),
    Credit(CreditEvent<'a>),
    CreditWithdraw(CreditWithdrawEvent<'a>),
}

impl<'a> SettlementEvents<'a> {
    pub fn listing(
        contract: &'a ContractAddress,
        id: &'a ContractTokenId,
        seller: &'a AccountAddress,
        kind: ListingKind,
        asset: PaymentAsset,
        price: AssetAmount,
    ) -> Self {
        Self::Listing(ListingEvent {
            contract,
            id,
            seller,
            kind,
            asset,
            price,
        })
    }

    pub fn bid(
        contract: &'a ContractAddress,
        id: &'a ContractTokenId,
        bidder: &'a AccountAddress,
        amount: AssetAmount,
    ) -> Self {
        Self::Bid(BidEvent {
            contract,
            id,
            bidder,
            amount,
        })
    }

    pub fn bid_refund(
        contract: &'a ContractAddress,
        id: &'a ContractTokenId,
        bidder: &'a AccountAddress,
        amount: AssetAmount,
    ) -> Self {
        Self::BidRefund(BidRefundEvent {
            contract,
            id,
            bidder,
            amount,
        })
    }

    pub fn cancel(
        contract: &'a ContractAddress,
        id: &'a ContractTokenId,
        seller: &'a AccountAddress,
    ) -> Self {
        Self::Cancel(CancelEvent {
            contract,
            id,
            seller,
        })
    }

    pub fn finalize(
        contract: &'a ContractAddress,
        id: &'a ContractTokenId,
        seller: &'a AccountAddress,
        winner: &'a AccountAddress,
        price: AssetAmount,
        seller_share: AssetAmount,
        fees: &'a Vec<FeeShare>,
    ) -> Self {
        Self::Finalize(FinalizeEvent {
            contract,
            id,
            seller,
            winner,
            price,
            seller_share,
            fees,
        })
    }

    pub fn credit(account: &'a AccountAddress, asset: PaymentAsset, amount: AssetAmount) -> Self {
        Self::Credit(CreditEvent {
            account,
            asset,
            amount,
        })
    }

    pub fn credit_withdraw(account: &'a AccountAddress, credits: &'a Vec<Credit>) -> Self {
        Self::CreditWithdraw(CreditWithdrawEvent { account, credits })
    }
}

impl<'a> Serial for SettlementEvents<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            SettlementEvents::Listing(event) => {
                out.write_u8(LISTING_TAG)?;
                event.serial(out)
            }
            SettlementEvents::Bid(event) => {
                out.write_u8(BIDING_TAG)?;
                event.serial(out)
            }
            SettlementEvents::BidRefund(event) => {
                out.write_u8(BID_REFUND_TAG)?;
                event.serial(out)
            }
            SettlementEvents::Cancel(event) => {
                out.write_u8(CANCEL_TAG)?;
                event.serial(out)
            }
            SettlementEvents::Finalize(event) => {
                out.write_u8(FINALIZE_TAG)?;
                event.serial(out)
            }
            SettlementEvents::Credit(event) => {
                out.write_u8(CREDIT_TAG)?;
                event.serial(out)
            }
            SettlementEvents::CreditWithdraw(event) => {
                out.write_u8(CREDIT_WITHDRAW_TAG)?;
                event.serial(out)
            }
        }
    }
}
