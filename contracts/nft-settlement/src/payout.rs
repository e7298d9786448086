use commons::{AssetAmount, ContractTokenId, CustomContractError, FeeShare, PaymentAsset, Token};
use concordium_std::*;

use crate::events::SettlementEvents;
use crate::nft;
use crate::state::State;
use crate::token;

/// Everything needed to finish a concluded listing: custody hand over and
/// distribution of the final price.
#[must_use]
pub struct Settlement {
    /// Primary token.
    pub token: Token,
    /// Extra token IDs sold together with the primary token.
    pub batch: Vec<ContractTokenId>,
    pub seller: AccountAddress,
    pub asset: PaymentAsset,
    pub price: AssetAmount,
    pub fees: Vec<FeeShare>,
    /// Account the final bid came from.
    pub winner: AccountAddress,
    /// Account receiving the tokens.
    pub recipient: AccountAddress,
}

/// Hand over the sold tokens and distribute the final price.
///
/// Token transfers must succeed. Payments that cannot be delivered are
/// written to the credit ledger instead of failing the settlement.
pub fn execute<S: HasStateApi>(
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    self_address: ContractAddress,
    settlement: Settlement,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let Settlement {
        token,
        batch,
        seller,
        asset,
        price,
        fees,
        winner,
        recipient,
    } = settlement;

    nft::release(host, &token.contract, token.id.clone(), self_address, recipient)?;
    for id in batch {
        nft::release(host, &token.contract, id, self_address, recipient)?;
    }

    let mut seller_share = price;
    for fee in fees.iter() {
        let cut = fee.rate.share_of(price);
        seller_share -= cut;
        deliver_or_credit(host, self_address, asset, &fee.account, cut, logger)?;
    }
    deliver_or_credit(host, self_address, asset, &seller, seller_share, logger)?;

    logger.log(&SettlementEvents::finalize(
        &token.contract,
        &token.id,
        &seller,
        &winner,
        price,
        seller_share,
        &fees,
    ))?;

    Ok(())
}

/// Send funds to the account, falling back to the credit ledger if delivery
/// fails. Only logging can make this fail.
pub fn deliver_or_credit<S: HasStateApi>(
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    self_address: ContractAddress,
    asset: PaymentAsset,
    account: &AccountAddress,
    amount: AssetAmount,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    if amount == 0 {
        return Ok(());
    }

    let delivered = match asset {
        PaymentAsset::Ccd => host
            .invoke_transfer(account, Amount::from_micro_ccd(amount))
            .is_ok(),
        PaymentAsset::Token(contract) => {
            token::push(host, &contract, self_address, *account, amount).is_ok()
        }
    };

    if !delivered {
        host.state_mut().add_credit(*account, asset, amount);
        logger.log(&SettlementEvents::credit(account, asset, amount))?;
    }

    Ok(())
}

/// Pay out a withdrawn credit. Unlike settlement payments, failure here must
/// surface so the whole withdrawal rolls back.
pub fn deliver<S: HasStateApi>(
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    self_address: ContractAddress,
    asset: PaymentAsset,
    account: &AccountAddress,
    amount: AssetAmount,
) -> Result<(), CustomContractError> {
    match asset {
        PaymentAsset::Ccd => {
            host.invoke_transfer(account, Amount::from_micro_ccd(amount))?;
        }
        PaymentAsset::Token(contract) => {
            token::push(host, &contract, self_address, *account, amount)?;
        }
    }
    Ok(())
}
