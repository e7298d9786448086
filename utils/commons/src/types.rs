use super::*;

/// Contract token ID type.
pub type ContractTokenId = TokenIdVec;

/// Amount of the payment asset in its base unit. Micro CCD for the native
/// currency, the token base unit for fungible tokens.
pub type AssetAmount = u64;

/// Globally unique token identifier: the token contract address paired with
/// the token ID inside of that contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct Token {
    /// Address of the contract that manages this token.
    pub contract: ContractAddress,
    /// Token identifier inside of the token contract.
    pub id: ContractTokenId,
}

/// Asset the sale is priced and paid in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub enum PaymentAsset {
    /// Native currency.
    Ccd,
    /// CIS-1 fungible token contract.
    Token(ContractAddress),
}

/// A share of sale proceeds that goes to a third party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct FeeShare {
    /// Account receiving this share.
    pub account: AccountAddress,
    /// Share of the final price.
    pub rate: BasisPoints,
}

/// Funds owed to an account after a failed payment delivery. Withdrawable at
/// any time by the account itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct Credit {
    pub asset: PaymentAsset,
    pub amount: AssetAmount,
}
