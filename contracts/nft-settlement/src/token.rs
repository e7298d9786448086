//! Invocation helpers for the fungible payment token. The payment token is
//! a CIS-1 contract holding a single token under the empty token ID.
use commons::{AssetAmount, CustomContractError};
use concordium_cis1::{AdditionalData, Receiver, TokenIdVec, Transfer};
use concordium_std::*;

use crate::nft::{handle_call_error, RECEIVE_HOOK_NAME};

/// Pull bid funds from the bidder into the contract balance. Fails if the
/// bidder does not hold the amount or has not made this contract an
/// operator.
pub fn pull<T>(
    host: &mut impl HasHost<T>,
    contract: &ContractAddress,
    from: AccountAddress,
    self_address: ContractAddress,
    amount: AssetAmount,
) -> Result<(), CustomContractError> {
    host.invoke_contract(
        contract,
        &(
            1u16,
            Transfer {
                token_id: TokenIdVec(Vec::new()),
                amount,
                from: Address::Account(from),
                to: Receiver::Contract(
                    self_address,
                    OwnedReceiveName::new_unchecked(RECEIVE_HOOK_NAME.into()),
                ),
                data: AdditionalData::empty(),
            },
        ),
        EntrypointName::new_unchecked("transfer"),
        Amount::zero(),
    )
    .map_err(|error| match error {
        CallContractError::LogicReject { .. } => CustomContractError::NotEnoughFunds,
        e => handle_call_error(e),
    })?;

    Ok(())
}

/// Send funds from the contract balance to the given account.
pub fn push<T>(
    host: &mut impl HasHost<T>,
    contract: &ContractAddress,
    self_address: ContractAddress,
    to: AccountAddress,
    amount: AssetAmount,
) -> Result<(), CustomContractError> {
    host.invoke_contract(
        contract,
        &(
            1u16,
            Transfer {
                token_id: TokenIdVec(Vec::new()),
                amount,
                from: Address::Contract(self_address),
                to: Receiver::Account(to),
                data: AdditionalData::empty(),
            },
        ),
        EntrypointName::new_unchecked("transfer"),
        Amount::zero(),
    )
    .map_err(handle_call_error)?;

    Ok(())
}

#[concordium_cfg_test]
mod tests {
    use commons::test::*;
    use concordium_cis1::TransferParams;
    use concordium_std::test_infrastructure::*;

    use super::*;

    const PAYMENT_CONTRACT: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };
    const SELF_ADDRESS: ContractAddress = ContractAddress {
        index: 10,
        subindex: 0,
    };

    const USER_1: AccountAddress = AccountAddress([1; 32]);

    #[concordium_test]
    fn test_pull() {
        let mut host = TestHost::new((), TestStateBuilder::default());

        host.setup_mock_entrypoint(
            PAYMENT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParams<TokenIdVec>, _, _>(
                |params| {
                    let transfer = &params.0[0];
                    transfer.amount == 5_000 && transfer.from == Address::Account(USER_1)
                },
                (),
            ),
        );

        let response = pull(&mut host, &PAYMENT_CONTRACT, USER_1, SELF_ADDRESS, 5_000);

        claim_eq!(response, Ok(()))
    }

    #[concordium_test]
    fn test_pull_rejection_means_missing_funds() {
        let mut host = TestHost::new((), TestStateBuilder::default());

        host.setup_mock_entrypoint(
            PAYMENT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            MockFn::new(
                |_parameter, _amount, _balance, _state| -> CallContractResult<()> {
                    Err(CallContractError::LogicReject {
                        reason: -1,
                        return_value: (),
                    })
                },
            ),
        );

        let response = pull(&mut host, &PAYMENT_CONTRACT, USER_1, SELF_ADDRESS, 5_000);

        claim_eq!(response, Err(CustomContractError::NotEnoughFunds))
    }

    #[concordium_test]
    fn test_push() {
        let mut host = TestHost::new((), TestStateBuilder::default());

        host.setup_mock_entrypoint(
            PAYMENT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParams<TokenIdVec>, _, _>(
                |params| {
                    let transfer = &params.0[0];
                    transfer.amount == 5_000
                        && transfer.from == Address::Contract(SELF_ADDRESS)
                        && matches!(&transfer.to, Receiver::Account(account) if *account == USER_1)
                },
                (),
            ),
        );

        let response = push(&mut host, &PAYMENT_CONTRACT, SELF_ADDRESS, USER_1, 5_000);

        claim_eq!(response, Ok(()))
    }
}
