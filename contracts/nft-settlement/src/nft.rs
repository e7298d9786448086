use commons::{ContractTokenId, CustomContractError};
use concordium_cis1::{AdditionalData, Receiver, Transfer};
use concordium_std::*;

/// Receive hook entrypoint for CIS-1 transfers targeting this contract.
pub const RECEIVE_HOOK_NAME: &str = "NftSettlement.onCis1Received";

/// Pull a token from the depositor into contract custody. Fails if the
/// depositor does not own the token or has not made this contract an
/// operator.
pub fn deposit<T>(
    host: &mut impl HasHost<T>,
    contract: &ContractAddress,
    id: ContractTokenId,
    from: AccountAddress,
    self_address: ContractAddress,
) -> Result<(), CustomContractError> {
    host.invoke_contract(
        contract,
        &(
            1u16,
            Transfer {
                token_id: id,
                amount: 1,
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
        CallContractError::LogicReject { .. } => CustomContractError::ItemNotOwned,
        e => handle_call_error(e),
    })?;

    Ok(())
}

/// Hand a token in custody over to the given account.
pub fn release<T>(
    host: &mut impl HasHost<T>,
    contract: &ContractAddress,
    id: ContractTokenId,
    self_address: ContractAddress,
    to: AccountAddress,
) -> Result<(), CustomContractError> {
    host.invoke_contract(
        contract,
        &(
            1u16,
            Transfer {
                token_id: id,
                amount: 1,
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

pub fn handle_call_error<R>(error: CallContractError<R>) -> CustomContractError {
    match error {
        CallContractError::MissingEntrypoint | CallContractError::MessageFailed => {
            CustomContractError::Incompatible
        }
        CallContractError::LogicReject { .. } => CustomContractError::InvokeContractError,
        e => e.into(),
    }
}

#[concordium_cfg_test]
mod tests {
    use commons::test::*;
    use concordium_cis1::{TokenIdVec, TransferParams};
    use concordium_std::test_infrastructure::*;

    use super::*;

    const NFT_CONTRACT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const SELF_ADDRESS: ContractAddress = ContractAddress {
        index: 10,
        subindex: 0,
    };

    const USER_1: AccountAddress = AccountAddress([1; 32]);

    #[concordium_test]
    fn test_deposit() {
        let state = ();
        let state_builder = TestStateBuilder::default();
        let mut host = TestHost::new(state, state_builder);

        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParams<TokenIdVec>, _, _>(
                |params| {
                    let transfer = &params.0[0];
                    transfer.from == Address::Account(USER_1)
                        && matches!(&transfer.to, Receiver::Contract(address, _) if *address == SELF_ADDRESS)
                },
                (),
            ),
        );

        let response = deposit(
            &mut host,
            &NFT_CONTRACT,
            TokenIdVec(vec![1]),
            USER_1,
            SELF_ADDRESS,
        );

        claim_eq!(response, Ok(()))
    }

    #[concordium_test]
    fn test_release() {
        let state = ();
        let state_builder = TestStateBuilder::default();
        let mut host = TestHost::new(state, state_builder);

        host.setup_mock_entrypoint(
            NFT_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParams<TokenIdVec>, _, _>(
                |params| {
                    let transfer = &params.0[0];
                    transfer.from == Address::Contract(SELF_ADDRESS)
                        && matches!(&transfer.to, Receiver::Account(account) if *account == USER_1)
                },
                (),
            ),
        );

        let response = release(
            &mut host,
            &NFT_CONTRACT,
            TokenIdVec(vec![1]),
            SELF_ADDRESS,
            USER_1,
        );

        claim_eq!(response, Ok(()))
    }

    #[concordium_test]
    fn test_deposit_rejection_means_unowned() {
        let state = ();
        let state_builder = TestStateBuilder::default();
        let mut host = TestHost::new(state, state_builder);

        host.setup_mock_entrypoint(
            NFT_CONTRACT,
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

        let response = deposit(
            &mut host,
            &NFT_CONTRACT,
            TokenIdVec(vec![1]),
            USER_1,
            SELF_ADDRESS,
        );

        claim_eq!(response, Err(CustomContractError::ItemNotOwned))
    }
}
