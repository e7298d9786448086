//! Mock entrypoints shared by the contract test suites.
use concordium_std::test_infrastructure::MockFn;
use concordium_std::*;

/// Mock that parses the parameter as `D` and returns the given value.
pub fn parse_and_ok_mock<D: Deserial, S, R: Clone + Serial + 'static>(
    return_value: R,
) -> MockFn<S> {
    MockFn::new(
        move |parameter, _amount, _balance, _state| -> CallContractResult<R> {
            D::deserial(&mut Cursor::new(parameter)).map_err(|_| CallContractError::Trap)?;
            Ok((false, Some(return_value.clone())))
        },
    )
}

/// Mock that parses the parameter as `D`, traps unless it passes the check
/// and returns the given value otherwise.
pub fn parse_and_check_mock<D: Deserial, S, R: Clone + Serial + 'static>(
    check: impl Fn(&D) -> bool + 'static,
    return_value: R,
) -> MockFn<S> {
    MockFn::new(
        move |parameter, _amount, _balance, _state| -> CallContractResult<R> {
            let value =
                D::deserial(&mut Cursor::new(parameter)).map_err(|_| CallContractError::Trap)?;
            if !check(&value) {
                return Err(CallContractError::Trap);
            };
            Ok((false, Some(return_value.clone())))
        },
    )
}

/// Mock that parses the parameter as `D` and traps.
pub fn parse_and_reject_mock<D: Deserial, S>() -> MockFn<S> {
    MockFn::new(
        move |parameter, _amount, _balance, _state| -> CallContractResult<()> {
            D::deserial(&mut Cursor::new(parameter)).map_err(|_| CallContractError::Trap)?;
            Err(CallContractError::Trap)
        },
    )
}
