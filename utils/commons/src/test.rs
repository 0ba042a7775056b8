//! Reusable mocks for the collaborator contracts. Available to dependent
//! crates through the `test-helpers` feature.

#[cfg(any(test, feature = "test-helpers"))]
pub use inner::*;

#[cfg(any(test, feature = "test-helpers"))]
mod inner {
    use concordium_std::test_infrastructure::MockFn;
    use concordium_std::*;

    /// Mock that checks the parameter parses as `D` and accepts the call.
    pub fn parse_and_ok_mock<D: Deserial, S>(
        return_value: impl Clone + Serial + 'static,
    ) -> MockFn<S> {
        MockFn::new(move |parameter, _amount, _balance, _state| {
            D::deserial(&mut Cursor::new(parameter)).map_err(|_| CallContractError::Trap)?;
            Ok((false, Some(return_value.clone())))
        })
    }

    /// Mock that parses the parameter as `D` and accepts the call only if
    /// `check` holds.
    pub fn parse_and_check_mock<D: Deserial, S>(
        check: impl Fn(&D) -> bool + 'static,
        return_value: impl Clone + Serial + 'static,
    ) -> MockFn<S> {
        MockFn::new(move |parameter, _, _, _state| {
            let value =
                D::deserial(&mut Cursor::new(parameter)).map_err(|_| CallContractError::Trap)?;
            if !check(&value) {
                return Err(CallContractError::Trap);
            };
            Ok((false, Some(return_value.clone())))
        })
    }

    /// Mock that rejects every call with the given reason, the way a CIS-2
    /// contract turns down an unauthorized or underfunded transfer.
    pub fn reject_mock<S>(reason: i32) -> MockFn<S> {
        MockFn::new(move |_parameter, _amount, _balance, _state| {
            let result: Result<(bool, Option<()>), CallContractError<()>> =
                Err(CallContractError::LogicReject {
                    reason,
                    return_value: (),
                });
            result
        })
    }
}
