use commons::{
    ContractError, ContractResult, CustomContractError, TokenAmount, RECEIVE_HOOK_NAME,
};
use concordium_cis2::{AdditionalData, Receiver, TokenIdUnit, Transfer, TransferParams};
use concordium_std::*;

/// Pull a bidder's escrow deposit into this contract. The ledger only allows
/// this if the bidder previously made the contract an operator covering the
/// amount, so a rejection means missing funds or missing authorization.
pub fn deposit<T>(
    host: &mut impl HasHost<T>,
    ledger: &ContractAddress,
    payer: AccountAddress,
    escrow: ContractAddress,
    amount: TokenAmount,
) -> ContractResult<()> {
    host.invoke_contract(
        ledger,
        &TransferParams::from(vec![Transfer {
            token_id: TokenIdUnit(),
            amount,
            from: Address::Account(payer),
            to: Receiver::Contract(
                escrow,
                OwnedEntrypointName::new_unchecked(RECEIVE_HOOK_NAME.into()),
            ),
            data: AdditionalData::empty(),
        }]),
        EntrypointName::new_unchecked("transfer"),
        Amount::zero(),
    )
    .map_err(handle_deposit_error)?;

    Ok(())
}

/// Pay escrowed tokens held by this contract out to an account: refunds to
/// displaced bidders and proceeds to the seller.
pub fn payout<T>(
    host: &mut impl HasHost<T>,
    ledger: &ContractAddress,
    escrow: ContractAddress,
    to: AccountAddress,
    amount: TokenAmount,
) -> ContractResult<()> {
    host.invoke_contract(
        ledger,
        &TransferParams::from(vec![Transfer {
            token_id: TokenIdUnit(),
            amount,
            from: Address::Contract(escrow),
            to: Receiver::Account(to),
            data: AdditionalData::empty(),
        }]),
        EntrypointName::new_unchecked("transfer"),
        Amount::zero(),
    )
    .map_err(handle_payout_error)?;

    Ok(())
}

fn handle_deposit_error<R>(error: CallContractError<R>) -> ContractError {
    match error {
        CallContractError::MissingEntrypoint | CallContractError::MessageFailed => {
            CustomContractError::Incompatible.into()
        }
        CallContractError::LogicReject { .. } => ContractError::InsufficientFunds,
        _ => CustomContractError::InvokeContractError.into(),
    }
}

fn handle_payout_error<R>(error: CallContractError<R>) -> ContractError {
    match error {
        CallContractError::MissingEntrypoint | CallContractError::MessageFailed => {
            CustomContractError::Incompatible.into()
        }
        _ => CustomContractError::InvokeContractError.into(),
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::test::*;
    use commons::PaymentTokenId;
    use concordium_cis2::TokenAmountU64;
    use concordium_std::test_infrastructure::*;

    const LEDGER: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };
    const ESCROW: ContractAddress = ContractAddress {
        index: 0,
        subindex: 0,
    };

    const BIDDER: AccountAddress = AccountAddress([1u8; 32]);

    #[concordium_test]
    fn test_deposit_pulls_from_the_payer() {
        let state_builder = TestStateBuilder::default();
        let mut host = TestHost::new((), state_builder);

        host.setup_mock_entrypoint(
            LEDGER,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParams<PaymentTokenId, TokenAmount>, _>(
                |params| {
                    let transfer = &params.0[0];
                    transfer.amount == TokenAmountU64(500)
                        && transfer.from == Address::Account(BIDDER)
                        && matches!(&transfer.to, Receiver::Contract(escrow, _) if *escrow == ESCROW)
                },
                (),
            ),
        );

        let response = deposit(&mut host, &LEDGER, BIDDER, ESCROW, TokenAmountU64(500));
        claim!(response.is_ok());
    }

    #[concordium_test]
    fn test_ledger_rejection_means_insufficient_funds() {
        let state_builder = TestStateBuilder::default();
        let mut host = TestHost::new((), state_builder);

        host.setup_mock_entrypoint(
            LEDGER,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            reject_mock(-7),
        );

        let response = deposit(&mut host, &LEDGER, BIDDER, ESCROW, TokenAmountU64(500));
        claim!(matches!(response, Err(ContractError::InsufficientFunds)));
    }

    #[concordium_test]
    fn test_payout_sends_from_escrow() {
        let state_builder = TestStateBuilder::default();
        let mut host = TestHost::new((), state_builder);

        host.setup_mock_entrypoint(
            LEDGER,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParams<PaymentTokenId, TokenAmount>, _>(
                |params| {
                    let transfer = &params.0[0];
                    transfer.from == Address::Contract(ESCROW)
                        && matches!(&transfer.to, Receiver::Account(to) if *to == BIDDER)
                },
                (),
            ),
        );

        let response = payout(&mut host, &LEDGER, ESCROW, BIDDER, TokenAmountU64(300));
        claim!(response.is_ok());
    }
}
