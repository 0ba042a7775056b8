use commons::{ContractError, ContractResult, CustomContractError, Token};
use concordium_cis2::{AdditionalData, Receiver, TokenAmountU64, Transfer, TransferParams};
use concordium_std::*;

/// Move custody of an asset on its registry contract. Registries follow the
/// CIS-2 transfer interface, so a rejection means this contract lacks
/// ownership of the item or operator rights for `from`.
pub fn transfer_item<T>(
    host: &mut impl HasHost<T>,
    item: &Token,
    from: Address,
    to: Receiver,
) -> ContractResult<()> {
    host.invoke_contract(
        &item.contract,
        &TransferParams::from(vec![Transfer {
            token_id: item.id.clone(),
            amount: TokenAmountU64(1),
            from,
            to,
            data: AdditionalData::empty(),
        }]),
        EntrypointName::new_unchecked("transfer"),
        Amount::zero(),
    )
    .map_err(handle_registry_error)?;

    Ok(())
}

fn handle_registry_error<R>(error: CallContractError<R>) -> ContractError {
    match error {
        CallContractError::MissingEntrypoint | CallContractError::MessageFailed => {
            CustomContractError::Incompatible.into()
        }
        CallContractError::LogicReject { .. } => ContractError::Unauthorized,
        _ => CustomContractError::InvokeContractError.into(),
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::test::*;
    use commons::{ContractTokenId, TokenAmount};
    use concordium_cis2::TokenIdVec;
    use concordium_std::test_infrastructure::*;

    const REGISTRY: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };

    const SELLER: AccountAddress = AccountAddress([1u8; 32]);
    const WINNER: AccountAddress = AccountAddress([2u8; 32]);

    fn item() -> Token {
        Token {
            contract: REGISTRY,
            id: TokenIdVec(vec![21]),
        }
    }

    #[concordium_test]
    fn test_custody_transfer() {
        let state_builder = TestStateBuilder::default();
        let mut host = TestHost::new((), state_builder);

        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParams<ContractTokenId, TokenAmount>, _>(
                |params| {
                    let transfer = &params.0[0];
                    transfer.from == Address::Account(SELLER)
                        && matches!(&transfer.to, Receiver::Account(to) if *to == WINNER)
                },
                (),
            ),
        );

        let response = transfer_item(
            &mut host,
            &item(),
            Address::Account(SELLER),
            Receiver::Account(WINNER),
        );

        claim!(response.is_ok());
    }

    #[concordium_test]
    fn test_registry_rejection_means_unauthorized() {
        let state_builder = TestStateBuilder::default();
        let mut host = TestHost::new((), state_builder);

        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            reject_mock(-3),
        );

        let response = transfer_item(
            &mut host,
            &item(),
            Address::Account(SELLER),
            Receiver::Account(WINNER),
        );

        claim!(matches!(response, Err(ContractError::Unauthorized)));
    }
}
