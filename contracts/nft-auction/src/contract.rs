use commons::*;
use concordium_cis2::Receiver;
use concordium_std::*;

use crate::events::AuctionEvents;
use crate::external::*;
use crate::nft;
use crate::state::{Auction, State};
use crate::token;

/// Initialize the auction house with an empty auction arena.
#[init(contract = "NftAuction")]
fn contract_init<S: HasStateApi>(
    _ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    Ok(State::empty(state_builder))
}

/// Open an auction with no reserve: the first bid may be any positive
/// amount.
#[receive(
    mutable,
    contract = "NftAuction",
    name = "createAuction",
    parameter = "CreateParams",
    return_value = "AuctionId",
    enable_logger
)]
fn contract_create_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<AuctionId> {
    let params = CreateParams::deserial(&mut ctx.parameter_cursor())?;
    create_auction(ctx, host, logger, params, None)
}

/// Open an auction whose opening bid must meet the reserve.
#[receive(
    mutable,
    contract = "NftAuction",
    name = "createAuctionWithReserve",
    parameter = "CreateWithReserveParams",
    return_value = "AuctionId",
    enable_logger
)]
fn contract_create_auction_with_reserve<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<AuctionId> {
    let params = CreateWithReserveParams::deserial(&mut ctx.parameter_cursor())?;
    let reserve = params.reserve;
    create_auction(
        ctx,
        host,
        logger,
        CreateParams {
            seller: params.seller,
            payment_token: params.payment_token,
            starting_price: params.starting_price,
            item: params.item,
        },
        Some(reserve),
    )
}

/// Shared creation path. The record is stored first; pulling custody from
/// the seller is the final step, so a registry rejection aborts the whole
/// call and no auction survives it.
fn create_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
    params: CreateParams,
    reserve: Option<TokenAmount>,
) -> ContractResult<AuctionId> {
    let auction = Auction::new(
        params.seller,
        params.payment_token,
        params.starting_price,
        params.item.clone(),
        reserve,
        ctx.metadata().slot_time(),
    );
    let id = host.state_mut().create(auction);

    logger.log(&AuctionEvents::new_auction(id, &params.seller, &params.item))?;

    // Custody moves from the seller into escrow. The registry rejects this
    // unless the seller granted operator rights for the item.
    nft::transfer_item(
        host,
        &params.item,
        Address::Account(params.seller),
        Receiver::Contract(
            ctx.self_address(),
            OwnedEntrypointName::new_unchecked(RECEIVE_HOOK_NAME.into()),
        ),
    )?;

    Ok(id)
}

/// Place a bid. The full amount is pulled into contract escrow and the
/// displaced highest bid is refunded within the same transaction.
#[receive(
    mutable,
    contract = "NftAuction",
    name = "bid",
    parameter = "BidParams",
    enable_logger
)]
fn contract_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let params = BidParams::deserial(&mut ctx.parameter_cursor())?;

    let bidder = if let Address::Account(bidder) = ctx.sender() {
        bidder
    } else {
        bail!(CustomContractError::OnlyAccountAddress.into());
    };

    // The record is updated in full before any token movement.
    let (index, displaced, ledger) = host.state_mut().bid(
        params.auction,
        bidder,
        params.amount,
        ctx.metadata().slot_time(),
    )?;

    logger.log(&AuctionEvents::bid(params.auction, bidder, params.amount, index))?;

    // Escrow the new bid, then release the displaced one.
    token::deposit(host, &ledger, bidder, ctx.self_address(), params.amount)?;
    if let Some(previous) = displaced {
        token::payout(
            host,
            &ledger,
            ctx.self_address(),
            previous.bidder,
            previous.amount,
        )?;
    }

    Ok(())
}

/// The seller's early end, available once a quick finish bid has been
/// accepted and only while the bidding window is still open.
#[receive(
    mutable,
    contract = "NftAuction",
    name = "endAuction",
    parameter = "AuctionId",
    enable_logger
)]
fn contract_end_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let id = AuctionId::deserial(&mut ctx.parameter_cursor())?;

    let sender = if let Address::Account(sender) = ctx.sender() {
        sender
    } else {
        bail!(CustomContractError::OnlyAccountAddress.into());
    };

    host.state_mut().end(id, sender, ctx.metadata().slot_time())?;

    logger.log(&AuctionEvents::ended(id))?;

    Ok(())
}

/// Distribute the escrowed funds and the asset. Callable by anyone once the
/// auction has ended, and exactly once.
#[receive(
    mutable,
    contract = "NftAuction",
    name = "settle",
    parameter = "AuctionId",
    enable_logger
)]
fn contract_settle<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let id = AuctionId::deserial(&mut ctx.parameter_cursor())?;

    // Flags are set before any transfer leaves the contract.
    let (outcome, item, seller, ledger) =
        host.state_mut().settle(id, ctx.metadata().slot_time())?;

    match outcome {
        Settlement::Sale { winner, price } => {
            logger.log(&AuctionEvents::settled(id, Some(winner), Some(price)))?;

            token::payout(host, &ledger, ctx.self_address(), seller, price)?;
            nft::transfer_item(
                host,
                &item,
                Address::Contract(ctx.self_address()),
                Receiver::Account(winner),
            )?;
        }
        Settlement::Unsold => {
            logger.log(&AuctionEvents::settled(id, None, None))?;

            nft::transfer_item(
                host,
                &item,
                Address::Contract(ctx.self_address()),
                Receiver::Account(seller),
            )?;
        }
    }

    Ok(())
}

/// Withdraw a listing nobody has bid on. The record is removed and the
/// asset returned to the seller.
#[receive(
    mutable,
    contract = "NftAuction",
    name = "cancelAuction",
    parameter = "AuctionId",
    enable_logger
)]
fn contract_cancel_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let id = AuctionId::deserial(&mut ctx.parameter_cursor())?;

    let sender = if let Address::Account(sender) = ctx.sender() {
        sender
    } else {
        bail!(CustomContractError::OnlyAccountAddress.into());
    };

    let (item, seller) = host.state_mut().cancel(id, sender)?;

    logger.log(&AuctionEvents::cancelled(id, seller))?;

    nft::transfer_item(
        host,
        &item,
        Address::Contract(ctx.self_address()),
        Receiver::Account(seller),
    )?;

    Ok(())
}

/// Acknowledgment hook for incoming CIS-2 transfers. Both auctioned assets
/// and payment-token escrow arrive through here; the bookkeeping already
/// happened in the entrypoint that pulled the transfer, so no state
/// transition is reachable from this path.
#[receive(contract = "NftAuction", name = "onReceivingCIS2")]
fn contract_on_receiving_cis2<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    _host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<()> {
    ensure!(
        matches!(ctx.sender(), Address::Contract(_)),
        CustomContractError::ContractOnly.into()
    );
    Ok(())
}

/// Whether the auction still accepts bids at the current slot time.
#[receive(
    contract = "NftAuction",
    name = "isAuctionActive",
    parameter = "AuctionId",
    return_value = "bool"
)]
fn contract_is_auction_active<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<bool> {
    let id = AuctionId::deserial(&mut ctx.parameter_cursor())?;
    host.state().is_active(id, ctx.metadata().slot_time())
}

/// Creation time of the auction.
#[receive(
    contract = "NftAuction",
    name = "createdOn",
    parameter = "AuctionId",
    return_value = "Timestamp"
)]
fn contract_created_on<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Timestamp> {
    let id = AuctionId::deserial(&mut ctx.parameter_cursor())?;
    host.state().created_on(id)
}

/// A single bid record by position in the auction's history.
#[receive(
    contract = "NftAuction",
    name = "bids",
    parameter = "BidQueryParams",
    return_value = "Bid"
)]
fn contract_bids<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Bid> {
    let params = BidQueryParams::deserial(&mut ctx.parameter_cursor())?;
    host.state().bid_at(params.auction, params.index)
}

/// A full snapshot of one auction.
#[receive(
    contract = "NftAuction",
    name = "view",
    parameter = "AuctionId",
    return_value = "AuctionView"
)]
fn contract_view<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<AuctionView> {
    let id = AuctionId::deserial(&mut ctx.parameter_cursor())?;
    host.state().view(id, ctx.metadata().slot_time())
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::test::*;
    use concordium_cis2::{TokenAmountU64, TokenIdVec, TransferParams};
    use concordium_std::test_infrastructure::*;

    const SELLER: AccountAddress = AccountAddress([1u8; 32]);
    const SELLER_2: AccountAddress = AccountAddress([2u8; 32]);
    const BIDDER_1: AccountAddress = AccountAddress([3u8; 32]);
    const BIDDER_2: AccountAddress = AccountAddress([4u8; 32]);
    const BIDDER_3: AccountAddress = AccountAddress([5u8; 32]);
    const ANYONE: AccountAddress = AccountAddress([6u8; 32]);

    const SELF_ADDRESS: ContractAddress = ContractAddress {
        index: 0,
        subindex: 0,
    };
    const REGISTRY: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const LEDGER: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };

    const CREATED_AT: u64 = 1_000;

    type Host = TestHost<State<TestStateApi>>;

    /// Slot time in milliseconds, `minutes` after auction creation.
    fn at(minutes: u64) -> u64 {
        CREATED_AT + minutes * 60_000
    }

    fn amount(value: u64) -> TokenAmount {
        TokenAmountU64(value)
    }

    fn item(id: u8) -> Token {
        Token {
            contract: REGISTRY,
            id: TokenIdVec(vec![id]),
        }
    }

    /// Host with both collaborator contracts accepting every transfer.
    fn new_host() -> Host {
        let mut state_builder = TestStateBuilder::new();
        let state = State::empty(&mut state_builder);
        let mut host = TestHost::new(state, state_builder);
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_ok_mock::<TransferParams<ContractTokenId, TokenAmount>, _>(()),
        );
        host.setup_mock_entrypoint(
            LEDGER,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_ok_mock::<TransferParams<PaymentTokenId, TokenAmount>, _>(()),
        );
        host
    }

    fn receive_ctx<'a>(sender: AccountAddress, slot_time_ms: u64) -> TestReceiveContext<'a> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(sender));
        ctx.set_self_address(SELF_ADDRESS);
        ctx.set_metadata_slot_time(Timestamp::from_timestamp_millis(slot_time_ms));
        ctx
    }

    fn create(host: &mut Host, seller: AccountAddress, token_id: u8, reserve: Option<u64>) -> AuctionId {
        let mut logger = TestLogger::init();
        match reserve {
            Some(reserve) => {
                let params = to_bytes(&CreateWithReserveParams {
                    seller,
                    payment_token: LEDGER,
                    starting_price: amount(100),
                    item: item(token_id),
                    reserve: amount(reserve),
                });
                let mut ctx = receive_ctx(seller, CREATED_AT);
                ctx.set_parameter(&params);
                contract_create_auction_with_reserve(&ctx, host, &mut logger)
                    .expect("Creating an auction with a reserve should succeed")
            }
            None => {
                let params = to_bytes(&CreateParams {
                    seller,
                    payment_token: LEDGER,
                    starting_price: amount(100),
                    item: item(token_id),
                });
                let mut ctx = receive_ctx(seller, CREATED_AT);
                ctx.set_parameter(&params);
                contract_create_auction(&ctx, host, &mut logger)
                    .expect("Creating an auction should succeed")
            }
        }
    }

    fn bid(
        host: &mut Host,
        auction: AuctionId,
        bidder: AccountAddress,
        value: u64,
        slot_time_ms: u64,
    ) -> ContractResult<()> {
        let params = to_bytes(&BidParams {
            auction,
            amount: amount(value),
        });
        let mut ctx = receive_ctx(bidder, slot_time_ms);
        ctx.set_parameter(&params);
        let mut logger = TestLogger::init();
        contract_bid(&ctx, host, &mut logger)
    }

    fn end_auction(
        host: &mut Host,
        auction: AuctionId,
        sender: AccountAddress,
        slot_time_ms: u64,
    ) -> ContractResult<()> {
        let params = to_bytes(&auction);
        let mut ctx = receive_ctx(sender, slot_time_ms);
        ctx.set_parameter(&params);
        let mut logger = TestLogger::init();
        contract_end_auction(&ctx, host, &mut logger)
    }

    fn settle(
        host: &mut Host,
        auction: AuctionId,
        sender: AccountAddress,
        slot_time_ms: u64,
    ) -> ContractResult<()> {
        let params = to_bytes(&auction);
        let mut ctx = receive_ctx(sender, slot_time_ms);
        ctx.set_parameter(&params);
        let mut logger = TestLogger::init();
        contract_settle(&ctx, host, &mut logger)
    }

    fn cancel(
        host: &mut Host,
        auction: AuctionId,
        sender: AccountAddress,
        slot_time_ms: u64,
    ) -> ContractResult<()> {
        let params = to_bytes(&auction);
        let mut ctx = receive_ctx(sender, slot_time_ms);
        ctx.set_parameter(&params);
        let mut logger = TestLogger::init();
        contract_cancel_auction(&ctx, host, &mut logger)
    }

    fn view(host: &Host, auction: AuctionId, slot_time_ms: u64) -> ContractResult<AuctionView> {
        let params = to_bytes(&auction);
        let mut ctx = receive_ctx(ANYONE, slot_time_ms);
        ctx.set_parameter(&params);
        contract_view(&ctx, host)
    }

    fn is_active(host: &Host, auction: AuctionId, slot_time_ms: u64) -> bool {
        let params = to_bytes(&auction);
        let mut ctx = receive_ctx(ANYONE, slot_time_ms);
        ctx.set_parameter(&params);
        contract_is_auction_active(&ctx, host).expect("Auction should exist")
    }

    fn bid_record(host: &Host, auction: AuctionId, index: u32) -> ContractResult<Bid> {
        let params = to_bytes(&BidQueryParams { auction, index });
        let mut ctx = receive_ctx(ANYONE, at(0));
        ctx.set_parameter(&params);
        contract_bids(&ctx, host)
    }

    #[concordium_test]
    fn test_create_auction() {
        let mut host = new_host();

        let first = create(&mut host, SELLER, 21, None);
        let second = create(&mut host, SELLER_2, 41, Some(100));
        claim_eq!(first, 0);
        claim_eq!(second, 1, "Identifiers are handed out sequentially");

        let params = to_bytes(&first);
        let mut ctx = receive_ctx(ANYONE, at(1));
        ctx.set_parameter(&params);
        let created = contract_created_on(&ctx, &host).expect("Auction should exist");
        claim_eq!(created, Timestamp::from_timestamp_millis(CREATED_AT));

        claim!(is_active(&host, first, at(1)));

        let snapshot = view(&host, second, at(1)).expect("Auction should exist");
        claim_eq!(snapshot.seller, SELLER_2);
        claim_eq!(snapshot.payment_token, LEDGER);
        claim_eq!(snapshot.item, item(41));
        claim_eq!(snapshot.reserve, Some(amount(100)));
        claim_eq!(snapshot.deadline, None, "No deadline runs before the first bid");
        claim_eq!(snapshot.bid_count, 0);
        claim!(!snapshot.quick_finish_armed);
        claim!(snapshot.active);
        claim!(!snapshot.settled);
    }

    #[concordium_test]
    fn test_create_fails_when_the_asset_is_unavailable() {
        let mut host = new_host();
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            reject_mock(-12),
        );

        let params = to_bytes(&CreateParams {
            seller: SELLER,
            payment_token: LEDGER,
            starting_price: amount(100),
            item: item(1),
        });
        let mut ctx = receive_ctx(SELLER, CREATED_AT);
        ctx.set_parameter(&params);
        let mut logger = TestLogger::init();

        let result = contract_create_auction(&ctx, &mut host, &mut logger);
        claim!(matches!(result, Err(ContractError::Unauthorized)));
    }

    #[concordium_test]
    fn test_reserve_bounds_the_opening_bid() {
        let mut host = new_host();
        let auction = create(&mut host, SELLER, 21, Some(100));

        let low = bid(&mut host, auction, BIDDER_1, 1, at(0));
        claim!(matches!(
            low,
            Err(ContractError::Custom(CustomContractError::BidTooLow))
        ));

        bid(&mut host, auction, BIDDER_1, 200, at(0))
            .expect("Opening bid above the reserve should succeed");
        let first = bid_record(&host, auction, 0).expect("First bid should be recorded");
        claim_eq!(first.amount, amount(200));
        claim_eq!(first.bidder, BIDDER_1);
    }

    #[concordium_test]
    fn test_zero_opening_bid_is_rejected() {
        let mut host = new_host();
        let auction = create(&mut host, SELLER, 21, None);

        let zero = bid(&mut host, auction, BIDDER_1, 0, at(0));
        claim!(matches!(
            zero,
            Err(ContractError::Custom(CustomContractError::BidTooLow))
        ));

        // Without a reserve any positive amount opens the auction.
        bid(&mut host, auction, BIDDER_1, 1, at(0)).expect("Minimal opening bid should succeed");
    }

    #[concordium_test]
    fn test_bids_must_strictly_increase() {
        let mut host = new_host();
        let auction = create(&mut host, SELLER, 21, None);

        bid(&mut host, auction, BIDDER_1, 100, at(0)).expect("Opening bid should succeed");

        let equal = bid(&mut host, auction, BIDDER_2, 100, at(1));
        claim!(matches!(
            equal,
            Err(ContractError::Custom(CustomContractError::BidTooLow))
        ));

        bid(&mut host, auction, BIDDER_2, 101, at(1)).expect("Higher bid should succeed");
        claim_eq!(
            bid_record(&host, auction, 1)
                .expect("Second bid should be recorded")
                .amount,
            amount(101)
        );
    }

    #[concordium_test]
    fn test_bid_refunds_the_displaced_bidder() {
        let mut host = new_host();
        let auction = create(&mut host, SELLER, 21, None);

        bid(&mut host, auction, BIDDER_1, 100, at(0)).expect("Opening bid should succeed");

        // From here on the ledger only accepts the expected pair of
        // transfers: the deposit pulled from the new bidder and the refund
        // paid back to the displaced one.
        host.setup_mock_entrypoint(
            LEDGER,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParams<PaymentTokenId, TokenAmount>, _>(
                |params| {
                    let transfer = &params.0[0];
                    match &transfer.from {
                        Address::Account(payer) => {
                            *payer == BIDDER_2
                                && transfer.amount == TokenAmountU64(300)
                                && matches!(
                                    &transfer.to,
                                    Receiver::Contract(escrow, _) if *escrow == SELF_ADDRESS
                                )
                        }
                        Address::Contract(escrow) => {
                            *escrow == SELF_ADDRESS
                                && transfer.amount == TokenAmountU64(100)
                                && matches!(
                                    &transfer.to,
                                    Receiver::Account(account) if *account == BIDDER_1
                                )
                        }
                    }
                },
                (),
            ),
        );

        bid(&mut host, auction, BIDDER_2, 300, at(1))
            .expect("The outbidding transfer pair should go through");
    }

    #[concordium_test]
    fn test_every_bid_restarts_the_window() {
        let mut host = new_host();
        let auction = create(&mut host, SELLER, 21, None);

        bid(&mut host, auction, BIDDER_1, 100, at(0)).expect("Opening bid should succeed");
        bid(&mut host, auction, BIDDER_2, 300, at(10)).expect("Bid should succeed");
        bid(&mut host, auction, BIDDER_3, 400, at(12)).expect("Bid should succeed");

        // The last bid ran the deadline out to 27 minutes after creation.
        claim_eq!(
            view(&host, auction, at(12))
                .expect("Auction should exist")
                .deadline,
            Some(Timestamp::from_timestamp_millis(at(27)))
        );

        let at_deadline = bid(&mut host, auction, BIDDER_2, 600, at(27));
        claim!(
            matches!(
                at_deadline,
                Err(ContractError::Custom(CustomContractError::AuctionFinished))
            ),
            "A bid at the deadline itself comes too late"
        );

        bid(&mut host, auction, BIDDER_2, 500, at(27) - 1)
            .expect("A bid just before the deadline should succeed and extend it");
        claim!(is_active(&host, auction, at(30)));

        // 15 minutes of silence after the last accepted bid close the
        // auction, whatever the attempted amount.
        let too_late = bid(&mut host, auction, BIDDER_3, 450, at(42));
        claim!(matches!(
            too_late,
            Err(ContractError::Custom(CustomContractError::AuctionFinished))
        ));
        claim!(!is_active(&host, auction, at(42)));
    }

    #[concordium_test]
    fn test_quick_finish_allows_the_seller_to_end_early() {
        let mut host = new_host();
        let auction = create(&mut host, SELLER, 21, None);

        bid(&mut host, auction, BIDDER_1, 100, at(0)).expect("Opening bid should succeed");
        bid(&mut host, auction, BIDDER_2, 300, at(10)).expect("Bid should succeed");
        claim!(
            !view(&host, auction, at(10))
                .expect("Auction should exist")
                .quick_finish_armed
        );

        bid(&mut host, auction, BIDDER_3, 1500, at(12))
            .expect("Quick finish bid should succeed");
        claim!(
            view(&host, auction, at(12))
                .expect("Auction should exist")
                .quick_finish_armed,
            "Five times the previous bid arms the latch"
        );

        let foreign = end_auction(&mut host, auction, BIDDER_3, at(13));
        claim!(matches!(foreign, Err(ContractError::Unauthorized)));

        end_auction(&mut host, auction, SELLER, at(13))
            .expect("The seller may end an armed auction before the deadline");
        claim!(!is_active(&host, auction, at(13)));

        let late_bid = bid(&mut host, auction, BIDDER_1, 2000, at(13));
        claim!(matches!(
            late_bid,
            Err(ContractError::Custom(CustomContractError::AuctionFinished))
        ));

        let again = end_auction(&mut host, auction, SELLER, at(13));
        claim!(matches!(
            again,
            Err(ContractError::Custom(CustomContractError::AuctionFinalized))
        ));
    }

    #[concordium_test]
    fn test_end_without_quick_finish_is_premature() {
        let mut host = new_host();
        let auction = create(&mut host, SELLER, 21, None);

        let no_bids = end_auction(&mut host, auction, SELLER, at(5));
        claim!(matches!(
            no_bids,
            Err(ContractError::Custom(
                CustomContractError::AuctionStillActive
            ))
        ));

        bid(&mut host, auction, BIDDER_1, 100, at(5)).expect("Opening bid should succeed");
        bid(&mut host, auction, BIDDER_2, 499, at(6)).expect("Bid should succeed");

        let premature = end_auction(&mut host, auction, SELLER, at(7));
        claim!(
            matches!(
                premature,
                Err(ContractError::Custom(
                    CustomContractError::AuctionStillActive
                ))
            ),
            "Less than five times the previous bid never arms the latch"
        );
    }

    #[concordium_test]
    fn test_end_after_natural_closure_is_rejected() {
        let mut host = new_host();
        let auction = create(&mut host, SELLER, 21, None);

        bid(&mut host, auction, BIDDER_1, 100, at(0)).expect("Opening bid should succeed");
        bid(&mut host, auction, BIDDER_2, 300, at(10)).expect("Bid should succeed");
        bid(&mut host, auction, BIDDER_3, 1500, at(12)).expect("Quick finish bid should succeed");

        // 16 minutes of silence passed the deadline; the armed latch no
        // longer helps.
        let late = end_auction(&mut host, auction, SELLER, at(28));
        claim!(matches!(
            late,
            Err(ContractError::Custom(CustomContractError::AuctionFinalized))
        ));
    }

    #[concordium_test]
    fn test_settle_distributes_exactly_once() {
        let mut host = new_host();
        let auction = create(&mut host, SELLER, 21, None);

        bid(&mut host, auction, BIDDER_1, 100, at(0)).expect("Opening bid should succeed");
        bid(&mut host, auction, BIDDER_2, 1500, at(1)).expect("Quick finish bid should succeed");
        end_auction(&mut host, auction, SELLER, at(2)).expect("Armed end should succeed");

        // Settlement must pay the seller the winning amount and hand the
        // item to the winner, nothing else.
        host.setup_mock_entrypoint(
            LEDGER,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParams<PaymentTokenId, TokenAmount>, _>(
                |params| {
                    let transfer = &params.0[0];
                    transfer.from == Address::Contract(SELF_ADDRESS)
                        && transfer.amount == TokenAmountU64(1500)
                        && matches!(
                            &transfer.to,
                            Receiver::Account(account) if *account == SELLER
                        )
                },
                (),
            ),
        );
        host.setup_mock_entrypoint(
            REGISTRY,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParams<ContractTokenId, TokenAmount>, _>(
                |params| {
                    let transfer = &params.0[0];
                    transfer.from == Address::Contract(SELF_ADDRESS)
                        && matches!(
                            &transfer.to,
                            Receiver::Account(account) if *account == BIDDER_2
                        )
                },
                (),
            ),
        );

        settle(&mut host, auction, ANYONE, at(3)).expect("Anyone may settle an ended auction");

        let snapshot = view(&host, auction, at(3)).expect("Auction should exist");
        claim!(snapshot.settled);
        claim!(!snapshot.active);
        claim!(
            snapshot.quick_finish_armed,
            "The latch survives until settlement"
        );

        let again = settle(&mut host, auction, SELLER, at(4));
        claim!(matches!(
            again,
            Err(ContractError::Custom(CustomContractError::AuctionFinalized))
        ));

        // History stays readable after settlement.
        claim_eq!(
            bid_record(&host, auction, 1)
                .expect("Winning bid should still be recorded")
                .amount,
            amount(1500)
        );
    }

    #[concordium_test]
    fn test_settle_after_natural_expiry() {
        let mut host = new_host();
        let auction = create(&mut host, SELLER, 21, None);

        bid(&mut host, auction, BIDDER_1, 100, at(0)).expect("Opening bid should succeed");

        let early = settle(&mut host, auction, ANYONE, at(14));
        claim!(matches!(
            early,
            Err(ContractError::Custom(
                CustomContractError::AuctionStillActive
            ))
        ));

        // No manual end happened; the deadline alone ended the auction.
        settle(&mut host, auction, ANYONE, at(15))
            .expect("Settling at the deadline should succeed");
        claim!(view(&host, auction, at(15)).expect("Auction should exist").settled);
    }

    #[concordium_test]
    fn test_insufficient_escrow_rejects_the_bid() {
        let mut host = new_host();
        let auction = create(&mut host, SELLER, 21, None);

        host.setup_mock_entrypoint(
            LEDGER,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            reject_mock(-7),
        );

        let result = bid(&mut host, auction, BIDDER_1, 100, at(0));
        claim!(matches!(result, Err(ContractError::InsufficientFunds)));
    }

    #[concordium_test]
    fn test_auctions_do_not_interfere() {
        let mut host = new_host();
        let first = create(&mut host, SELLER, 21, None);
        let second = create(&mut host, SELLER_2, 41, None);

        bid(&mut host, first, BIDDER_2, 100, at(0)).expect("Bid should succeed");
        bid(&mut host, second, BIDDER_1, 350, at(0)).expect("Bid should succeed");

        claim_eq!(
            bid_record(&host, first, 0).expect("Bid should be recorded").amount,
            amount(100)
        );
        claim_eq!(
            bid_record(&host, second, 0).expect("Bid should be recorded").amount,
            amount(350)
        );
    }

    #[concordium_test]
    fn test_unknown_auctions_and_bids_are_reported() {
        let mut host = new_host();
        let auction = create(&mut host, SELLER, 21, None);

        let missing = bid(&mut host, 99, BIDDER_1, 100, at(0));
        claim!(matches!(
            missing,
            Err(ContractError::Custom(CustomContractError::UnknownAuction))
        ));

        let out_of_range = bid_record(&host, auction, 0);
        claim!(matches!(
            out_of_range,
            Err(ContractError::Custom(CustomContractError::UnknownBid))
        ));

        claim!(matches!(
            view(&host, 99, at(0)),
            Err(ContractError::Custom(CustomContractError::UnknownAuction))
        ));
    }

    #[concordium_test]
    fn test_cancel_before_the_first_bid() {
        let mut host = new_host();
        let auction = create(&mut host, SELLER, 21, None);

        let foreign = cancel(&mut host, auction, BIDDER_1, at(1));
        claim!(matches!(foreign, Err(ContractError::Unauthorized)));

        cancel(&mut host, auction, SELLER, at(1))
            .expect("The seller may withdraw an untouched listing");
        claim!(matches!(
            view(&host, auction, at(1)),
            Err(ContractError::Custom(CustomContractError::UnknownAuction))
        ));

        let second = create(&mut host, SELLER, 22, None);
        bid(&mut host, second, BIDDER_1, 100, at(2)).expect("Opening bid should succeed");
        let too_late = cancel(&mut host, second, SELLER, at(3));
        claim!(matches!(
            too_late,
            Err(ContractError::Custom(CustomContractError::BidsPlaced))
        ));
    }

    #[concordium_test]
    fn test_events_are_tagged() {
        let mut host = new_host();

        let params = to_bytes(&CreateParams {
            seller: SELLER,
            payment_token: LEDGER,
            starting_price: amount(100),
            item: item(21),
        });
        let mut ctx = receive_ctx(SELLER, CREATED_AT);
        ctx.set_parameter(&params);
        let mut logger = TestLogger::init();
        let auction =
            contract_create_auction(&ctx, &mut host, &mut logger).expect("Creation should succeed");
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], NEW_AUCTION_TAG);

        let params = to_bytes(&BidParams {
            auction,
            amount: amount(100),
        });
        let mut ctx = receive_ctx(BIDDER_1, at(0));
        ctx.set_parameter(&params);
        let mut logger = TestLogger::init();
        contract_bid(&ctx, &mut host, &mut logger).expect("Bid should succeed");
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], BID_TAG);
    }
}
