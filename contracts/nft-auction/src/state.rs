use commons::*;
use concordium_std::*;

use crate::external::AuctionView;

/// Lifecycle of a single auction at a given slot time. Expiry is never
/// applied by a timer; it is observed whenever the next operation executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionStatus {
    /// Listed, no bids yet, no deadline running.
    Created,
    /// At least one bid and the bidding window is still open.
    Active,
    /// The deadline passed, or the seller ended the auction early.
    Ended,
    /// Funds and asset were distributed. Terminal.
    Settled,
}

/// A single auction record. Everything except the deadline, the flags and
/// the appended bids is immutable after creation.
#[derive(Debug, Serialize, SchemaType)]
pub struct Auction {
    /// Account entitled to the proceeds.
    pub seller: AccountAddress,
    /// CIS-2 contract of the fungible token used for bidding.
    pub payment_token: ContractAddress,
    /// Informational listing price. Not enforced on bids.
    pub starting_price: TokenAmount,
    /// Asset under auction.
    pub item: Token,
    /// Minimum opening bid, if the seller configured one.
    pub reserve: Option<TokenAmount>,
    /// Slot time at creation.
    pub created_at: Timestamp,
    /// Absent until the first bid; reset on every accepted bid.
    pub deadline: Option<Timestamp>,
    /// Accepted bids in chronological order, strictly increasing in amount.
    pub bids: Vec<Bid>,
    /// Latched once a bid reaches the quick finish multiplier.
    pub quick_finish_armed: bool,
    /// Set by the seller's early end.
    pub ended: bool,
    /// Set exactly once, by settlement.
    pub settled: bool,
}

impl Auction {
    pub fn new(
        seller: AccountAddress,
        payment_token: ContractAddress,
        starting_price: TokenAmount,
        item: Token,
        reserve: Option<TokenAmount>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            seller,
            payment_token,
            starting_price,
            item,
            reserve,
            created_at,
            deadline: None,
            bids: Vec::new(),
            quick_finish_armed: false,
            ended: false,
            settled: false,
        }
    }

    /// Get the auction state at the given slot time.
    pub fn status(&self, slot_time: Timestamp) -> AuctionStatus {
        if self.settled {
            AuctionStatus::Settled
        } else if self.ended {
            AuctionStatus::Ended
        } else {
            match self.deadline {
                Some(deadline) if slot_time >= deadline => AuctionStatus::Ended,
                Some(_) => AuctionStatus::Active,
                None => AuctionStatus::Created,
            }
        }
    }

    pub fn is_active(&self, slot_time: Timestamp) -> bool {
        matches!(
            self.status(slot_time),
            AuctionStatus::Created | AuctionStatus::Active
        )
    }

    fn highest_amount(&self) -> Option<TokenAmount> {
        self.bids.last().map(|bid| bid.amount)
    }

    /// Accept a bid. Returns the index of the new bid and the displaced
    /// highest bid, which must be refunded in the same transaction.
    pub fn place_bid(
        &mut self,
        bidder: AccountAddress,
        amount: TokenAmount,
        slot_time: Timestamp,
    ) -> ContractResult<(u32, Option<Bid>)> {
        match self.status(slot_time) {
            AuctionStatus::Created | AuctionStatus::Active => (),
            AuctionStatus::Ended | AuctionStatus::Settled => {
                bail!(CustomContractError::AuctionFinished.into())
            }
        }

        validate_bid(amount, self.highest_amount(), self.reserve)?;

        let displaced = self.bids.last().cloned();
        if let Some(previous) = &displaced {
            if meets_quick_finish(previous.amount, amount) {
                self.quick_finish_armed = true;
            }
        }

        // Every accepted bid restarts the full window, leaving bidders a
        // guaranteed reaction period after the latest bid.
        self.deadline = Some(slot_time.checked_add(EXTENSION_WINDOW).unwrap());
        self.bids.push(Bid {
            bidder,
            amount,
            timestamp: slot_time,
        });

        Ok((self.bids.len() as u32 - 1, displaced))
    }

    /// The seller's early end. Only an armed quick finish can cut the
    /// deadline short; a passed deadline already counts as closed.
    pub fn end(&mut self, sender: AccountAddress, slot_time: Timestamp) -> ContractResult<()> {
        ensure_eq!(sender, self.seller, ContractError::Unauthorized);

        match self.status(slot_time) {
            AuctionStatus::Ended | AuctionStatus::Settled => {
                bail!(CustomContractError::AuctionFinalized.into())
            }
            AuctionStatus::Created | AuctionStatus::Active => {
                ensure!(
                    self.quick_finish_armed,
                    CustomContractError::AuctionStillActive.into()
                );
                self.ended = true;
                Ok(())
            }
        }
    }

    /// Mark the auction settled and compute the distribution. The caller
    /// moves funds and custody afterwards, within the same transaction.
    pub fn settle(&mut self, slot_time: Timestamp) -> ContractResult<Settlement> {
        match self.status(slot_time) {
            AuctionStatus::Created | AuctionStatus::Active => {
                bail!(CustomContractError::AuctionStillActive.into())
            }
            AuctionStatus::Settled => bail!(CustomContractError::AuctionFinalized.into()),
            AuctionStatus::Ended => {
                self.ended = true;
                self.settled = true;
                Ok(settlement(&self.bids))
            }
        }
    }

    pub fn view(&self, slot_time: Timestamp) -> AuctionView {
        AuctionView {
            seller: self.seller,
            payment_token: self.payment_token,
            starting_price: self.starting_price,
            item: self.item.clone(),
            reserve: self.reserve,
            created_at: self.created_at,
            deadline: self.deadline,
            highest_bid: self.bids.last().cloned(),
            bid_count: self.bids.len() as u32,
            quick_finish_armed: self.quick_finish_armed,
            active: self.is_active(slot_time),
            settled: self.settled,
        }
    }
}

/// The contract state: the factory's arena of auction records.
#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// Identifier handed to the next created auction.
    next_auction: AuctionId,
    /// Every auction ever created. Settled auctions stay readable.
    auctions: StateMap<AuctionId, Auction, S>,
}

impl<S: HasStateApi> State<S> {
    /// Create a new state with no auctions.
    pub fn empty(state_builder: &mut StateBuilder<S>) -> Self {
        State {
            next_auction: 0,
            auctions: state_builder.new_map(),
        }
    }

    /// Insert a new auction record, returning its identifier.
    pub fn create(&mut self, auction: Auction) -> AuctionId {
        let id = self.next_auction;
        self.next_auction += 1;
        self.auctions.insert(id, auction);
        id
    }

    /// Route a bid to its auction. Returns the bid index, the displaced bid
    /// to refund and the ledger the auction is priced in.
    pub fn bid(
        &mut self,
        id: AuctionId,
        bidder: AccountAddress,
        amount: TokenAmount,
        slot_time: Timestamp,
    ) -> ContractResult<(u32, Option<Bid>, ContractAddress)> {
        let mut auction = self
            .auctions
            .get_mut(&id)
            .ok_or(CustomContractError::UnknownAuction)?;
        let (index, displaced) = auction.place_bid(bidder, amount, slot_time)?;
        Ok((index, displaced, auction.payment_token))
    }

    pub fn end(
        &mut self,
        id: AuctionId,
        sender: AccountAddress,
        slot_time: Timestamp,
    ) -> ContractResult<()> {
        let mut auction = self
            .auctions
            .get_mut(&id)
            .ok_or(CustomContractError::UnknownAuction)?;
        auction.end(sender, slot_time)
    }

    /// Settle an auction. Returns the distribution together with the item,
    /// seller and ledger needed to execute it.
    pub fn settle(
        &mut self,
        id: AuctionId,
        slot_time: Timestamp,
    ) -> ContractResult<(Settlement, Token, AccountAddress, ContractAddress)> {
        let mut auction = self
            .auctions
            .get_mut(&id)
            .ok_or(CustomContractError::UnknownAuction)?;
        let outcome = auction.settle(slot_time)?;
        Ok((
            outcome,
            auction.item.clone(),
            auction.seller,
            auction.payment_token,
        ))
    }

    /// Remove an auction nobody has bid on. Returns the asset to hand back
    /// and its seller. Validation happens before the record is touched.
    pub fn cancel(
        &mut self,
        id: AuctionId,
        sender: AccountAddress,
    ) -> ContractResult<(Token, AccountAddress)> {
        {
            let auction = self
                .auctions
                .get(&id)
                .ok_or(CustomContractError::UnknownAuction)?;
            ensure_eq!(sender, auction.seller, ContractError::Unauthorized);
            ensure!(
                auction.bids.is_empty(),
                CustomContractError::BidsPlaced.into()
            );
        }

        let auction = self
            .auctions
            .remove_and_get(&id)
            .ok_or(CustomContractError::UnknownAuction)?;
        Ok((auction.item, auction.seller))
    }

    pub fn is_active(&self, id: AuctionId, slot_time: Timestamp) -> ContractResult<bool> {
        let auction = self
            .auctions
            .get(&id)
            .ok_or(CustomContractError::UnknownAuction)?;
        Ok(auction.is_active(slot_time))
    }

    pub fn created_on(&self, id: AuctionId) -> ContractResult<Timestamp> {
        let auction = self
            .auctions
            .get(&id)
            .ok_or(CustomContractError::UnknownAuction)?;
        Ok(auction.created_at)
    }

    pub fn bid_at(&self, id: AuctionId, index: u32) -> ContractResult<Bid> {
        let auction = self
            .auctions
            .get(&id)
            .ok_or(CustomContractError::UnknownAuction)?;
        auction
            .bids
            .get(index as usize)
            .cloned()
            .ok_or_else(|| CustomContractError::UnknownBid.into())
    }

    pub fn view(&self, id: AuctionId, slot_time: Timestamp) -> ContractResult<AuctionView> {
        let auction = self
            .auctions
            .get(&id)
            .ok_or(CustomContractError::UnknownAuction)?;
        Ok(auction.view(slot_time))
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_cis2::{TokenAmountU64, TokenIdVec};

    const SELLER: AccountAddress = AccountAddress([1u8; 32]);
    const BIDDER_1: AccountAddress = AccountAddress([2u8; 32]);
    const BIDDER_2: AccountAddress = AccountAddress([3u8; 32]);

    const REGISTRY: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const LEDGER: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };

    fn amount(value: u64) -> TokenAmount {
        TokenAmountU64(value)
    }

    fn at(minutes: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(minutes * 60_000)
    }

    fn auction(reserve: Option<u64>) -> Auction {
        Auction::new(
            SELLER,
            LEDGER,
            amount(100),
            Token {
                contract: REGISTRY,
                id: TokenIdVec(vec![21]),
            },
            reserve.map(amount),
            at(0),
        )
    }

    #[concordium_test]
    fn test_bid_amounts_strictly_increase() {
        let mut auction = auction(None);

        auction
            .place_bid(BIDDER_1, amount(100), at(0))
            .expect("Opening bid should be accepted");
        let repeat = auction.place_bid(BIDDER_2, amount(100), at(1));
        claim!(matches!(
            repeat,
            Err(ContractError::Custom(CustomContractError::BidTooLow))
        ));
        claim_eq!(auction.bids.len(), 1, "Rejected bids must not be recorded");

        let (index, displaced) = auction
            .place_bid(BIDDER_2, amount(150), at(1))
            .expect("Higher bid should be accepted");
        claim_eq!(index, 1);
        claim_eq!(
            displaced.map(|bid| bid.bidder),
            Some(BIDDER_1),
            "The previous highest bid must be handed back for refunding"
        );
        claim!(auction.bids[0].amount < auction.bids[1].amount);
    }

    #[concordium_test]
    fn test_deadline_resets_on_every_bid() {
        let mut auction = auction(None);
        claim_eq!(auction.deadline, None);

        auction
            .place_bid(BIDDER_1, amount(100), at(0))
            .expect("Opening bid should be accepted");
        claim_eq!(auction.deadline, Some(at(15)));

        auction
            .place_bid(BIDDER_2, amount(200), at(10))
            .expect("Second bid should be accepted");
        claim_eq!(
            auction.deadline,
            Some(at(25)),
            "An accepted bid restarts the full window"
        );
    }

    #[concordium_test]
    fn test_bid_at_the_deadline_is_rejected() {
        let mut auction = auction(None);
        auction
            .place_bid(BIDDER_1, amount(100), at(0))
            .expect("Opening bid should be accepted");

        auction
            .place_bid(BIDDER_2, amount(200), Timestamp::from_timestamp_millis(
                at(15).timestamp_millis() - 1,
            ))
            .expect("A bid just before the deadline should be accepted");

        let late = auction.place_bid(BIDDER_1, amount(300), auction.deadline.unwrap());
        claim!(matches!(
            late,
            Err(ContractError::Custom(CustomContractError::AuctionFinished))
        ));
    }

    #[concordium_test]
    fn test_quick_finish_latch_is_monotonic() {
        let mut auction = auction(None);

        auction
            .place_bid(BIDDER_1, amount(100), at(0))
            .expect("Opening bid should be accepted");
        claim!(!auction.quick_finish_armed);

        auction
            .place_bid(BIDDER_2, amount(499), at(1))
            .expect("Bid should be accepted");
        claim!(
            !auction.quick_finish_armed,
            "Just under the multiplier must not arm"
        );

        auction
            .place_bid(BIDDER_1, amount(2495), at(2))
            .expect("Bid should be accepted");
        claim!(auction.quick_finish_armed, "Exactly the multiplier arms");

        auction
            .place_bid(BIDDER_2, amount(2496), at(3))
            .expect("Bid should be accepted");
        claim!(
            auction.quick_finish_armed,
            "The latch never resets, whatever later bids look like"
        );
    }

    #[concordium_test]
    fn test_end_requires_the_armed_latch() {
        let mut auction = auction(None);
        auction
            .place_bid(BIDDER_1, amount(100), at(0))
            .expect("Opening bid should be accepted");

        let premature = auction.end(SELLER, at(5));
        claim!(matches!(
            premature,
            Err(ContractError::Custom(
                CustomContractError::AuctionStillActive
            ))
        ));

        auction
            .place_bid(BIDDER_2, amount(500), at(5))
            .expect("Quick finish bid should be accepted");

        let foreign = auction.end(BIDDER_2, at(6));
        claim!(matches!(foreign, Err(ContractError::Unauthorized)));

        auction.end(SELLER, at(6)).expect("Armed end should work");
        claim!(!auction.is_active(at(6)));

        let repeated = auction.end(SELLER, at(6));
        claim!(matches!(
            repeated,
            Err(ContractError::Custom(CustomContractError::AuctionFinalized))
        ));
    }

    #[concordium_test]
    fn test_end_after_natural_closure_is_rejected() {
        let mut auction = auction(None);
        auction
            .place_bid(BIDDER_1, amount(100), at(0))
            .expect("Opening bid should be accepted");
        auction
            .place_bid(BIDDER_2, amount(500), at(1))
            .expect("Quick finish bid should be accepted");

        // The latch is armed, but the deadline has already closed the
        // auction on its own.
        let late = auction.end(SELLER, at(17));
        claim!(matches!(
            late,
            Err(ContractError::Custom(CustomContractError::AuctionFinalized))
        ));
    }

    #[concordium_test]
    fn test_settle_happens_exactly_once() {
        let mut auction = auction(None);
        auction
            .place_bid(BIDDER_1, amount(100), at(0))
            .expect("Opening bid should be accepted");

        let early = auction.settle(at(5));
        claim!(matches!(
            early,
            Err(ContractError::Custom(
                CustomContractError::AuctionStillActive
            ))
        ));

        let outcome = auction.settle(at(15)).expect("Settling after the deadline");
        claim_eq!(
            outcome,
            Settlement::Sale {
                winner: BIDDER_1,
                price: amount(100),
            }
        );
        claim!(auction.settled);
        claim!(!auction.is_active(at(15)));

        let again = auction.settle(at(16));
        claim!(matches!(
            again,
            Err(ContractError::Custom(CustomContractError::AuctionFinalized))
        ));
    }
}
