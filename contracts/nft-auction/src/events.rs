use commons::{
    AuctionId, Token, TokenAmount, BID_TAG, CANCELLED_TAG, ENDED_TAG, NEW_AUCTION_TAG, SETTLED_TAG,
};
use concordium_std::*;

/// Auction creation event data.
#[derive(Debug, Serial)]
pub struct NewAuctionEvent<'a> {
    /// Identifier of the new auction.
    pub auction: AuctionId,
    /// Account entitled to the proceeds.
    pub seller: &'a AccountAddress,
    /// Asset under auction.
    pub item: &'a Token,
}

/// Bid acceptance event data.
#[derive(Debug, Serial)]
pub struct BidEvent {
    /// Auction the bid was placed in.
    pub auction: AuctionId,
    /// Bidder account address.
    pub bidder: AccountAddress,
    /// Escrowed bid amount.
    pub amount: TokenAmount,
    /// Position of the bid in the auction's history.
    pub index: u32,
}

/// Manual end event data.
#[derive(Debug, Serial)]
pub struct EndedEvent {
    pub auction: AuctionId,
}

/// Settlement event data.
#[derive(Debug, Serial)]
pub struct SettledEvent {
    pub auction: AuctionId,
    /// Winning bidder, absent if the auction closed without bids.
    pub winner: Option<AccountAddress>,
    /// Amount paid out to the seller, absent if the auction closed without
    /// bids.
    pub price: Option<TokenAmount>,
}

/// Pre-bid cancellation event data.
#[derive(Debug, Serial)]
pub struct CancelledEvent {
    pub auction: AuctionId,
    pub seller: AccountAddress,
}

/// Tagged event to be serialized for the event log.
#[derive(Debug)]
pub enum AuctionEvents<'a> {
    New(NewAuctionEvent<'a>),
    Bid(BidEvent),
    Ended(EndedEvent),
    Settled(SettledEvent),
    Cancelled(CancelledEvent),
}

impl<'a> AuctionEvents<'a> {
    pub fn new_auction(auction: AuctionId, seller: &'a AccountAddress, item: &'a Token) -> Self {
        Self::New(NewAuctionEvent {
            auction,
            seller,
            item,
        })
    }

    pub fn bid(auction: AuctionId, bidder: AccountAddress, amount: TokenAmount, index: u32) -> Self {
        Self::Bid(BidEvent {
            auction,
            bidder,
            amount,
            index,
        })
    }

    pub fn ended(auction: AuctionId) -> Self {
        Self::Ended(EndedEvent { auction })
    }

    pub fn settled(
        auction: AuctionId,
        winner: Option<AccountAddress>,
        price: Option<TokenAmount>,
    ) -> Self {
        Self::Settled(SettledEvent {
            auction,
            winner,
            price,
        })
    }

    pub fn cancelled(auction: AuctionId, seller: AccountAddress) -> Self {
        Self::Cancelled(CancelledEvent { auction, seller })
    }
}

impl<'a> Serial for AuctionEvents<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            AuctionEvents::New(event) => {
                out.write_u8(NEW_AUCTION_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Bid(event) => {
                out.write_u8(BID_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Ended(event) => {
                out.write_u8(ENDED_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Settled(event) => {
                out.write_u8(SETTLED_TAG)?;
                event.serial(out)
            }
            AuctionEvents::Cancelled(event) => {
                out.write_u8(CANCELLED_TAG)?;
                event.serial(out)
            }
        }
    }
}
