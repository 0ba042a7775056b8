use commons::{AuctionId, Bid, Token, TokenAmount};
use concordium_std::*;

/// Parameter for `createAuction`: list an asset without a reserve, so the
/// opening bid may be any positive amount.
#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct CreateParams {
    /// Account entitled to the proceeds.
    pub seller: AccountAddress,
    /// CIS-2 contract of the fungible token used for bidding.
    pub payment_token: ContractAddress,
    /// Informational listing price. Not enforced on bids.
    pub starting_price: TokenAmount,
    /// Asset under auction.
    pub item: Token,
}

/// Parameter for `createAuctionWithReserve`.
#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct CreateWithReserveParams {
    /// Account entitled to the proceeds.
    pub seller: AccountAddress,
    /// CIS-2 contract of the fungible token used for bidding.
    pub payment_token: ContractAddress,
    /// Informational listing price. Not enforced on bids.
    pub starting_price: TokenAmount,
    /// Asset under auction.
    pub item: Token,
    /// Smallest allowed opening bid.
    pub reserve: TokenAmount,
}

/// Parameter for `bid`.
#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct BidParams {
    pub auction: AuctionId,
    pub amount: TokenAmount,
}

/// Parameter for the `bids` view.
#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct BidQueryParams {
    pub auction: AuctionId,
    /// Zero-based position in the bid history.
    pub index: u32,
}

/// Response of the `view` entrypoint: a full snapshot of one auction.
#[derive(Debug, PartialEq, Eq, Serialize, SchemaType)]
pub struct AuctionView {
    pub seller: AccountAddress,
    pub payment_token: ContractAddress,
    pub starting_price: TokenAmount,
    pub item: Token,
    pub reserve: Option<TokenAmount>,
    pub created_at: Timestamp,
    /// Absent until the first bid is accepted.
    pub deadline: Option<Timestamp>,
    pub highest_bid: Option<Bid>,
    pub bid_count: u32,
    pub quick_finish_armed: bool,
    pub active: bool,
    pub settled: bool,
}
