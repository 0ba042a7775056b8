use super::*;

/// The custom errors the contract can produce.
#[derive(Serialize, Debug, PartialEq, Eq, Reject, SchemaType)]
pub enum CustomContractError {
    /// Failed parsing the parameter (Error code: -1).
    #[from(ParseError)]
    ParseParams,
    /// Failed logging: Log is full (Error code: -2).
    LogFull,
    /// Failed logging: Log is malformed (Error code: -3).
    LogMalformed,
    /// Unknown auction identifier (Error code: -4).
    UnknownAuction,
    /// No bid exists at the requested index (Error code: -5).
    UnknownBid,
    /// Bid is not strictly above the current highest bid, or the opening bid
    /// is zero or below the reserve (Error code: -6).
    BidTooLow,
    /// Bidding is over, the auction accepts no further bids (Error code: -7).
    AuctionFinished,
    /// Attempt to end or settle an auction that is still running
    /// (Error code: -8).
    AuctionStillActive,
    /// The auction was already ended or settled (Error code: -9).
    AuctionFinalized,
    /// Cancelling is not possible once a bid has been placed
    /// (Error code: -10).
    BidsPlaced,
    /// Only account addresses can use this function (Error code: -11).
    OnlyAccountAddress,
    /// This function must only be called by a contract (Error code: -12).
    ContractOnly,
    /// The invoked contract does not follow the expected CIS-2 interface
    /// (Error code: -13).
    Incompatible,
    /// Invoking another contract failed (Error code: -14).
    InvokeContractError,
}

impl From<LogError> for CustomContractError {
    fn from(error: LogError) -> Self {
        match error {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}

impl From<CustomContractError> for ContractError {
    fn from(error: CustomContractError) -> Self {
        Cis2Error::Custom(error)
    }
}
