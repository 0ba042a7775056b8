use super::*;

/// A unique asset: the registry contract holding it plus its token ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct Token {
    pub contract: ContractAddress,
    pub id: ContractTokenId,
}

/// A single accepted bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct Bid {
    /// Bidder account address.
    pub bidder: AccountAddress,
    /// Escrowed bid amount.
    pub amount: TokenAmount,
    /// Slot time at which the bid was accepted.
    pub timestamp: Timestamp,
}
