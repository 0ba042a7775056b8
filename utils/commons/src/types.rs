use super::*;

pub type ContractResult<A> = Result<A, ContractError>;

/// Wrapping the custom errors in a type with CIS-2 errors.
pub type ContractError = Cis2Error<CustomContractError>;

/// Auction identifier: index into the factory's auction arena.
pub type AuctionId = u64;

/// Token ID type used by asset registries.
pub type ContractTokenId = TokenIdVec;

/// Amount type of the fungible payment ledgers.
pub type TokenAmount = TokenAmountU64;

/// Payment ledgers are wrapped-currency style contracts that keep a single
/// fungible token under the unit token ID.
pub type PaymentTokenId = TokenIdUnit;
