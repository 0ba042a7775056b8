use super::*;

/// Outcome of a finished auction.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub enum Settlement {
    /// The final bid wins the item and its escrow goes to the seller.
    Sale {
        winner: AccountAddress,
        price: TokenAmount,
    },
    /// No bids were placed and the item goes back to the seller.
    Unsold,
}

/// Check a candidate bid against the current highest bid, or against the
/// reserve if this would be the opening bid. Opening bids must be strictly
/// positive even without a reserve.
pub fn validate_bid(
    candidate: TokenAmount,
    highest: Option<TokenAmount>,
    reserve: Option<TokenAmount>,
) -> Result<(), CustomContractError> {
    match highest {
        Some(highest) => ensure!(candidate > highest, CustomContractError::BidTooLow),
        None => {
            ensure!(candidate.0 > 0, CustomContractError::BidTooLow);
            if let Some(reserve) = reserve {
                ensure!(candidate >= reserve, CustomContractError::BidTooLow);
            }
        }
    }
    Ok(())
}

/// A bid of `QUICK_FINISH_MULTIPLIER` times the immediately preceding one
/// gives the seller the right to end the auction without waiting out the
/// deadline. Only consecutive bids are compared.
pub fn meets_quick_finish(previous: TokenAmount, candidate: TokenAmount) -> bool {
    candidate.0 >= previous.0.saturating_mul(QUICK_FINISH_MULTIPLIER)
}

/// Compute the distribution for an ended auction. Bids are ordered by
/// amount, so the winner is always the final entry.
pub fn settlement(bids: &[Bid]) -> Settlement {
    match bids.last() {
        Some(bid) => Settlement::Sale {
            winner: bid.bidder,
            price: bid.amount,
        },
        None => Settlement::Unsold,
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    const ALICE: AccountAddress = AccountAddress([1u8; 32]);
    const BOB: AccountAddress = AccountAddress([2u8; 32]);

    fn amount(value: u64) -> TokenAmount {
        TokenAmountU64(value)
    }

    fn bid(bidder: AccountAddress, value: u64, at_millis: u64) -> Bid {
        Bid {
            bidder,
            amount: amount(value),
            timestamp: Timestamp::from_timestamp_millis(at_millis),
        }
    }

    #[concordium_test]
    fn test_opening_bid_rules() {
        claim_eq!(
            validate_bid(amount(0), None, None),
            Err(CustomContractError::BidTooLow),
            "Zero opening bid should be rejected"
        );
        claim_eq!(validate_bid(amount(1), None, None), Ok(()));

        claim_eq!(
            validate_bid(amount(99), None, Some(amount(100))),
            Err(CustomContractError::BidTooLow),
            "Opening bid below the reserve should be rejected"
        );
        claim_eq!(validate_bid(amount(100), None, Some(amount(100))), Ok(()));
    }

    #[concordium_test]
    fn test_raising_bid_must_exceed_highest() {
        claim_eq!(
            validate_bid(amount(100), Some(amount(100)), None),
            Err(CustomContractError::BidTooLow),
            "Matching the highest bid is not enough"
        );
        claim_eq!(validate_bid(amount(101), Some(amount(100)), None), Ok(()));

        // The reserve bounds the opening bid only.
        claim_eq!(
            validate_bid(amount(150), Some(amount(100)), Some(amount(200))),
            Ok(())
        );
    }

    #[concordium_test]
    fn test_quick_finish_threshold() {
        claim!(meets_quick_finish(amount(300), amount(1500)));
        claim!(!meets_quick_finish(amount(300), amount(1499)));
        // Multiplication saturates instead of wrapping around.
        claim!(meets_quick_finish(amount(u64::MAX / 2), amount(u64::MAX)));
        claim!(!meets_quick_finish(amount(u64::MAX / 2), amount(u64::MAX - 1)));
    }

    #[concordium_test]
    fn test_settlement_picks_the_final_bid() {
        claim_eq!(settlement(&[]), Settlement::Unsold);

        let bids = [bid(ALICE, 100, 0), bid(BOB, 300, 1)];
        claim_eq!(
            settlement(&bids),
            Settlement::Sale {
                winner: BOB,
                price: amount(300),
            }
        );
    }
}
