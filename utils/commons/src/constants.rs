use super::*;

/// Bidding window granted after every accepted bid. Each bid restarts the
/// full window, whatever time was left on the previous one.
pub const EXTENSION_WINDOW: Duration = Duration::from_millis(15 * 60 * 1000);

/// A bid of at least this many times the previous bid arms the quick finish.
pub const QUICK_FINISH_MULTIPLIER: u64 = 5;

/// Entrypoint CIS-2 contracts invoke when transferring tokens to this
/// contract.
pub const RECEIVE_HOOK_NAME: &str = "onReceivingCIS2";

/// Tag prepended to the serialized auction creation event.
pub const NEW_AUCTION_TAG: u8 = 0;
/// Tag prepended to the serialized bid event.
pub const BID_TAG: u8 = 1;
/// Tag prepended to the serialized manual end event.
pub const ENDED_TAG: u8 = 2;
/// Tag prepended to the serialized settlement event.
pub const SETTLED_TAG: u8 = 3;
/// Tag prepended to the serialized cancellation event.
pub const CANCELLED_TAG: u8 = 4;
