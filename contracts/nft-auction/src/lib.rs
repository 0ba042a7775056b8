//! Auction house for unique CIS-2 assets. A factory entrypoint opens
//! per-asset auctions priced in a fungible CIS-2 token; the contract itself
//! escrows every bid until the auction is settled.
#![cfg_attr(not(feature = "std"), no_std)]

mod contract;
mod events;
mod external;
mod nft;
mod state;
mod token;
