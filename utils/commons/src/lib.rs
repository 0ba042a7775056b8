//! It exposes the types, error taxonomy and auction rules shared by the
//! auction contracts.
#![cfg_attr(not(feature = "std"), no_std)]
pub use crate::{calculations::*, constants::*, errors::*, structs::*, types::*};
use concordium_cis2::*;
use concordium_std::*;

pub mod test;

mod calculations;
mod constants;
mod errors;
mod structs;
mod types;
