//! It exposes all common structs and types.
#![cfg_attr(not(feature = "std"), no_std)]
pub use crate::{basis_points::*, constants::*, errors::*, types::*};
use concordium_cis1::*;
use concordium_std::*;

pub mod test;

mod basis_points;
mod constants;
mod errors;
mod types;
