//! Settlement engine for NFT auctions and fixed price sales, paid in CCD or
//! a designated CIS-1 fungible token.
#![cfg_attr(not(feature = "std"), no_std)]

mod contract;
mod events;
mod external;
mod nft;
mod payout;
mod state;
mod token;
