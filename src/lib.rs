//! Client-side wallet synchronization for the Fundlock personal finance API.
//!
//! The crate fetches a wallet's summary, transaction history and weekly insights, merges them into
//! one observable `WalletState`, and keeps it fresh across focus changes and token rotation.

pub mod api;
pub mod config;
pub mod utils;
pub mod wallet;
