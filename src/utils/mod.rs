//!
//! Utility module for the wallet client.
//!
//! Re-exports formatting helpers used when logging wallet state.
/// Amount formatting helpers
pub mod index;

pub use index::format_amount;
