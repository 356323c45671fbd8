//! Fundlock REST API integration module
//!
//! This module provides the client and types for the wallet read endpoints of the Fundlock
//! backend: wallet summary, paginated transaction history and weekly insights. Errors are
//! classified into network failures (no response) and generic failures (response received).

/// HTTP client for the wallet endpoints
mod client;
/// Type definitions for API payloads and errors
mod types;

pub use client::{
	FundlockApiClient, TRANSACTIONS_PATH, WALLET_DETAILS_PATH, WEEKLY_TRANSACTIONS_PATH, WalletApi,
};
pub use types::*;
