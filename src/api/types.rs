//! Types for the Fundlock REST API wallet endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of ledger movement a transaction represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
	Deposit,
	Withdrawal,
	Lock,
	Transfer,
	Refund,
}

/// Direction of a transaction relative to the wallet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
	Credit,
	Debit,
}

/// Wallet summary as returned by `GET /api/v1/fundlock/wallet-details`.
///
/// Amounts are decimal strings and are passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
	pub balance: String,
	pub total_locked_amount: String,
	pub total_redeemed_amount: String,
	pub wallet_number: String,
	#[serde(default)]
	pub has_pin: bool,
}

/// A single wallet transaction.
///
/// Transactions are immutable once fetched. `reference` is the identity used
/// as the list key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
	pub id: String,
	#[serde(rename = "type")]
	pub type_: TransactionType,
	pub entry_type: EntryType,
	pub amount: f64,
	pub reference: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub recipient_name: Option<String>,
	/// ISO-8601 timestamp, kept verbatim.
	pub created_at: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
}

impl Transaction {
	/// Parse `created_at` into a UTC timestamp.
	pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
		DateTime::parse_from_rfc3339(&self.created_at)
			.ok()
			.map(|ts| ts.with_timezone(&Utc))
	}

	/// Amount with the entry direction applied: credits positive, debits negative.
	pub fn signed_amount(&self) -> f64 {
		match self.entry_type {
			EntryType::Credit => self.amount,
			EntryType::Debit => -self.amount,
		}
	}
}

/// One page of the transaction history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
	pub current_page: u32,
	pub total_pages: u32,
	pub total_items: u64,
	#[serde(default)]
	pub transactions: Vec<Transaction>,
}

impl TransactionPage {
	/// Whether the backend reports pages after this one.
	pub fn has_next(&self) -> bool {
		self.current_page < self.total_pages
	}
}

/// Weekly spend/receive totals from `GET /api/v1/fundlock/weekly-transactions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyInsights {
	pub spent_this_week: String,
	pub received_this_week: String,
}

impl Default for WeeklyInsights {
	fn default() -> Self {
		Self {
			spent_this_week: "0".to_string(),
			received_this_week: "0".to_string(),
		}
	}
}

/// Response body, either wrapped as `{ status, message, data }` or bare.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiEnvelope<T> {
	Wrapped {
		#[serde(default)]
		#[allow(dead_code)]
		status: Option<serde_json::Value>,
		#[serde(default)]
		message: Option<String>,
		data: T,
	},
	Bare(T),
}

impl<T> ApiEnvelope<T> {
	pub fn into_data(self) -> T {
		match self {
			ApiEnvelope::Wrapped { data, .. } => data,
			ApiEnvelope::Bare(data) => data,
		}
	}

	pub fn message(&self) -> Option<&str> {
		match self {
			ApiEnvelope::Wrapped { message, .. } => message.as_deref(),
			ApiEnvelope::Bare(_) => None,
		}
	}
}

/// Errors returned by the Fundlock API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	/// The request never produced an HTTP response.
	#[error("Transport error: {0}")]
	Transport(#[from] reqwest::Error),

	/// The server answered with a failure status.
	#[error("HTTP {status}: {message}")]
	Status { status: u16, message: String },

	/// Connection-level failure reported by a non-HTTP transport.
	#[error("Network error: {0}")]
	Network(String),

	#[error("JSON parse error: {0}")]
	Decode(#[from] serde_json::Error),

	#[error("Invalid URL: {0}")]
	InvalidUrl(String),

	/// Blank access token; the request was not sent.
	#[error("No active session")]
	Unauthenticated,
}

impl ApiError {
	/// HTTP status carried by the error, `0` when no response was received.
	pub fn status_code(&self) -> u16 {
		match self {
			ApiError::Transport(e) => e.status().map(|s| s.as_u16()).unwrap_or(0),
			ApiError::Status { status, .. } => *status,
			_ => 0,
		}
	}

	/// True when the failure happened below HTTP: offline, refused, timed out.
	pub fn is_network_error(&self) -> bool {
		match self {
			ApiError::Status { .. } => false,
			ApiError::Network(_) => true,
			ApiError::Transport(e) if e.is_decode() || e.is_builder() => {
				mentions_network(&self.to_string())
			}
			ApiError::Transport(_) => self.status_code() == 0,
			_ => mentions_network(&self.to_string()),
		}
	}
}

fn mentions_network(message: &str) -> bool {
	message.to_ascii_lowercase().contains("network")
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_wallet_summary_decodes_camel_case() {
		let summary: WalletSummary = serde_json::from_value(json!({
			"balance": "1000.00",
			"totalLockedAmount": "200.00",
			"totalRedeemedAmount": "0.00",
			"walletNumber": "9012345678",
			"hasPin": true
		}))
		.expect("summary should decode");

		assert_eq!(summary.balance, "1000.00");
		assert_eq!(summary.total_locked_amount, "200.00");
		assert_eq!(summary.total_redeemed_amount, "0.00");
		assert_eq!(summary.wallet_number, "9012345678");
		assert!(summary.has_pin);
	}

	#[test]
	fn test_transaction_enums_and_optional_fields() {
		let tx: Transaction = serde_json::from_value(json!({
			"id": "tx-1",
			"type": "LOCK",
			"entryType": "DEBIT",
			"amount": 250.5,
			"reference": "REF-1",
			"createdAt": "2024-03-01T10:15:00Z"
		}))
		.expect("transaction should decode");

		assert_eq!(tx.type_, TransactionType::Lock);
		assert_eq!(tx.entry_type, EntryType::Debit);
		assert_eq!(tx.recipient_name, None);
		assert_eq!(tx.status, None);
		assert_eq!(tx.signed_amount(), -250.5);
		let ts = tx.created_at_utc().expect("timestamp should parse");
		assert_eq!(ts.to_rfc3339(), "2024-03-01T10:15:00+00:00");
	}

	#[test]
	fn test_unknown_transaction_type_is_rejected() {
		let result = serde_json::from_value::<Transaction>(json!({
			"id": "tx-1",
			"type": "AIRDROP",
			"entryType": "CREDIT",
			"amount": 1.0,
			"reference": "REF-1",
			"createdAt": "2024-03-01T10:15:00Z"
		}));
		assert!(result.is_err());
	}

	#[test]
	fn test_page_has_next() {
		let page = TransactionPage {
			current_page: 2,
			total_pages: 3,
			total_items: 60,
			transactions: Vec::new(),
		};
		assert!(page.has_next());

		let last = TransactionPage {
			current_page: 3,
			..page
		};
		assert!(!last.has_next());
	}

	#[test]
	fn test_envelope_accepts_wrapped_and_bare() {
		let wrapped: ApiEnvelope<WeeklyInsights> = serde_json::from_value(json!({
			"status": "success",
			"message": "fetched",
			"data": { "spentThisWeek": "12.50", "receivedThisWeek": "40.00" }
		}))
		.expect("wrapped body should decode");
		assert_eq!(wrapped.message(), Some("fetched"));
		assert_eq!(wrapped.into_data().spent_this_week, "12.50");

		let bare: ApiEnvelope<WeeklyInsights> = serde_json::from_value(json!({
			"spentThisWeek": "1", "receivedThisWeek": "2"
		}))
		.expect("bare body should decode");
		assert_eq!(bare.message(), None);
		assert_eq!(bare.into_data().received_this_week, "2");
	}

	#[test]
	fn test_status_errors_are_never_network_errors() {
		let err = ApiError::Status {
			status: 503,
			message: "network maintenance".to_string(),
		};
		assert!(!err.is_network_error());
		assert_eq!(err.status_code(), 503);
	}

	#[test]
	fn test_network_variant_and_message_classification() {
		assert!(ApiError::Network("offline".to_string()).is_network_error());
		assert!(ApiError::InvalidUrl("Network unreachable".to_string()).is_network_error());
		assert!(!ApiError::InvalidUrl("bad path".to_string()).is_network_error());
	}

	#[test]
	fn test_unauthenticated_is_generic() {
		assert!(!ApiError::Unauthenticated.is_network_error());
		assert_eq!(ApiError::Unauthenticated.status_code(), 0);
	}
}
