//! The client-visible wallet state bundle.
//!
//! `WalletState` merges the wallet summary, the accumulated transaction history and the weekly
//! insights with their load statuses and error flags. Every failure path substitutes safe
//! defaults so consumers never observe missing values.

use crate::api::{Transaction, TransactionPage, WalletSummary, WeeklyInsights};
use crate::wallet::sync::status::{Resource, ResourceStatus, ResourceStatuses};
use serde::Serialize;

/// Placeholder shown for summary amounts when the summary is unavailable.
pub const ZERO_AMOUNT: &str = "0.00";

/// Fallback message for generic failures. Server messages are only logged.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred, try again later";

/// The transport failure behind the network-error flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkErrorDetail {
	pub resource: Resource,
	pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletState {
	pub balance: String,
	pub total_locked_amount: String,
	pub total_redeemed_amount: String,
	pub wallet_number: String,
	/// Seeded from secure storage, then mirrors the server value.
	pub has_pin: Option<bool>,

	/// Accumulated history, newest first as returned by the backend.
	pub transactions: Vec<Transaction>,
	pub current_page: u32,
	pub total_pages: u32,
	pub total_items: u64,
	pub is_loading_more: bool,

	pub insights: WeeklyInsights,

	pub statuses: ResourceStatuses,
	pub network_error: bool,
	pub network_error_detail: Option<NetworkErrorDetail>,
	pub unknown_error: Option<String>,
}

impl Default for WalletState {
	fn default() -> Self {
		Self {
			balance: ZERO_AMOUNT.to_string(),
			total_locked_amount: ZERO_AMOUNT.to_string(),
			total_redeemed_amount: ZERO_AMOUNT.to_string(),
			wallet_number: String::new(),
			has_pin: None,
			transactions: Vec::new(),
			current_page: 0,
			total_pages: 0,
			total_items: 0,
			is_loading_more: false,
			insights: WeeklyInsights::default(),
			statuses: ResourceStatuses::default(),
			network_error: false,
			network_error_detail: None,
			unknown_error: None,
		}
	}
}

impl WalletState {
	/// Whether another transaction page can be requested.
	pub fn has_next(&self) -> bool {
		self.current_page < self.total_pages
	}

	pub fn status(&self) -> ResourceStatus {
		self.statuses.merged()
	}

	pub fn is_loading(&self) -> bool {
		self.status() == ResourceStatus::Loading
	}

	pub fn apply_summary(&mut self, summary: WalletSummary) {
		self.balance = summary.balance;
		self.total_locked_amount = summary.total_locked_amount;
		self.total_redeemed_amount = summary.total_redeemed_amount;
		self.wallet_number = summary.wallet_number;
		self.has_pin = Some(summary.has_pin);
		self.statuses.set(Resource::Summary, ResourceStatus::Success);
	}

	/// Zero the summary amounts. `has_pin` keeps its last known value.
	pub fn reset_summary(&mut self) {
		self.balance = ZERO_AMOUNT.to_string();
		self.total_locked_amount = ZERO_AMOUNT.to_string();
		self.total_redeemed_amount = ZERO_AMOUNT.to_string();
		self.statuses.set(Resource::Summary, ResourceStatus::Error);
	}

	/// Replace the history with a freshly fetched first page.
	pub fn replace_transactions(&mut self, page: TransactionPage) {
		self.current_page = page.current_page;
		self.total_pages = page.total_pages;
		self.total_items = page.total_items;
		self.transactions = page.transactions;
		self.statuses.set(Resource::Transactions, ResourceStatus::Success);
	}

	/// Append a further page in received order. No re-sorting or deduplication.
	pub fn append_page(&mut self, page: TransactionPage) {
		self.current_page = page.current_page;
		self.total_pages = page.total_pages;
		self.total_items = page.total_items;
		self.transactions.extend(page.transactions);
	}

	pub fn reset_transactions(&mut self) {
		self.transactions.clear();
		self.current_page = 0;
		self.total_pages = 0;
		self.total_items = 0;
		self.statuses.set(Resource::Transactions, ResourceStatus::Error);
	}

	pub fn apply_insights(&mut self, insights: WeeklyInsights) {
		self.insights = insights;
		self.statuses.set(Resource::Insights, ResourceStatus::Success);
	}

	pub fn reset_insights(&mut self) {
		self.insights = WeeklyInsights::default();
		self.statuses.set(Resource::Insights, ResourceStatus::Error);
	}

	pub fn record_network_error(&mut self, resource: Resource, message: String) {
		self.network_error = true;
		self.network_error_detail = Some(NetworkErrorDetail { resource, message });
	}

	/// Set the generic error message. Returns true if the value changed.
	pub fn record_unknown_error(&mut self, message: &str) -> bool {
		if self.unknown_error.as_deref() == Some(message) {
			return false;
		}
		self.unknown_error = Some(message.to_string());
		true
	}

	pub fn clear_errors(&mut self) {
		self.network_error = false;
		self.network_error_detail = None;
		self.unknown_error = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::{EntryType, TransactionType};

	fn tx(reference: &str) -> Transaction {
		Transaction {
			id: reference.to_string(),
			type_: TransactionType::Deposit,
			entry_type: EntryType::Credit,
			amount: 10.0,
			reference: reference.to_string(),
			recipient_name: None,
			created_at: "2024-03-01T10:15:00Z".to_string(),
			status: None,
		}
	}

	fn page(current: u32, total: u32, refs: &[&str]) -> TransactionPage {
		TransactionPage {
			current_page: current,
			total_pages: total,
			total_items: 0,
			transactions: refs.iter().map(|r| tx(r)).collect(),
		}
	}

	#[test]
	fn test_defaults_are_zeroed() {
		let state = WalletState::default();
		assert_eq!(state.balance, "0.00");
		assert_eq!(state.total_locked_amount, "0.00");
		assert_eq!(state.total_redeemed_amount, "0.00");
		assert_eq!(state.insights.spent_this_week, "0");
		assert_eq!(state.insights.received_this_week, "0");
		assert!(state.transactions.is_empty());
		assert!(!state.has_next());
		assert_eq!(state.status(), ResourceStatus::Idle);
	}

	#[test]
	fn test_append_preserves_order_and_duplicates() {
		let mut state = WalletState::default();
		state.replace_transactions(page(1, 3, &["a", "b"]));
		state.append_page(page(2, 3, &["b", "c"]));

		let refs: Vec<&str> = state.transactions.iter().map(|t| t.reference.as_str()).collect();
		assert_eq!(refs, vec!["a", "b", "b", "c"]);
		assert_eq!(state.current_page, 2);
		assert!(state.has_next());
	}

	#[test]
	fn test_reset_summary_keeps_pin_flag() {
		let mut state = WalletState::default();
		state.apply_summary(WalletSummary {
			balance: "5.00".to_string(),
			total_locked_amount: "1.00".to_string(),
			total_redeemed_amount: "0.50".to_string(),
			wallet_number: "123".to_string(),
			has_pin: true,
		});
		state.reset_summary();

		assert_eq!(state.balance, "0.00");
		assert_eq!(state.total_redeemed_amount, "0.00");
		assert_eq!(state.has_pin, Some(true));
		assert_eq!(state.statuses.summary, ResourceStatus::Error);
	}

	#[test]
	fn test_unknown_error_changes_only_on_new_value() {
		let mut state = WalletState::default();
		assert!(state.record_unknown_error(GENERIC_ERROR_MESSAGE));
		assert!(!state.record_unknown_error(GENERIC_ERROR_MESSAGE));

		state.clear_errors();
		assert!(state.record_unknown_error(GENERIC_ERROR_MESSAGE));
	}
}
