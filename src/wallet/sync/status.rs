//! Load status tracking for the synchronized wallet resources.
//!
//! Each remote resource (summary, transactions, insights) moves through its own
//! `idle -> loading -> {success, error}` cycle. `ResourceStatuses` keeps the three side by side
//! and folds them into a single status for the UI.

use serde::Serialize;

/// The remote resources the synchronizer keeps in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Resource {
	Summary,
	Transactions,
	Insights,
}

impl Resource {
	pub const ALL: [Resource; 3] = [Resource::Summary, Resource::Transactions, Resource::Insights];

	pub fn name(&self) -> &'static str {
		match self {
			Resource::Summary => "wallet-details",
			Resource::Transactions => "transactions",
			Resource::Insights => "weekly-insights",
		}
	}
}

/// Lifecycle of a single resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ResourceStatus {
	/// Nothing requested yet (no session, or not fetched).
	#[default]
	Idle,
	Loading,
	Success,
	Error,
}

/// Per-resource statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ResourceStatuses {
	pub summary: ResourceStatus,
	pub transactions: ResourceStatus,
	pub insights: ResourceStatus,
}

impl ResourceStatuses {
	pub fn get(&self, resource: Resource) -> ResourceStatus {
		match resource {
			Resource::Summary => self.summary,
			Resource::Transactions => self.transactions,
			Resource::Insights => self.insights,
		}
	}

	pub fn set(&mut self, resource: Resource, status: ResourceStatus) {
		match resource {
			Resource::Summary => self.summary = status,
			Resource::Transactions => self.transactions = status,
			Resource::Insights => self.insights = status,
		}
	}

	/// Merged view: loading wins over error, error over success.
	/// All idle is idle; a mix of idle and success counts as success.
	pub fn merged(&self) -> ResourceStatus {
		let all = Resource::ALL.map(|r| self.get(r));
		if all.contains(&ResourceStatus::Loading) {
			ResourceStatus::Loading
		} else if all.contains(&ResourceStatus::Error) {
			ResourceStatus::Error
		} else if all.contains(&ResourceStatus::Success) {
			ResourceStatus::Success
		} else {
			ResourceStatus::Idle
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merged_status_precedence() {
		let mut statuses = ResourceStatuses::default();
		assert_eq!(statuses.merged(), ResourceStatus::Idle);

		statuses.set(Resource::Summary, ResourceStatus::Success);
		assert_eq!(statuses.merged(), ResourceStatus::Success);

		statuses.set(Resource::Insights, ResourceStatus::Error);
		assert_eq!(statuses.merged(), ResourceStatus::Error);

		statuses.set(Resource::Transactions, ResourceStatus::Loading);
		assert_eq!(statuses.merged(), ResourceStatus::Loading);
	}
}
