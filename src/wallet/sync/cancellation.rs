//! Shutdown signal for the synchronizer.
//!
//! Once tripped, the flag stays set. State mutations check it first, and background tasks can
//! await `cancelled()` to stop.

use tokio::sync::watch;

/// One-way cancellation signal shared by the synchronizer and its tasks.
#[derive(Clone)]
pub struct CancellationFlag {
	tx: watch::Sender<bool>,
}

impl CancellationFlag {
	pub fn new() -> Self {
		let (tx, _rx) = watch::channel(false);
		Self { tx }
	}

	pub fn cancel(&self) {
		self.tx.send_replace(true);
	}

	pub fn is_cancelled(&self) -> bool {
		*self.tx.borrow()
	}

	/// Resolves once `cancel` has been called.
	pub async fn cancelled(&self) {
		let mut rx = self.tx.subscribe();
		// The sender lives in `self`, so `wait_for` cannot observe a closed channel.
		let _ = rx.wait_for(|cancelled| *cancelled).await;
	}
}

impl Default for CancellationFlag {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[tokio::test]
	async fn test_cancelled_resolves_after_cancel() {
		let flag = CancellationFlag::new();
		assert!(!flag.is_cancelled());

		let waiter = {
			let flag = flag.clone();
			tokio::spawn(async move { flag.cancelled().await })
		};
		flag.cancel();

		tokio::time::timeout(Duration::from_secs(1), waiter)
			.await
			.expect("cancellation not observed")
			.expect("waiter task");
		assert!(flag.is_cancelled());
	}
}
