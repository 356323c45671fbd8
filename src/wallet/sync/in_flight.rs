//! Keyed coalescing of in-flight requests.
//!
//! Callers asking for a key that already has a request running await that request's result
//! instead of starting another one. Completed entries are never reused.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;
use tracing::debug;

pub struct InFlightRequests<K, V: Clone> {
	pending: Mutex<HashMap<K, Shared<BoxFuture<'static, V>>>>,
}

impl<K, V> InFlightRequests<K, V>
where
	K: Eq + Hash + Clone + std::fmt::Debug,
	V: Clone + Send + Sync + 'static,
{
	pub fn new() -> Self {
		Self {
			pending: Mutex::new(HashMap::new()),
		}
	}

	/// Run `make()` for `key`, or join the request already running for it.
	pub async fn run<F, Fut>(&self, key: K, make: F) -> V
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = V> + Send + 'static,
	{
		let (request, leader) = {
			let mut pending = match self.pending.lock() {
				Ok(pending) => pending,
				Err(poisoned) => poisoned.into_inner(),
			};
			match pending.get(&key) {
				Some(existing) if existing.peek().is_none() => {
					debug!("Joining in-flight request {:?}", key);
					(existing.clone(), false)
				}
				_ => {
					let request = make().boxed().shared();
					pending.insert(key.clone(), request.clone());
					(request, true)
				}
			}
		};

		let output = request.clone().await;

		if leader {
			let mut pending = match self.pending.lock() {
				Ok(pending) => pending,
				Err(poisoned) => poisoned.into_inner(),
			};
			if pending.get(&key).is_some_and(|current| current.ptr_eq(&request)) {
				pending.remove(&key);
			}
		}

		output
	}

	pub fn is_pending(&self, key: &K) -> bool {
		match self.pending.lock() {
			Ok(pending) => pending.get(key).is_some_and(|r| r.peek().is_none()),
			Err(_) => false,
		}
	}
}

impl<K, V> Default for InFlightRequests<K, V>
where
	K: Eq + Hash + Clone + std::fmt::Debug,
	V: Clone + Send + Sync + 'static,
{
	fn default() -> Self {
		Self::new()
	}
}
