//! Wallet synchronizer and integration point for the wallet read endpoints.
//!
//! `WalletSynchronizer` combines the wallet summary, the paginated transaction history and the
//! weekly insights into one `WalletState`, published over a `tokio::sync::watch` channel. It is
//! responsible for:
//! - Fetching the three resources concurrently and merging each result as it lands
//! - Classifying failures into network errors (persistent retry banner) and generic errors
//!   (one-shot toast), substituting safe defaults in both cases
//! - Incremental "load more" pagination guarded against re-entrancy
//! - Refetching on screen focus and on access-token rotation
//! - Mirroring the server's `hasPin` flag into secure storage
//!
//! Handles are cheap to clone and share one underlying state.

use crate::api::{ApiError, WalletApi};
use crate::wallet::WalletSyncError;
use crate::wallet::session::{Session, SessionHandle};
use crate::wallet::storage::{PinFlagRepository, SecureStore};
use crate::wallet::sync::{
	cancellation::CancellationFlag,
	events::{EventDispatcher, WalletEvent, WalletEventHandler},
	in_flight::InFlightRequests,
	state::{GENERIC_ERROR_MESSAGE, NetworkErrorDetail, WalletState},
	status::{Resource, ResourceStatus},
};

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Identity of a request: the user and token it was issued for.
///
/// Concurrent refreshes with the same key are coalesced, and results are only merged while the
/// session still carries this key.
#[derive(Clone, PartialEq, Eq, Hash)]
struct FetchKey {
	user_id: String,
	access_token: Arc<str>,
}

impl FetchKey {
	fn for_session(session: &Session) -> Self {
		Self {
			user_id: session.user_id.clone(),
			access_token: Arc::from(session.access_token.as_str()),
		}
	}

	fn matches(&self, session: Option<&Session>) -> bool {
		session.is_some_and(|s| {
			s.user_id == self.user_id && s.access_token.as_str() == &*self.access_token
		})
	}
}

impl fmt::Debug for FetchKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FetchKey")
			.field("user_id", &self.user_id)
			.field("access_token", &"<redacted>")
			.finish()
	}
}

/// What a full refresh ended with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
	/// Set when a request failed without an HTTP response.
	pub network_error: Option<NetworkErrorDetail>,
	/// Resources that fell back to defaults.
	pub failed: Vec<Resource>,
	/// False when there was no session or the synchronizer was shut down.
	pub attempted: bool,
}

impl FetchOutcome {
	pub fn is_success(&self) -> bool {
		self.attempted && self.failed.is_empty()
	}

	/// Surface the network case as an error; generic failures are absorbed.
	pub fn into_result(self) -> Result<(), WalletSyncError> {
		match self.network_error {
			Some(detail) => Err(WalletSyncError::NetworkUnavailable(format!(
				"{}: {}",
				detail.resource.name(),
				detail.message
			))),
			None => Ok(()),
		}
	}
}

/// Result of a `load_more` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMoreOutcome {
	/// The next page was appended.
	Appended { page: u32, count: usize },
	/// The last known page is the final one.
	NoMorePages,
	/// Another `load_more` is still running.
	AlreadyLoading,
	NoSession,
	/// The request failed; the list is unchanged.
	Failed,
	/// The synchronizer was shut down, or the session changed, while the request ran.
	Cancelled,
}

/// Resets the load-more flag when the request ends, however it ends.
struct LoadMoreGuard<'a>(&'a AtomicBool);

impl Drop for LoadMoreGuard<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

struct SyncInner {
	api: Arc<dyn WalletApi>,
	session: SessionHandle,
	pin_flags: PinFlagRepository,
	state: watch::Sender<WalletState>,
	events: EventDispatcher,
	in_flight: InFlightRequests<FetchKey, FetchOutcome>,
	loading_more: AtomicBool,
	has_fetched: AtomicBool,
	/// Bumped whenever the base transaction list is replaced.
	list_generation: AtomicU64,
	cancellation: CancellationFlag,
	watcher: Mutex<Option<JoinHandle<()>>>,
}

/// Client-side wallet state synchronizer.
#[derive(Clone)]
pub struct WalletSynchronizer {
	inner: Arc<SyncInner>,
}

impl WalletSynchronizer {
	/// Create a synchronizer bound to the given session and API.
	///
	/// Nothing is fetched until `fetch_all`, `on_focus` or a session change (once
	/// `watch_session` is running).
	pub fn new(
		api: Arc<dyn WalletApi>,
		session: SessionHandle,
		store: Arc<dyn SecureStore>,
	) -> Self {
		let (state, _rx) = watch::channel(WalletState::default());
		Self {
			inner: Arc::new(SyncInner {
				api,
				session,
				pin_flags: PinFlagRepository::new(store),
				state,
				events: EventDispatcher::new(),
				in_flight: InFlightRequests::new(),
				loading_more: AtomicBool::new(false),
				has_fetched: AtomicBool::new(false),
				list_generation: AtomicU64::new(0),
				cancellation: CancellationFlag::new(),
				watcher: Mutex::new(None),
			}),
		}
	}

	pub fn register_handler(&self, handler: Arc<dyn WalletEventHandler>) {
		self.inner.events.register_handler(handler);
	}

	/// Load the persisted `HAS_PIN` flag and start watching the session.
	pub async fn start(&self) {
		self.initialize().await;
		self.watch_session();
	}

	/// Seed `has_pin` from secure storage. Read once, before any summary fetch.
	pub async fn initialize(&self) {
		match self.inner.pin_flags.load().await {
			Ok(Some(has_pin)) => {
				debug!("Restored HAS_PIN={} from secure storage", has_pin);
				self.inner.update(|state| {
					if state.has_pin.is_none() {
						state.has_pin = Some(has_pin);
					}
				});
			}
			Ok(None) => debug!("No HAS_PIN flag stored"),
			Err(e) => warn!("Failed to read HAS_PIN flag: {}", e),
		}
	}

	/// Current state.
	pub fn snapshot(&self) -> WalletState {
		self.inner.state.borrow().clone()
	}

	/// Subscribe to state changes.
	pub fn subscribe(&self) -> watch::Receiver<WalletState> {
		self.inner.state.subscribe()
	}

	/// Fetch summary, first transaction page and insights concurrently.
	///
	/// Errors never propagate: each resource falls back to defaults and the outcome reports
	/// what failed. Concurrent calls for the same session share one set of requests.
	pub async fn fetch_all(&self) -> FetchOutcome {
		self.inner.clone().fetch_all().await
	}

	/// Fetch the page after the last loaded one and append it.
	pub async fn load_more(&self) -> LoadMoreOutcome {
		self.inner.load_more().await
	}

	/// Clear error flags and refetch everything.
	pub async fn retry_fetch(&self) -> FetchOutcome {
		info!("Retrying wallet fetch");
		self.inner.update(|state| state.clear_errors());
		self.fetch_all().await
	}

	/// Screen gained focus: fetch once per focus cycle.
	///
	/// # Errors
	/// * `WalletSyncError::NetworkUnavailable` if the fetch hit a network failure.
	/// * `WalletSyncError::Cancelled` after `shutdown`.
	pub async fn on_focus(&self) -> Result<(), WalletSyncError> {
		if self.inner.cancellation.is_cancelled() {
			return Err(WalletSyncError::Cancelled);
		}
		if !self.inner.session.is_active() {
			debug!("Focus without session, skipping fetch");
			return Ok(());
		}
		if self.inner.has_fetched.swap(true, Ordering::AcqRel) {
			debug!("Already fetched during this focus, skipping");
			return Ok(());
		}
		self.fetch_all().await.into_result()
	}

	/// Screen lost focus: the next focus fetches again.
	pub fn on_blur(&self) {
		self.inner.has_fetched.store(false, Ordering::Release);
	}

	/// Spawn the task that refetches whenever the access token changes.
	///
	/// Calling this again while the task runs does nothing.
	pub fn watch_session(&self) {
		let mut watcher = match self.inner.watcher.lock() {
			Ok(watcher) => watcher,
			Err(poisoned) => poisoned.into_inner(),
		};
		if watcher.as_ref().is_some_and(|handle| !handle.is_finished()) {
			return;
		}

		let weak = Arc::downgrade(&self.inner);
		let mut rx = self.inner.session.subscribe();
		let cancellation = self.inner.cancellation.clone();
		let mut last_token = rx
			.borrow_and_update()
			.as_ref()
			.map(|s| s.access_token.clone());

		*watcher = Some(tokio::spawn(async move {
			loop {
				tokio::select! {
					_ = cancellation.cancelled() => break,
					changed = rx.changed() => {
						if changed.is_err() {
							break;
						}
						let token = rx.borrow_and_update().as_ref().map(|s| s.access_token.clone());
						if token == last_token {
							continue;
						}
						last_token = token;

						let Some(inner) = weak.upgrade() else { break };
						if let Err(e) = SyncInner::on_session_changed(inner).await {
							error!("Refetch after token change failed: {}", e);
						}
					}
				}
			}
			debug!("Session watcher stopped");
		}));
	}

	/// Stop reacting: later completions no longer touch state.
	pub fn shutdown(&self) {
		info!("Shutting down wallet synchronizer");
		self.inner.cancellation.cancel();
		let handle = match self.inner.watcher.lock() {
			Ok(mut watcher) => watcher.take(),
			Err(poisoned) => poisoned.into_inner().take(),
		};
		if let Some(handle) = handle {
			handle.abort();
		}
	}

	pub fn is_shut_down(&self) -> bool {
		self.inner.cancellation.is_cancelled()
	}
}

impl SyncInner {
	/// Apply `f` to the state unless shut down. Returns `None` when skipped.
	fn update<R>(&self, f: impl FnOnce(&mut WalletState) -> R) -> Option<R> {
		if self.cancellation.is_cancelled() {
			return None;
		}
		let mut out = None;
		self.state.send_modify(|state| out = Some(f(state)));
		out
	}

	/// Like `update`, but also skipped once the session no longer matches `key`.
	fn update_for<R>(&self, key: &FetchKey, f: impl FnOnce(&mut WalletState) -> R) -> Option<R> {
		if self.cancellation.is_cancelled() {
			return None;
		}
		let mut out = None;
		self.state.send_if_modified(|state| {
			if !self.is_current(key) {
				return false;
			}
			out = Some(f(state));
			true
		});
		if out.is_none() {
			debug!("Session changed, dropping result for user {}", key.user_id);
		}
		out
	}

	fn is_current(&self, key: &FetchKey) -> bool {
		key.matches(self.session.current().as_ref())
	}

	async fn on_session_changed(self: Arc<Self>) -> Result<(), WalletSyncError> {
		match self.session.current() {
			Some(session) => {
				info!("Access token changed for user {}, refetching", session.user_id);
				self.has_fetched.store(true, Ordering::Release);
				self.fetch_all().await.into_result()
			}
			None => {
				info!("Session ended, clearing wallet state");
				self.has_fetched.store(false, Ordering::Release);
				self.list_generation.fetch_add(1, Ordering::AcqRel);
				self.update(|state| {
					*state = WalletState {
						has_pin: state.has_pin,
						..WalletState::default()
					}
				});
				Ok(())
			}
		}
	}

	async fn fetch_all(self: Arc<Self>) -> FetchOutcome {
		if self.cancellation.is_cancelled() {
			return FetchOutcome::default();
		}
		let Some(session) = self.session.current() else {
			debug!("No session, wallet stays idle");
			return FetchOutcome::default();
		};

		let key = FetchKey::for_session(&session);
		if self.in_flight.is_pending(&key) {
			debug!("Wallet fetch for user {} already running", session.user_id);
		}
		let inner = self.clone();
		let request_key = key.clone();
		self.in_flight
			.run(key, move || async move { inner.fetch_all_now(request_key).await })
			.await
	}

	async fn fetch_all_now(self: Arc<Self>, key: FetchKey) -> FetchOutcome {
		info!("Fetching wallet data for user {}", key.user_id);
		self.events.dispatch(WalletEvent::FetchStarted).await;
		self.update_for(&key, |state| {
			for resource in Resource::ALL {
				state.statuses.set(resource, ResourceStatus::Loading);
			}
		});

		let (summary, transactions, insights) = futures::join!(
			self.load_summary(&key),
			self.load_transactions(&key),
			self.load_insights(&key),
		);

		if !self.is_current(&key) {
			info!("Session changed during wallet fetch, results dropped");
			return FetchOutcome::default();
		}

		let mut outcome = FetchOutcome {
			attempted: true,
			..FetchOutcome::default()
		};
		for failure in [summary, transactions, insights].into_iter().flatten() {
			outcome.failed.push(failure.resource);
			if failure.network && outcome.network_error.is_none() {
				outcome.network_error = Some(NetworkErrorDetail {
					resource: failure.resource,
					message: failure.message,
				});
			}
		}

		if outcome.failed.is_empty() {
			info!("Wallet data refreshed");
		} else {
			warn!("Wallet refresh finished with {} failed resources", outcome.failed.len());
		}
		outcome
	}

	async fn load_summary(&self, key: &FetchKey) -> Option<ResourceFailure> {
		match self.api.wallet_details(&key.access_token).await {
			Ok(summary) => {
				let has_pin = summary.has_pin;
				self.update_for(key, |state| state.apply_summary(summary))?;
				if let Err(e) = self.pin_flags.save(has_pin).await {
					warn!("Failed to persist HAS_PIN flag: {}", e);
				}
				self.events
					.dispatch(WalletEvent::ResourceLoaded {
						resource: Resource::Summary,
					})
					.await;
				None
			}
			Err(e) => {
				self.update_for(key, |state| state.reset_summary());
				self.handle_failure(key, Resource::Summary, e).await
			}
		}
	}

	async fn load_transactions(&self, key: &FetchKey) -> Option<ResourceFailure> {
		match self.api.transactions(&key.access_token, None).await {
			Ok(page) => {
				self.list_generation.fetch_add(1, Ordering::AcqRel);
				self.update_for(key, |state| state.replace_transactions(page))?;
				self.events
					.dispatch(WalletEvent::ResourceLoaded {
						resource: Resource::Transactions,
					})
					.await;
				None
			}
			Err(e) => {
				self.list_generation.fetch_add(1, Ordering::AcqRel);
				self.update_for(key, |state| state.reset_transactions());
				self.handle_failure(key, Resource::Transactions, e).await
			}
		}
	}

	async fn load_insights(&self, key: &FetchKey) -> Option<ResourceFailure> {
		match self.api.weekly_insights(&key.access_token).await {
			Ok(insights) => {
				self.update_for(key, |state| state.apply_insights(insights))?;
				self.events
					.dispatch(WalletEvent::ResourceLoaded {
						resource: Resource::Insights,
					})
					.await;
				None
			}
			Err(e) => {
				self.update_for(key, |state| state.reset_insights());
				self.handle_failure(key, Resource::Insights, e).await
			}
		}
	}

	/// Classify a failure and raise the matching flag. Returns `None` once shut down or once
	/// the session no longer matches `key`.
	async fn handle_failure(
		&self,
		key: &FetchKey,
		resource: Resource,
		err: ApiError,
	) -> Option<ResourceFailure> {
		let network = err.is_network_error();
		let message = err.to_string();

		if network {
			error!("Network error fetching {}: {}", resource.name(), message);
			let detail = message.clone();
			self.update_for(key, |state| state.record_network_error(resource, detail))?;
		} else {
			warn!("Failed to fetch {}: {}", resource.name(), message);
			let changed =
				self.update_for(key, |state| state.record_unknown_error(GENERIC_ERROR_MESSAGE))?;
			if changed {
				self.events
					.dispatch(WalletEvent::Toast {
						message: GENERIC_ERROR_MESSAGE.to_string(),
					})
					.await;
			}
		}

		self.events
			.dispatch(WalletEvent::ResourceFailed {
				resource,
				network,
				message: message.clone(),
			})
			.await;

		Some(ResourceFailure {
			resource,
			network,
			message,
		})
	}

	async fn load_more(&self) -> LoadMoreOutcome {
		if self.cancellation.is_cancelled() {
			return LoadMoreOutcome::Cancelled;
		}
		if self
			.loading_more
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.is_err()
		{
			debug!("load_more already in flight");
			return LoadMoreOutcome::AlreadyLoading;
		}
		let _guard = LoadMoreGuard(&self.loading_more);

		let (has_next, next_page) = {
			let state = self.state.borrow();
			(state.has_next(), state.current_page + 1)
		};
		if !has_next {
			debug!("No more transaction pages");
			return LoadMoreOutcome::NoMorePages;
		}
		let Some(session) = self.session.current() else {
			return LoadMoreOutcome::NoSession;
		};

		let key = FetchKey::for_session(&session);
		let generation = self.list_generation.load(Ordering::Acquire);
		self.update_for(&key, |state| state.is_loading_more = true);
		info!("Loading transaction page {}", next_page);

		match self.api.transactions(&key.access_token, Some(next_page)).await {
			Ok(page) => {
				let count = page.transactions.len();
				let page_number = page.current_page;
				if self.list_generation.load(Ordering::Acquire) != generation {
					warn!(
						"Transaction list was refreshed while page {} was loading; appending anyway",
						next_page
					);
				}
				let appended = self.update_for(&key, |state| {
					state.append_page(page);
					state.is_loading_more = false;
				});
				if appended.is_none() {
					self.update(|state| state.is_loading_more = false);
					return LoadMoreOutcome::Cancelled;
				}
				self.events
					.dispatch(WalletEvent::PageAppended {
						page: page_number,
						count,
					})
					.await;
				LoadMoreOutcome::Appended {
					page: page_number,
					count,
				}
			}
			Err(e) => {
				self.update(|state| state.is_loading_more = false);
				match self.handle_failure(&key, Resource::Transactions, e).await {
					Some(_) => LoadMoreOutcome::Failed,
					None => LoadMoreOutcome::Cancelled,
				}
			}
		}
	}
}

struct ResourceFailure {
	resource: Resource,
	network: bool,
	message: String,
}
