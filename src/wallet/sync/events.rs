//! Event system for wallet synchronization.
//!
//! This module defines the events the synchronizer emits, the handler trait consumers implement,
//! and the dispatcher that fans events out to every registered handler. Toast notifications are
//! delivered as `WalletEvent::Toast`; rendering them is left to the handler.

use crate::wallet::WalletSyncError;
use crate::wallet::sync::status::Resource;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Events that occur during wallet synchronization
#[derive(Debug, Clone, PartialEq)]
pub enum WalletEvent {
	/// A full refresh of all resources started
	FetchStarted,
	/// A resource was fetched and stored
	ResourceLoaded { resource: Resource },
	/// A resource failed and was replaced by defaults
	ResourceFailed {
		resource: Resource,
		network: bool,
		message: String,
	},
	/// A further transaction page was appended
	PageAppended { page: u32, count: usize },
	/// A one-shot user notification
	Toast { message: String },
}

/// Trait for handling wallet events.
#[async_trait::async_trait]
pub trait WalletEventHandler: Send + Sync {
	/// Handle a wallet event.
	async fn handle(&self, event: &WalletEvent) -> Result<(), WalletSyncError>;

	/// Get the name of this handler for logging and diagnostics.
	fn name(&self) -> &'static str;
}

/// Event dispatcher that manages multiple event handlers.
///
/// Handlers are called in registration order. A failing handler is logged and does not stop the
/// others.
#[derive(Default)]
pub struct EventDispatcher {
	handlers: RwLock<Vec<Arc<dyn WalletEventHandler>>>,
}

impl EventDispatcher {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register_handler(&self, handler: Arc<dyn WalletEventHandler>) {
		match self.handlers.write() {
			Ok(mut handlers) => handlers.push(handler),
			Err(_) => error!("Event handler registry poisoned, dropping {}", handler.name()),
		}
	}

	pub async fn dispatch(&self, event: WalletEvent) {
		let handlers: Vec<Arc<dyn WalletEventHandler>> = match self.handlers.read() {
			Ok(handlers) => handlers.clone(),
			Err(_) => return,
		};

		for handler in handlers {
			if let Err(e) = handler.handle(&event).await {
				error!("Handler {} failed to process event: {}", handler.name(), e);
			}
		}
	}
}

/// Logs every event through `tracing`.
pub struct LoggingEventHandler;

#[async_trait::async_trait]
impl WalletEventHandler for LoggingEventHandler {
	async fn handle(&self, event: &WalletEvent) -> Result<(), WalletSyncError> {
		match event {
			WalletEvent::FetchStarted => debug!("Wallet refresh started"),
			WalletEvent::ResourceLoaded { resource } => debug!("Loaded {}", resource.name()),
			WalletEvent::ResourceFailed {
				resource,
				network,
				message,
			} => {
				if *network {
					error!("Network failure loading {}: {}", resource.name(), message)
				} else {
					warn!("Failed to load {}: {}", resource.name(), message)
				}
			}
			WalletEvent::PageAppended { page, count } => {
				info!("Appended {} transactions from page {}", count, page)
			}
			WalletEvent::Toast { message } => info!("Toast: {}", message),
		}
		Ok(())
	}

	fn name(&self) -> &'static str {
		"logging"
	}
}

/// Keeps every event it sees, in order.
#[derive(Clone, Default)]
pub struct EventRecorder {
	events: Arc<Mutex<Vec<WalletEvent>>>,
}

impl EventRecorder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> Vec<WalletEvent> {
		self.events.lock().map(|e| e.clone()).unwrap_or_default()
	}

	/// Messages of every toast seen so far.
	pub fn toasts(&self) -> Vec<String> {
		self.events()
			.into_iter()
			.filter_map(|e| match e {
				WalletEvent::Toast { message } => Some(message),
				_ => None,
			})
			.collect()
	}
}

#[async_trait::async_trait]
impl WalletEventHandler for EventRecorder {
	async fn handle(&self, event: &WalletEvent) -> Result<(), WalletSyncError> {
		self.events
			.lock()
			.map_err(|_| WalletSyncError::Storage("Event recorder lock poisoned".to_string()))?
			.push(event.clone());
		Ok(())
	}

	fn name(&self) -> &'static str {
		"recorder"
	}
}
