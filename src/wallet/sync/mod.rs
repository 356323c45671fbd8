//! Wallet Synchronization Module
//!
//! This module provides the client-side logic for keeping a wallet view in sync with the Fundlock
//! backend. It is composed of several submodules, each responsible for a specific aspect:
//!
//! - `synchronizer`: The main entry point. Fetches and merges the wallet resources, paginates
//!   transactions and reacts to focus and token changes.
//! - `state`: The state bundle published to consumers, with its safe defaults.
//! - `status`: Per-resource load status and the merged status.
//! - `events`: Event types, handler trait and dispatcher (toasts are delivered here).
//! - `in_flight`: Coalescing of concurrent identical requests.
//! - `cancellation`: Shutdown signal checked before every state mutation.

/// Shutdown signal shared with background tasks
pub mod cancellation;
/// Event system for decoupled notification during sync
pub mod events;
/// Coalescing of concurrent identical requests
pub mod in_flight;
/// Client-visible wallet state
pub mod state;
/// Per-resource load status
pub mod status;
/// Main coordinator for wallet synchronization
pub mod synchronizer;

pub use events::{EventRecorder, LoggingEventHandler, WalletEvent, WalletEventHandler};
pub use state::{GENERIC_ERROR_MESSAGE, NetworkErrorDetail, WalletState};
pub use status::{Resource, ResourceStatus, ResourceStatuses};
pub use synchronizer::*;
