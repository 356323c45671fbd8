use crate::api::ApiError;

/// Error types for the wallet synchronizer
#[derive(Debug, thiserror::Error)]
pub enum WalletSyncError {
	#[error("API error: {0}")]
	Api(#[from] ApiError),

	/// A focus or token-rotation triggered fetch hit a network failure.
	#[error("Network unavailable: {0}")]
	NetworkUnavailable(String),

	#[error("Storage error: {0}")]
	Storage(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Synchronizer has been shut down")]
	Cancelled,
}
