//! Secure key/value storage for device-held flags.
//!
//! `SecureStore` is the seam; `FileSecureStore` keeps a JSON document on disk and
//! `MemorySecureStore` backs tests. `PinFlagRepository` reads and writes the `HAS_PIN` flag.

use crate::wallet::WalletSyncError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

/// Key under which the "wallet has a PIN" flag is stored.
pub const HAS_PIN_KEY: &str = "HAS_PIN";

/// Device key/value store for small secrets and flags
#[async_trait::async_trait]
pub trait SecureStore: Send + Sync {
	async fn get(&self, key: &str) -> Result<Option<String>, WalletSyncError>;
	async fn set(&self, key: &str, value: &str) -> Result<(), WalletSyncError>;
	async fn delete(&self, key: &str) -> Result<(), WalletSyncError>;
}

/// On-disk layout of `FileSecureStore`
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
	entries: HashMap<String, String>,
	updated_at: Option<String>,
}

/// File-based implementation of SecureStore
///
/// All keys live in a single JSON document under `data_dir`. Writes are serialized through an
/// async mutex so concurrent `set` calls cannot interleave a read-modify-write.
pub struct FileSecureStore {
	data_dir: PathBuf,
	write_lock: AsyncMutex<()>,
}

impl FileSecureStore {
	pub fn new(data_dir: PathBuf) -> Self {
		Self {
			data_dir,
			write_lock: AsyncMutex::new(()),
		}
	}

	fn get_store_filename(&self) -> PathBuf {
		self.data_dir.join("secure_store.json")
	}

	async fn read_document(&self) -> Result<StoreDocument, WalletSyncError> {
		let filename = self.get_store_filename();
		if !filename.exists() {
			return Ok(StoreDocument::default());
		}

		let content = tokio::fs::read_to_string(&filename).await.map_err(|e| {
			WalletSyncError::Storage(format!("Failed to read secure store file: {}", e))
		})?;
		serde_json::from_str(&content).map_err(|e| {
			WalletSyncError::Storage(format!("Failed to parse secure store file: {}", e))
		})
	}

	async fn write_document(&self, mut document: StoreDocument) -> Result<(), WalletSyncError> {
		tokio::fs::create_dir_all(&self.data_dir).await?;

		document.updated_at = Some(chrono::Utc::now().to_rfc3339());
		let content = serde_json::to_string_pretty(&document)?;

		let filename = self.get_store_filename();
		tokio::fs::write(&filename, content).await.map_err(|e| {
			WalletSyncError::Storage(format!("Failed to write secure store file: {}", e))
		})?;

		debug!("Saved secure store to {:?}", filename);
		Ok(())
	}
}

#[async_trait::async_trait]
impl SecureStore for FileSecureStore {
	async fn get(&self, key: &str) -> Result<Option<String>, WalletSyncError> {
		let document = self.read_document().await?;
		Ok(document.entries.get(key).cloned())
	}

	async fn set(&self, key: &str, value: &str) -> Result<(), WalletSyncError> {
		let _guard = self.write_lock.lock().await;
		let mut document = self.read_document().await?;
		document.entries.insert(key.to_string(), value.to_string());
		self.write_document(document).await
	}

	async fn delete(&self, key: &str) -> Result<(), WalletSyncError> {
		let _guard = self.write_lock.lock().await;
		let mut document = self.read_document().await?;
		if document.entries.remove(key).is_some() {
			self.write_document(document).await?;
			info!("Removed {} from secure store", key);
		}
		Ok(())
	}
}

/// In-memory SecureStore, for tests and ephemeral sessions
#[derive(Clone, Default)]
pub struct MemorySecureStore {
	entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySecureStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, WalletSyncError> {
		self.entries
			.lock()
			.map_err(|_| WalletSyncError::Storage("Memory store lock poisoned".to_string()))
	}
}

#[async_trait::async_trait]
impl SecureStore for MemorySecureStore {
	async fn get(&self, key: &str) -> Result<Option<String>, WalletSyncError> {
		Ok(self.lock()?.get(key).cloned())
	}

	async fn set(&self, key: &str, value: &str) -> Result<(), WalletSyncError> {
		self.lock()?.insert(key.to_string(), value.to_string());
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), WalletSyncError> {
		self.lock()?.remove(key);
		Ok(())
	}
}

/// Reads and writes the `HAS_PIN` flag.
#[derive(Clone)]
pub struct PinFlagRepository {
	store: Arc<dyn SecureStore>,
}

impl PinFlagRepository {
	pub fn new(store: Arc<dyn SecureStore>) -> Self {
		Self { store }
	}

	/// Stored flag, `None` if never written or unreadable as a boolean.
	pub async fn load(&self) -> Result<Option<bool>, WalletSyncError> {
		let value = self.store.get(HAS_PIN_KEY).await?;
		Ok(value.and_then(|v| v.parse::<bool>().ok()))
	}

	pub async fn save(&self, has_pin: bool) -> Result<(), WalletSyncError> {
		self.store
			.set(HAS_PIN_KEY, if has_pin { "true" } else { "false" })
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_file_store_round_trip_and_delete() {
		let dir = tempfile::tempdir().expect("Failed to create temp dir");
		let store = FileSecureStore::new(dir.path().join("nested"));

		assert_eq!(store.get(HAS_PIN_KEY).await.expect("get"), None);

		store.set(HAS_PIN_KEY, "true").await.expect("set");
		store.set("OTHER", "x").await.expect("set");
		assert_eq!(
			store.get(HAS_PIN_KEY).await.expect("get"),
			Some("true".to_string())
		);

		// A fresh instance sees the persisted document.
		let reopened = FileSecureStore::new(dir.path().join("nested"));
		assert_eq!(
			reopened.get("OTHER").await.expect("get"),
			Some("x".to_string())
		);

		reopened.delete(HAS_PIN_KEY).await.expect("delete");
		assert_eq!(store.get(HAS_PIN_KEY).await.expect("get"), None);
		assert_eq!(store.get("OTHER").await.expect("get"), Some("x".to_string()));
	}

	#[tokio::test]
	async fn test_file_store_rejects_corrupt_document() {
		let dir = tempfile::tempdir().expect("Failed to create temp dir");
		std::fs::write(dir.path().join("secure_store.json"), "{not json").expect("write");

		let store = FileSecureStore::new(dir.path().to_path_buf());
		assert!(matches!(
			store.get(HAS_PIN_KEY).await,
			Err(WalletSyncError::Storage(_))
		));
	}

	#[tokio::test]
	async fn test_pin_flag_repository() {
		let store = Arc::new(MemorySecureStore::new());
		let repo = PinFlagRepository::new(store.clone());

		assert_eq!(repo.load().await.expect("load"), None);

		repo.save(true).await.expect("save");
		assert_eq!(
			store.get(HAS_PIN_KEY).await.expect("get"),
			Some("true".to_string())
		);
		assert_eq!(repo.load().await.expect("load"), Some(true));

		repo.save(false).await.expect("save");
		assert_eq!(repo.load().await.expect("load"), Some(false));

		store.set(HAS_PIN_KEY, "maybe").await.expect("set");
		assert_eq!(repo.load().await.expect("load"), None);
	}
}
