pub mod session;
pub mod storage;
pub mod sync;
pub mod types;

pub use session::{Session, SessionHandle};
pub use storage::{FileSecureStore, HAS_PIN_KEY, MemorySecureStore, PinFlagRepository, SecureStore};
pub use sync::{FetchOutcome, LoadMoreOutcome, WalletState, WalletSynchronizer};
pub use types::*;
