//! Explicit session injection for the wallet synchronizer.
//!
//! The session (signed-in user and access token) is owned by the caller and handed to the
//! synchronizer as a `SessionHandle`. Changes are published over a `tokio::sync::watch` channel so
//! the synchronizer can react to sign-in, sign-out and token rotation.

use tokio::sync::watch;
use tracing::info;

/// A signed-in user with a live access token.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
	pub user_id: String,
	pub access_token: String,
}

impl Session {
	pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
		Self {
			user_id: user_id.into(),
			access_token: access_token.into(),
		}
	}
}

impl std::fmt::Debug for Session {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session")
			.field("user_id", &self.user_id)
			.field("access_token", &"<redacted>")
			.finish()
	}
}

/// Shared, observable session slot.
#[derive(Clone)]
pub struct SessionHandle {
	tx: watch::Sender<Option<Session>>,
}

impl SessionHandle {
	/// Create a handle with no active session.
	pub fn new() -> Self {
		let (tx, _rx) = watch::channel(None);
		Self { tx }
	}

	/// Create a handle that starts signed in.
	pub fn with_session(session: Session) -> Self {
		let (tx, _rx) = watch::channel(Some(session));
		Self { tx }
	}

	/// Current session, if any.
	pub fn current(&self) -> Option<Session> {
		self.tx.borrow().clone()
	}

	pub fn is_active(&self) -> bool {
		self.tx.borrow().is_some()
	}

	pub fn set(&self, session: Session) {
		info!("Session set for user {}", session.user_id);
		self.tx.send_replace(Some(session));
	}

	pub fn clear(&self) {
		info!("Session cleared");
		self.tx.send_replace(None);
	}

	/// Replace the access token of the active session. No-op when signed out.
	pub fn rotate_token(&self, access_token: impl Into<String>) {
		let access_token = access_token.into();
		self.tx.send_if_modified(|slot| match slot {
			Some(session) if session.access_token != access_token => {
				session.access_token = access_token;
				true
			}
			_ => false,
		});
	}

	/// Subscribe to session changes.
	pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
		self.tx.subscribe()
	}
}

impl Default for SessionHandle {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rotate_token_requires_session() {
		let handle = SessionHandle::new();
		handle.rotate_token("t2");
		assert!(handle.current().is_none());

		handle.set(Session::new("u1", "t1"));
		handle.rotate_token("t2");
		assert_eq!(handle.current().map(|s| s.access_token), Some("t2".to_string()));
	}

	#[tokio::test]
	async fn test_same_token_does_not_notify() {
		let handle = SessionHandle::with_session(Session::new("u1", "t1"));
		let mut rx = handle.subscribe();
		rx.borrow_and_update();

		handle.rotate_token("t1");
		assert!(!rx.has_changed().expect("sender alive"));

		handle.rotate_token("t2");
		assert!(rx.has_changed().expect("sender alive"));
	}

	#[test]
	fn test_debug_redacts_token() {
		let rendered = format!("{:?}", Session::new("u1", "secret-token"));
		assert!(!rendered.contains("secret-token"));
	}
}
