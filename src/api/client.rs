//!
//! HTTP client for the Fundlock wallet REST API.
//!
//! This module provides an async client for the three wallet read endpoints (wallet details,
//! paginated transactions and weekly insights). All methods are async and designed for use with
//! Tokio. The `WalletApi` trait is the seam the wallet synchronizer depends on, so alternative
//! transports can be plugged in.

use super::types::*;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

pub const WALLET_DETAILS_PATH: &str = "/api/v1/fundlock/wallet-details";
pub const TRANSACTIONS_PATH: &str = "/api/v1/fundlock/transactions";
pub const WEEKLY_TRANSACTIONS_PATH: &str = "/api/v1/fundlock/weekly-transactions";

/// Remote reads the wallet synchronizer consumes.
#[async_trait]
pub trait WalletApi: Send + Sync {
	/// Fetch the wallet summary for the session owner.
	async fn wallet_details(&self, access_token: &str) -> Result<WalletSummary, ApiError>;

	/// Fetch a transaction page. `None` asks the backend for its first page.
	async fn transactions(
		&self,
		access_token: &str,
		page: Option<u32>,
	) -> Result<TransactionPage, ApiError>;

	/// Fetch this week's spent/received totals.
	async fn weekly_insights(&self, access_token: &str) -> Result<WeeklyInsights, ApiError>;
}

/// Fundlock REST API client
#[derive(Clone)]
pub struct FundlockApiClient {
	/// The underlying HTTP client.
	http_client: Client,
	/// The base URL of the Fundlock backend.
	base_url: Url,
}

impl FundlockApiClient {
	/// Create a new API client.
	///
	/// # Arguments
	/// * `base_url` - The backend origin, e.g. `https://api.fundlock.app`.
	/// * `timeout` - Request timeout applied to every call.
	///
	/// # Returns
	/// A new `FundlockApiClient`, or an `ApiError` if the URL or HTTP client is invalid.
	pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
		let base_url =
			Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;

		let http_client = Client::builder().timeout(timeout).build()?;

		Ok(Self {
			http_client,
			base_url,
		})
	}

	fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
		self.base_url
			.join(path)
			.map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))
	}

	/// Execute an authenticated GET and decode the (optionally enveloped) JSON body.
	///
	/// # Errors
	/// * `ApiError::Transport` if no response was received.
	/// * `ApiError::Status` if the server answered with a non-success status. The server's
	///   message is kept for logging.
	/// * `ApiError::Decode` if the body does not match `T`.
	/// * `ApiError::Unauthenticated` if `access_token` is blank. Nothing is sent.
	async fn get_json<T: DeserializeOwned>(
		&self,
		path: &str,
		access_token: &str,
		query: &[(&str, String)],
	) -> Result<T, ApiError> {
		if access_token.trim().is_empty() {
			return Err(ApiError::Unauthenticated);
		}
		let url = self.endpoint(path)?;
		debug!("GET {}", url);

		let mut request = self.http_client.get(url).bearer_auth(access_token);
		if !query.is_empty() {
			request = request.query(query);
		}

		let response = request.send().await?;
		let status = response.status();
		let body = response.text().await?;

		if !status.is_success() {
			let message = serde_json::from_str::<serde_json::Value>(&body)
				.ok()
				.and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
				.unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());
			warn!("{} failed with HTTP {}: {}", path, status.as_u16(), message);
			return Err(ApiError::Status {
				status: status.as_u16(),
				message,
			});
		}

		let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
		if let Some(message) = envelope.message() {
			debug!("{} responded: {}", path, message);
		}
		Ok(envelope.into_data())
	}
}

#[async_trait]
impl WalletApi for FundlockApiClient {
	async fn wallet_details(&self, access_token: &str) -> Result<WalletSummary, ApiError> {
		self.get_json(WALLET_DETAILS_PATH, access_token, &[]).await
	}

	async fn transactions(
		&self,
		access_token: &str,
		page: Option<u32>,
	) -> Result<TransactionPage, ApiError> {
		let query: Vec<(&str, String)> = page.map(|p| ("page", p.to_string())).into_iter().collect();
		self.get_json(TRANSACTIONS_PATH, access_token, &query).await
	}

	async fn weekly_insights(&self, access_token: &str) -> Result<WeeklyInsights, ApiError> {
		self.get_json(WEEKLY_TRANSACTIONS_PATH, access_token, &[])
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tokio::io::{AsyncReadExt, AsyncWriteExt};
	use tokio::net::TcpListener;
	use tokio::task::JoinHandle;

	/// Serve exactly one HTTP response and hand back the raw request head.
	async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
		let listener = TcpListener::bind("127.0.0.1:0")
			.await
			.expect("Failed to bind test listener");
		let addr = listener.local_addr().expect("Listener has no address");

		let handle = tokio::spawn(async move {
			let (mut socket, _) = listener.accept().await.expect("Failed to accept");
			let mut buf = vec![0u8; 8192];
			let mut read = 0;
			loop {
				let n = socket.read(&mut buf[read..]).await.expect("Failed to read");
				read += n;
				if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
					break;
				}
			}
			let response = format!(
				"HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
				status_line,
				body.len(),
				body
			);
			socket
				.write_all(response.as_bytes())
				.await
				.expect("Failed to write");
			socket.shutdown().await.ok();
			String::from_utf8_lossy(&buf[..read]).to_string()
		});

		(format!("http://{}", addr), handle)
	}

	fn client(base_url: &str) -> FundlockApiClient {
		FundlockApiClient::new(base_url, Duration::from_secs(5)).expect("Failed to build client")
	}

	#[tokio::test]
	async fn test_wallet_details_sends_bearer_token() {
		let (url, server) = serve_once(
			"200 OK",
			r#"{"balance":"1000.00","totalLockedAmount":"200.00","totalRedeemedAmount":"0.00","walletNumber":"9012345678","hasPin":true}"#,
		)
		.await;

		let summary = client(&url)
			.wallet_details("token-abc")
			.await
			.expect("wallet details should succeed");
		assert_eq!(summary.balance, "1000.00");
		assert!(summary.has_pin);

		let request = server.await.expect("server task panicked");
		assert!(request.starts_with("GET /api/v1/fundlock/wallet-details "));
		assert!(request.to_ascii_lowercase().contains("authorization: bearer token-abc"));
	}

	#[tokio::test]
	async fn test_transactions_page_query() {
		let (url, server) = serve_once(
			"200 OK",
			r#"{"status":"success","data":{"currentPage":2,"totalPages":3,"totalItems":41,"transactions":[]}}"#,
		)
		.await;

		let page = client(&url)
			.transactions("t", Some(2))
			.await
			.expect("transactions should succeed");
		assert_eq!(page.current_page, 2);
		assert!(page.has_next());

		let request = server.await.expect("server task panicked");
		assert!(request.starts_with("GET /api/v1/fundlock/transactions?page=2 "));
	}

	#[tokio::test]
	async fn test_first_page_omits_query() {
		let (url, server) = serve_once(
			"200 OK",
			r#"{"currentPage":1,"totalPages":1,"totalItems":0,"transactions":[]}"#,
		)
		.await;

		client(&url)
			.transactions("t", None)
			.await
			.expect("transactions should succeed");

		let request = server.await.expect("server task panicked");
		assert!(request.starts_with("GET /api/v1/fundlock/transactions "));
	}

	#[tokio::test]
	async fn test_server_failure_is_generic_error() {
		let (url, server) = serve_once(
			"500 Internal Server Error",
			r#"{"message":"ledger unavailable"}"#,
		)
		.await;

		let err = client(&url)
			.weekly_insights("t")
			.await
			.expect_err("500 should fail");
		server.await.expect("server task panicked");

		match &err {
			ApiError::Status { status, message } => {
				assert_eq!(*status, 500);
				assert_eq!(message, "ledger unavailable");
			}
			other => panic!("unexpected error: {other:?}"),
		}
		assert!(!err.is_network_error());
	}

	#[tokio::test]
	async fn test_connection_refused_is_network_error() {
		// Bind then drop to get a port nothing listens on.
		let listener = TcpListener::bind("127.0.0.1:0")
			.await
			.expect("Failed to bind test listener");
		let addr = listener.local_addr().expect("Listener has no address");
		drop(listener);

		let err = client(&format!("http://{}", addr))
			.wallet_details("t")
			.await
			.expect_err("closed port should fail");
		assert!(matches!(err, ApiError::Transport(_)));
		assert!(err.is_network_error());
		assert_eq!(err.status_code(), 0);
	}

	#[tokio::test]
	async fn test_blank_token_is_rejected_before_sending() {
		// Nothing listens here; a sent request would fail as a transport error.
		let listener = TcpListener::bind("127.0.0.1:0")
			.await
			.expect("Failed to bind test listener");
		let addr = listener.local_addr().expect("Listener has no address");
		drop(listener);

		let err = client(&format!("http://{}", addr))
			.transactions("  ", None)
			.await
			.expect_err("blank token should fail");
		assert!(matches!(err, ApiError::Unauthenticated));
		assert!(!err.is_network_error());
	}

	#[test]
	fn test_invalid_base_url() {
		let result = FundlockApiClient::new("not a url", Duration::from_secs(1));
		assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
	}
}
