use fundlock_wallet_sync::api::FundlockApiClient;
use fundlock_wallet_sync::config::ClientConfig;
use fundlock_wallet_sync::utils::format_amount;
use fundlock_wallet_sync::wallet::sync::{LoggingEventHandler, LoadMoreOutcome};
use fundlock_wallet_sync::wallet::{FileSecureStore, Session, SessionHandle, WalletSynchronizer};

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

const CURRENCY_SYMBOL: &str = "₦";

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.init();

	info!("Starting wallet sync client");

	let config = ClientConfig::parse();

	let api_client = match FundlockApiClient::new(&config.base_url, config.request_timeout()) {
		Ok(client) => client,
		Err(e) => {
			error!("Failed to create API client: {}", e);
			return;
		}
	};

	info!("Created API client for {}", config.base_url);

	let session = SessionHandle::with_session(Session::new(config.user_id, config.access_token));
	let store = Arc::new(FileSecureStore::new(config.data_dir));
	let synchronizer = WalletSynchronizer::new(Arc::new(api_client), session, store);
	synchronizer.register_handler(Arc::new(LoggingEventHandler));
	synchronizer.start().await;

	if let Err(e) = synchronizer.on_focus().await {
		error!("Wallet fetch failed: {}", e);
		warn!("Retrying once");
		synchronizer.retry_fetch().await;
	}

	loop {
		match synchronizer.load_more().await {
			LoadMoreOutcome::Appended { page, count } => {
				info!("Loaded page {} ({} transactions)", page, count)
			}
			LoadMoreOutcome::NoMorePages => break,
			other => {
				warn!("Stopped paging: {:?}", other);
				break;
			}
		}
	}

	let state = synchronizer.snapshot();
	info!("Wallet {} status: {:?}", state.wallet_number, state.status());
	info!(
		"Balance: {} (locked {}, redeemed {})",
		format_amount(&state.balance, CURRENCY_SYMBOL),
		format_amount(&state.total_locked_amount, CURRENCY_SYMBOL),
		format_amount(&state.total_redeemed_amount, CURRENCY_SYMBOL),
	);
	info!(
		"This week: spent {}, received {}",
		format_amount(&state.insights.spent_this_week, CURRENCY_SYMBOL),
		format_amount(&state.insights.received_this_week, CURRENCY_SYMBOL),
	);
	info!(
		"Loaded {} of {} transactions across {} pages",
		state.transactions.len(),
		state.total_items,
		state.current_page
	);
	for tx in state.transactions.iter().take(10) {
		info!(
			"  {} {:?} {:>12.2} {}",
			tx.created_at,
			tx.type_,
			tx.signed_amount(),
			tx.recipient_name.as_deref().unwrap_or(&tx.reference)
		);
	}
	if state.network_error {
		warn!("No connection; data may be incomplete");
	}

	synchronizer.shutdown();
}
