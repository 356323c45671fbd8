//! Runtime configuration for the wallet client.
//!
//! Every option can be given as a `--flag` or through its `FUNDLOCK_*` environment variable.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.fundlock.app";

/// Connection, session and storage settings
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "fundlock-wallet-sync", about = "Fundlock wallet sync client")]
pub struct ClientConfig {
	/// Backend origin the API paths are joined onto.
	#[arg(long, env = "FUNDLOCK_API_URL", default_value = DEFAULT_API_URL)]
	pub base_url: String,

	/// Timeout applied to every HTTP request, in seconds.
	#[arg(
		long = "http-timeout-secs",
		env = "FUNDLOCK_HTTP_TIMEOUT_SECS",
		default_value_t = 30,
		value_parser = clap::value_parser!(u64).range(1..)
	)]
	pub http_timeout_secs: u64,

	/// Directory holding the secure store document.
	#[arg(long, env = "FUNDLOCK_DATA_DIR", default_value = ".fundlock")]
	pub data_dir: PathBuf,

	/// Signed-in user.
	#[arg(long, env = "FUNDLOCK_USER_ID")]
	pub user_id: String,

	/// Bearer token for the signed-in user.
	#[arg(long, env = "FUNDLOCK_ACCESS_TOKEN", hide_env_values = true)]
	pub access_token: String,
}

impl ClientConfig {
	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.http_timeout_secs)
	}
}
