use clap::{Parser, Subcommand};
use shielded_state_sync::PrivacyClient;
use shielded_state_sync::asset::AssetDescriptor;
use shielded_state_sync::cache::FileCacheStore;
use shielded_state_sync::error::PrivacyError;
use shielded_state_sync::identity::OwnerKey;
use shielded_state_sync::utils::format_token_amount;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
	name = "shielded-sync",
	version = env!("CARGO_PKG_VERSION"),
	about = "Sync and inspect the local encrypted note cache of a shielded pool account"
)]
struct Cli {
	/// Owner secret key, base58 or a JSON byte array
	#[arg(long, env = "SHIELDED_SECRET_KEY", hide_env_values = true)]
	secret_key: String,

	/// Ledger RPC endpoint
	#[arg(long, env = "SHIELDED_RPC_URL", default_value = "https://api.mainnet-beta.solana.com")]
	rpc_url: String,

	/// Relayer base URL
	#[arg(long, env = "SHIELDED_RELAYER_URL")]
	relayer_url: String,

	/// Directory holding one JSON cache file per account
	#[arg(long, env = "SHIELDED_CACHE_DIR", default_value = ".shielded-cache")]
	cache_dir: PathBuf,

	/// Outputs requested per relayer call
	#[arg(long, default_value_t = 10_000)]
	page_size: u64,

	/// Seconds to keep retrying a failing relayer request
	#[arg(long, default_value_t = 10)]
	max_retry_secs: u64,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Fetch new encrypted outputs into the cache
	Sync {
		/// `native`, a registered symbol (USDC, USDT) or a mint address
		#[arg(default_value = "native")]
		asset: AssetDescriptor,
	},
	/// Sync, then list the notes that decrypt under this key
	Notes {
		#[arg(default_value = "native")]
		asset: AssetDescriptor,
	},
	/// Remove cached outputs for the native asset and registered tokens
	ClearCache,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	let cli = Cli::parse();
	match run(cli).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("{}", e);
			ExitCode::FAILURE
		}
	}
}

async fn run(cli: Cli) -> Result<(), PrivacyError> {
	let client = PrivacyClient::builder()
		.with_owner_key(OwnerKey::EncodedKeyString(cli.secret_key))
		.with_ledger_endpoint(cli.rpc_url)
		.with_relayer_url(cli.relayer_url)
		.with_max_retry_elapsed(Duration::from_secs(cli.max_retry_secs))
		.with_cache_store(Arc::new(FileCacheStore::new(cli.cache_dir)))
		.with_page_size(cli.page_size)
		.build()?;

	info!("Using account {}", client.public_key());

	let cancel = CancellationToken::new();
	let ctrl_c = {
		let cancel = cancel.clone();
		tokio::spawn(async move {
			if tokio::signal::ctrl_c().await.is_ok() {
				warn!("Interrupted; stopping after the last committed page");
				cancel.cancel();
			}
		})
	};

	let result = match cli.command {
		Command::Sync { asset } => sync(&client, &asset, &cancel).await,
		Command::Notes { asset } => notes(&client, &asset, &cancel).await,
		Command::ClearCache => client.clear_cache().await,
	};

	ctrl_c.abort();
	client.shutdown().await;
	result
}

async fn sync(
	client: &PrivacyClient,
	asset: &AssetDescriptor,
	cancel: &CancellationToken,
) -> Result<(), PrivacyError> {
	let outcome = client.sync(asset, Some(cancel)).await?;
	info!(
		"{} {} outputs cached, {} new, offset {}{}",
		outcome.record.encrypted_outputs.len(),
		asset.symbol(),
		outcome.new_outputs,
		outcome.record.offset,
		if outcome.cancelled { " (interrupted)" } else { "" }
	);
	Ok(())
}

async fn notes(
	client: &PrivacyClient,
	asset: &AssetDescriptor,
	cancel: &CancellationToken,
) -> Result<(), PrivacyError> {
	sync(client, asset, cancel).await?;

	let notes = client.notes(asset).await?;
	let total = notes
		.iter()
		.fold(0u64, |sum, note| sum.saturating_add(note.amount));
	for note in &notes {
		println!(
			"#{:<8} {} {}",
			note.index,
			format_token_amount(note.amount, asset.decimals()),
			asset.symbol()
		);
	}
	info!(
		"{} notes decrypted, {} {} before spent-state check",
		notes.len(),
		format_token_amount(total, asset.decimals()),
		asset.symbol()
	);
	Ok(())
}
