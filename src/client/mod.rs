//! Client facade over identity, note sync, balance and the operation orchestrator.

/// Builder and configuration validation
mod builder;

pub use builder::PrivacyClientBuilder;

use crate::asset::{AssetDescriptor, Pubkey, registered_assets};
use crate::crypto::Note;
use crate::error::PrivacyError;
use crate::identity::Identity;
use crate::operations::{OperationOrchestrator, OperationStatus, StatusReporter};
use crate::transaction::{Engine, OperationOutcome, TransactionSigner};
use crate::utils::{format_token_amount, until_cancelled};
use crate::wallet::{BalanceAggregator, NoteSynchronizer, SyncOutcome};

use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct PrivacyClient {
	identity: Arc<Identity>,
	synchronizer: Arc<NoteSynchronizer>,
	aggregator: BalanceAggregator,
	orchestrator: Arc<OperationOrchestrator>,
	engine: Option<Arc<dyn Engine>>,
	reporter: Option<StatusReporter>,
}

impl PrivacyClient {
	pub fn builder() -> PrivacyClientBuilder {
		PrivacyClientBuilder::new()
	}

	pub fn public_key(&self) -> &Pubkey {
		self.identity.public_key()
	}

	/// Shield `amount` base units of `asset`. Uses `signer` when given, else the held key.
	pub async fn deposit(
		&self,
		asset: &AssetDescriptor,
		amount: u64,
		signer: Option<Arc<dyn TransactionSigner>>,
		cancel: Option<&CancellationToken>,
	) -> Result<OperationOutcome, PrivacyError> {
		self.orchestrator.deposit(asset, amount, signer, cancel).await
	}

	/// Unshield `amount` base units of `asset` to `recipient`, or to the owner.
	pub async fn withdraw(
		&self,
		asset: &AssetDescriptor,
		amount: u64,
		recipient: Option<Pubkey>,
		referrer: Option<Pubkey>,
		cancel: Option<&CancellationToken>,
	) -> Result<OperationOutcome, PrivacyError> {
		self.orchestrator
			.withdraw(asset, amount, recipient, referrer, cancel)
			.await
	}

	/// Spendable shielded balance of `asset` in base units, after syncing the cache.
	pub async fn balance(
		&self,
		asset: &AssetDescriptor,
		cancel: Option<&CancellationToken>,
	) -> Result<u64, PrivacyError> {
		let engine = self.engine.as_ref().ok_or(PrivacyError::MissingEngine)?;

		let outcome = self.sync(asset, cancel).await?;
		if outcome.cancelled {
			return Err(PrivacyError::Cancelled);
		}

		let aggregate = self
			.aggregator
			.aggregate(self.public_key(), &outcome.record, asset, engine.as_ref());
		let balance = until_cancelled(cancel, aggregate)
			.await
			.ok_or(PrivacyError::Cancelled)??;

		info!(
			"Shielded {} balance: {}",
			asset.symbol(),
			format_token_amount(balance, asset.decimals())
		);
		Ok(balance)
	}

	/// Bring the cache for `asset` up to date without touching the engine.
	pub async fn sync(
		&self,
		asset: &AssetDescriptor,
		cancel: Option<&CancellationToken>,
	) -> Result<SyncOutcome, PrivacyError> {
		Ok(self.synchronizer.sync(self.public_key(), asset, cancel).await?)
	}

	/// Notes of `asset` decodable from the cache as it stands.
	pub async fn notes(&self, asset: &AssetDescriptor) -> Result<Vec<Note>, PrivacyError> {
		let record = self.synchronizer.load_record(self.public_key(), asset).await?;
		Ok(self.aggregator.decrypt_notes(&record, asset))
	}

	/// Drop cached notes for the native asset and every registered token.
	///
	/// Records of mints outside the registry are left in place.
	pub async fn clear_cache(&self) -> Result<(), PrivacyError> {
		self.synchronizer
			.clear(self.public_key(), &registered_assets())
			.await?;
		info!("Cleared note cache for {}", self.public_key());
		Ok(())
	}

	pub fn status(&self) -> OperationStatus {
		self.orchestrator.status()
	}

	pub fn subscribe(&self) -> watch::Receiver<OperationStatus> {
		self.orchestrator.subscribe()
	}

	/// Stop the status reporter, if one is running.
	pub async fn shutdown(mut self) {
		if let Some(reporter) = self.reporter.take() {
			reporter.stop().await;
		}
	}
}
