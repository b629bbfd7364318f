//! Single-flight operation orchestrator.
//!
//! One deposit or withdraw runs at a time per orchestrator. The running permit is a
//! `try_lock` on an async mutex, so a second caller fails fast instead of queueing.
//! A [`RunningGuard`] publishes the current phase and, when dropped on any exit path,
//! publishes `Idle` before it releases the permit.

use crate::asset::{AssetDescriptor, Pubkey};
use crate::cache::CacheRecord;
use crate::crypto::NoteCipher;
use crate::error::PrivacyError;
use crate::identity::Identity;
use crate::operations::status::OperationStatus;
use crate::transaction::{
	DepositRequest, Engine, LedgerConnection, LocalKeypairSigner, OperationContext,
	OperationOutcome, SigningStrategy, TransactionSigner, WithdrawRequest,
};
use crate::utils::{format_token_amount, until_cancelled};
use crate::wallet::NoteSynchronizer;

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Holds the running permit for the duration of one operation.
pub struct RunningGuard<'a> {
	_permit: MutexGuard<'a, ()>,
	status: &'a watch::Sender<OperationStatus>,
	log_phases: bool,
}

impl RunningGuard<'_> {
	pub fn set_phase(&self, phase: impl Into<String>) {
		let phase = phase.into();
		if self.log_phases {
			info!("{}", phase);
		} else {
			debug!("{}", phase);
		}
		self.status.send_replace(OperationStatus::Running { phase });
	}
}

impl Drop for RunningGuard<'_> {
	fn drop(&mut self) {
		self.status.send_replace(OperationStatus::Idle);
	}
}

pub struct OperationOrchestrator {
	identity: Arc<Identity>,
	synchronizer: Arc<NoteSynchronizer>,
	engine: Option<Arc<dyn Engine>>,
	cipher: Arc<dyn NoteCipher>,
	ledger: Arc<dyn LedgerConnection>,
	permit: Mutex<()>,
	status: watch::Sender<OperationStatus>,
	log_phases: bool,
}

impl OperationOrchestrator {
	pub fn new(
		identity: Arc<Identity>,
		synchronizer: Arc<NoteSynchronizer>,
		engine: Option<Arc<dyn Engine>>,
		cipher: Arc<dyn NoteCipher>,
		ledger: Arc<dyn LedgerConnection>,
		log_phases: bool,
	) -> Self {
		Self {
			identity,
			synchronizer,
			engine,
			cipher,
			ledger,
			permit: Mutex::new(()),
			status: watch::Sender::new(OperationStatus::Idle),
			log_phases,
		}
	}

	pub fn subscribe(&self) -> watch::Receiver<OperationStatus> {
		self.status.subscribe()
	}

	pub fn status(&self) -> OperationStatus {
		self.status.borrow().clone()
	}

	/// Take the running permit, or fail if another operation holds it.
	pub fn begin(&self) -> Result<RunningGuard<'_>, PrivacyError> {
		let permit = self.permit.try_lock().map_err(|_| {
			warn!("Rejected operation: another operation is in progress");
			PrivacyError::OperationInProgress
		})?;
		Ok(RunningGuard {
			_permit: permit,
			status: &self.status,
			log_phases: self.log_phases,
		})
	}

	fn engine(&self) -> Result<&Arc<dyn Engine>, PrivacyError> {
		self.engine.as_ref().ok_or(PrivacyError::MissingEngine)
	}

	async fn sync_for_operation(
		&self,
		guard: &RunningGuard<'_>,
		asset: &AssetDescriptor,
		cancel: Option<&CancellationToken>,
	) -> Result<CacheRecord, PrivacyError> {
		guard.set_phase(format!("Syncing {} notes", asset.symbol()));
		let outcome = self
			.synchronizer
			.sync(self.identity.public_key(), asset, cancel)
			.await?;
		if outcome.cancelled {
			return Err(PrivacyError::Cancelled);
		}
		Ok(outcome.record)
	}

	fn context<'a>(&'a self, asset: &'a AssetDescriptor, record: &'a CacheRecord) -> OperationContext<'a> {
		OperationContext {
			owner: self.identity.public_key(),
			asset,
			record,
			ledger: self.ledger.as_ref(),
			cipher: self.cipher.as_ref(),
		}
	}

	/// Shield `amount` base units of `asset`.
	pub async fn deposit(
		&self,
		asset: &AssetDescriptor,
		amount: u64,
		signer: Option<Arc<dyn TransactionSigner>>,
		cancel: Option<&CancellationToken>,
	) -> Result<OperationOutcome, PrivacyError> {
		if amount == 0 {
			return Err(PrivacyError::InvalidAmount("deposit amount must be positive".to_string()));
		}
		let engine = self.engine()?;
		let strategy = SigningStrategy::resolve(signer, self.identity.signing_key())?;

		let guard = self.begin()?;
		let record = self.sync_for_operation(&guard, asset, cancel).await?;

		guard.set_phase(format!(
			"Depositing {} {}",
			format_token_amount(amount, asset.decimals()),
			asset.symbol()
		));
		let request = DepositRequest {
			context: self.context(asset, &record),
			amount,
			signer: strategy.as_signer(),
		};
		let outcome = until_cancelled(cancel, engine.deposit(request))
			.await
			.ok_or(PrivacyError::Cancelled)??;

		info!(
			"Deposited {} {} (fee {})",
			format_token_amount(outcome.amount, asset.decimals()),
			asset.symbol(),
			format_token_amount(outcome.fee, asset.decimals())
		);
		Ok(outcome)
	}

	/// Unshield `amount` base units of `asset` to `recipient`, the owner when `None`.
	pub async fn withdraw(
		&self,
		asset: &AssetDescriptor,
		amount: u64,
		recipient: Option<Pubkey>,
		referrer: Option<Pubkey>,
		cancel: Option<&CancellationToken>,
	) -> Result<OperationOutcome, PrivacyError> {
		if amount == 0 {
			return Err(PrivacyError::InvalidAmount("withdraw amount must be positive".to_string()));
		}
		let engine = self.engine()?;
		let recipient = recipient.unwrap_or(*self.identity.public_key());
		let local = self.identity.signing_key().cloned().map(LocalKeypairSigner::new);

		let guard = self.begin()?;
		let record = self.sync_for_operation(&guard, asset, cancel).await?;

		guard.set_phase(format!(
			"Withdrawing {} {} to {}",
			format_token_amount(amount, asset.decimals()),
			asset.symbol(),
			recipient
		));
		let request = WithdrawRequest {
			context: self.context(asset, &record),
			amount,
			recipient: &recipient,
			referrer: referrer.as_ref(),
			signer: local.as_ref().map(|signer| signer as &dyn TransactionSigner),
		};
		let outcome = until_cancelled(cancel, engine.withdraw(request))
			.await
			.ok_or(PrivacyError::Cancelled)??;

		info!(
			"Withdrew {} {} (fee {})",
			format_token_amount(outcome.amount, asset.decimals()),
			asset.symbol(),
			format_token_amount(outcome.fee, asset.decimals())
		);
		Ok(outcome)
	}
}
