use crate::asset::AddressError;
use crate::cache::StorageError;
use crate::identity::IdentityError;
use crate::relayer::RelayerError;
use crate::transaction::{EngineError, SignerError};
use crate::wallet::WalletSyncError;

/// Errors returned by the client's public operations.
#[allow(clippy::enum_variant_names)]
#[derive(Debug, thiserror::Error)]
pub enum PrivacyError {
	#[error("No credential supplied: provide a key pair or a public key and signature")]
	MissingCredential,

	#[error("Invalid credential: {0}")]
	InvalidCredential(String),

	#[error("Missing connection: {0}")]
	MissingConnection(&'static str),

	#[error("No engine configured for deposit, withdraw or balance")]
	MissingEngine,

	#[error("No signer available: supply an external signer or a local key pair")]
	MissingSigner,

	#[error("Retryable sync error: {0}")]
	RetryableSyncError(#[from] RelayerError),

	#[error("Cache storage error: {0}")]
	StorageError(#[from] StorageError),

	#[error("Address error: {0}")]
	AddressError(#[from] AddressError),

	#[error("{0}")]
	EngineError(#[from] EngineError),

	#[error("Signer error: {0}")]
	SignerError(#[source] SignerError),

	#[error("Another operation is already in progress")]
	OperationInProgress,

	#[error("Invalid amount: {0}")]
	InvalidAmount(String),

	#[error("Operation cancelled")]
	Cancelled,

	#[error("Relayer configuration error: {0}")]
	RelayerConfig(String),
}

impl From<IdentityError> for PrivacyError {
	fn from(error: IdentityError) -> Self {
		match error {
			IdentityError::MissingCredential => PrivacyError::MissingCredential,
			IdentityError::InvalidCredential(reason) => PrivacyError::InvalidCredential(reason),
		}
	}
}

impl From<WalletSyncError> for PrivacyError {
	fn from(error: WalletSyncError) -> Self {
		match error {
			WalletSyncError::RetryableSyncError(e) => PrivacyError::RetryableSyncError(e),
			WalletSyncError::StorageError(e) => PrivacyError::StorageError(e),
			WalletSyncError::AddressError(e) => PrivacyError::AddressError(e),
		}
	}
}

impl From<SignerError> for PrivacyError {
	fn from(error: SignerError) -> Self {
		match error {
			SignerError::MissingSigner => PrivacyError::MissingSigner,
			other => PrivacyError::SignerError(other),
		}
	}
}
