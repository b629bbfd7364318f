use crate::asset::AddressError;
use crate::cache::{CacheRecord, StorageError};
use crate::relayer::RelayerError;

/// Error types for note synchronization
#[allow(clippy::enum_variant_names)]
#[derive(Debug, thiserror::Error)]
pub enum WalletSyncError {
	/// Fetching from the relayer failed. The store is left at its last committed page.
	#[error("Retryable sync error: {0}")]
	RetryableSyncError(#[from] RelayerError),

	#[error("Cache storage error: {0}")]
	StorageError(#[from] StorageError),

	#[error("Address error: {0}")]
	AddressError(#[from] AddressError),
}

/// Result of one sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
	/// The last committed record.
	pub record: CacheRecord,
	/// Outputs appended during this pass.
	pub new_outputs: usize,
	/// Whether the pass stopped on cancellation before reaching the tip.
	pub cancelled: bool,
}
