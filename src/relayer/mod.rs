//! Relayer integration module
//!
//! The relayer indexes every encrypted output the shielded pool emits and serves them
//! by position range. The synchronizer only depends on the [`NoteSource`] trait; the
//! HTTP client is the bundled implementation.

/// HTTP client for the note-range endpoint
mod client;
/// Wire types and errors
mod types;

pub use client::RelayerClient;
pub use types::*;

use crate::asset::AssetDescriptor;
use async_trait::async_trait;

/// Ledger-query capability: encrypted outputs by emission position.
#[async_trait]
pub trait NoteSource: Send + Sync {
	/// Outputs at positions `start..end` for `asset`, in emission order.
	async fn fetch_range(
		&self,
		asset: &AssetDescriptor,
		start: u64,
		end: u64,
	) -> Result<NotePage, RelayerError>;
}
