//! Note cache records and the storage capability that persists them.
//!
//! The cache only accelerates sync. A missing record means "nothing incorporated yet",
//! and dropping every record then re-syncing must reproduce the same balance.

/// Memory and file backed stores
pub mod repositories;

pub use repositories::{FileCacheStore, MemoryCacheStore};

use crate::asset::CacheKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Encrypted outputs incorporated so far for one cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
	/// Exclusive watermark: position of the next output to fetch.
	pub offset: u64,
	/// Hex-encoded blobs in emission order.
	pub encrypted_outputs: Vec<String>,
}

impl CacheRecord {
	/// A record that has incorporated nothing past `offset`.
	pub fn starting_at(offset: u64) -> Self {
		Self {
			offset,
			encrypted_outputs: Vec::new(),
		}
	}

	/// Appends a page and advances the watermark by its length.
	///
	/// Leaves the record untouched when the watermark would pass `u64::MAX`.
	pub fn append(&mut self, outputs: Vec<String>) -> Result<(), StorageError> {
		let offset = self
			.offset
			.checked_add(outputs.len() as u64)
			.ok_or(StorageError::OffsetOverflow {
				offset: self.offset,
				received: outputs.len(),
			})?;
		self.offset = offset;
		self.encrypted_outputs.extend(outputs);
		Ok(())
	}
}

#[allow(clippy::enum_variant_names)]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	SerializationError(#[from] serde_json::Error),

	#[error("Corrupt cache entry for {key}: {reason}")]
	CorruptError { key: String, reason: String },

	/// The stored offset moved since the caller loaded it.
	#[error("Cache entry for {key} is at offset {found:?}, expected {expected:?}")]
	ConflictError {
		key: String,
		expected: Option<u64>,
		found: Option<u64>,
	},

	#[error("Offset {offset} cannot advance by {received} outputs")]
	OffsetOverflow { offset: u64, received: usize },
}

/// Persistent storage for cache records.
///
/// `commit` must write offset and outputs as one unit: a reader never observes one
/// updated without the other. It is also a compare-and-set on the offset: the write
/// only happens when the stored offset still equals `expected` (`None` for a key with
/// no record), otherwise it fails with [`StorageError::ConflictError`] and stores nothing.
#[async_trait]
pub trait CacheStore: Send + Sync {
	async fn load(&self, key: &CacheKey) -> Result<Option<CacheRecord>, StorageError>;

	async fn commit(
		&self,
		key: &CacheKey,
		expected: Option<u64>,
		record: &CacheRecord,
	) -> Result<(), StorageError>;

	async fn remove(&self, key: &CacheKey) -> Result<(), StorageError>;
}
