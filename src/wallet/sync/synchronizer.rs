//! Incremental note synchronizer.
//!
//! Walks the relayer's emission sequence from the stored watermark, one page at a
//! time, and commits every page to the cache store as a single write. A failed or
//! cancelled page is dropped; everything committed before it stays committed.
//!
//! Each commit names the offset the page was fetched from. When another writer on
//! the same store got there first, the page is discarded and the pass resumes from
//! the stored record.

use crate::asset::{AssetDescriptor, CacheKey, Pubkey};
use crate::cache::{CacheRecord, CacheStore, StorageError};
use crate::relayer::NoteSource;
use crate::utils::until_cancelled;
use crate::wallet::sync::progress_tracker::SyncProgressTracker;
use crate::wallet::types::{SyncOutcome, WalletSyncError};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_PAGE_SIZE: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct SyncConfig {
	/// Outputs requested per relayer call
	pub page_size: u64,
	/// Offset used for assets with no stored record
	pub starting_offsets: HashMap<AssetDescriptor, u64>,
}

impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			page_size: DEFAULT_PAGE_SIZE,
			starting_offsets: HashMap::new(),
		}
	}
}

pub struct NoteSynchronizer {
	source: Arc<dyn NoteSource>,
	store: Arc<dyn CacheStore>,
	config: SyncConfig,
	key_locks: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl NoteSynchronizer {
	pub fn new(source: Arc<dyn NoteSource>, store: Arc<dyn CacheStore>, config: SyncConfig) -> Self {
		Self {
			source,
			store,
			config: SyncConfig {
				page_size: config.page_size.max(1),
				..config
			},
			key_locks: Mutex::new(HashMap::new()),
		}
	}

	fn starting_offset(&self, asset: &AssetDescriptor) -> u64 {
		self.config.starting_offsets.get(asset).copied().unwrap_or(0)
	}

	async fn key_lock(&self, key: &CacheKey) -> Arc<Mutex<()>> {
		let mut locks = self.key_locks.lock().await;
		locks.entry(key.clone()).or_default().clone()
	}

	/// Stored record for (owner, asset), or an empty one at the configured starting offset.
	pub async fn load_record(
		&self,
		owner: &Pubkey,
		asset: &AssetDescriptor,
	) -> Result<CacheRecord, WalletSyncError> {
		let key = CacheKey::for_asset(owner, asset)?;
		self.load_or_start(&key, asset).await
	}

	async fn load_or_start(
		&self,
		key: &CacheKey,
		asset: &AssetDescriptor,
	) -> Result<CacheRecord, WalletSyncError> {
		Ok(self.load_with_stored_offset(key, asset).await?.0)
	}

	/// Record to resume from, plus the offset currently in the store (`None` when absent).
	async fn load_with_stored_offset(
		&self,
		key: &CacheKey,
		asset: &AssetDescriptor,
	) -> Result<(CacheRecord, Option<u64>), WalletSyncError> {
		let stored = self.store.load(key).await?;
		let stored_offset = stored.as_ref().map(|record| record.offset);
		let record = stored.unwrap_or_else(|| CacheRecord::starting_at(self.starting_offset(asset)));
		Ok((record, stored_offset))
	}

	/// Bring the cache for (owner, asset) up to the relayer's tip.
	pub async fn sync(
		&self,
		owner: &Pubkey,
		asset: &AssetDescriptor,
		cancel: Option<&CancellationToken>,
	) -> Result<SyncOutcome, WalletSyncError> {
		let key = CacheKey::for_asset(owner, asset)?;
		let lock = self.key_lock(&key).await;

		let Some(_guard) = until_cancelled(cancel, lock.lock()).await else {
			info!("Sync of {} cancelled while waiting for the key lock", key);
			let record = self.load_or_start(&key, asset).await?;
			return Ok(SyncOutcome {
				record,
				new_outputs: 0,
				cancelled: true,
			});
		};

		let (mut record, mut stored_offset) = self.load_with_stored_offset(&key, asset).await?;
		let mut tracker = SyncProgressTracker::new(record.offset);
		let mut cancelled = false;
		debug!("Syncing {} ({}) from offset {}", key, asset, record.offset);

		loop {
			let start = record.offset;
			let end = start.saturating_add(self.config.page_size);
			let fetch = self.source.fetch_range(asset, start, end);

			let page = match until_cancelled(cancel, fetch).await {
				Some(Ok(page)) => page,
				Some(Err(e)) => {
					warn!("Fetching outputs {}..{} for {} failed: {}", start, end, key, e);
					return Err(e.into());
				}
				None => {
					info!("Sync of {} cancelled at offset {}", key, record.offset);
					cancelled = true;
					break;
				}
			};

			let received = page.encrypted_outputs.len();
			if received == 0 {
				if page.has_more {
					debug!("Relayer reported more outputs past {} but sent none", start);
				}
				break;
			}

			let mut next = record.clone();
			next.append(page.encrypted_outputs)?;
			match self.store.commit(&key, stored_offset, &next).await {
				Ok(()) => {}
				Err(StorageError::ConflictError { found, .. }) => {
					info!(
						"Cache record for {} moved to offset {:?} by another writer; resuming from it",
						key, found
					);
					(record, stored_offset) = self.load_with_stored_offset(&key, asset).await?;
					continue;
				}
				Err(e) => return Err(e.into()),
			}
			stored_offset = Some(next.offset);
			record = next;

			tracker.record_page(received, record.offset);
			tracker.log_progress(false);

			if !page.has_more {
				break;
			}
		}

		let stats = tracker.get_stats();
		if stats.pages_committed > 0 {
			tracker.log_progress(true);
		}
		debug!("{}", stats.summary());

		Ok(SyncOutcome {
			record,
			new_outputs: stats.outputs_received,
			cancelled,
		})
	}

	/// Remove the stored records of `assets` for `owner`.
	pub async fn clear(
		&self,
		owner: &Pubkey,
		assets: &[AssetDescriptor],
	) -> Result<(), WalletSyncError> {
		for asset in assets {
			let key = CacheKey::for_asset(owner, asset)?;
			let lock = self.key_lock(&key).await;
			let _guard = lock.lock().await;
			self.store.remove(&key).await?;
			debug!("Cleared cache entries for {} ({})", key, asset);
		}
		Ok(())
	}
}
