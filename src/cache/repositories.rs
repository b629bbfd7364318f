use crate::asset::CacheKey;
use crate::cache::{CacheRecord, CacheStore, StorageError};

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// One named entry of the key-value cache layout.
#[derive(Debug, Clone)]
enum StoredEntry {
	Offset(u64),
	Outputs(Vec<String>),
}

/// In-memory store using the `fetch_offset…` / `encrypted_outputs…` entry layout.
///
/// Both entries of a record are written under a single write guard.
#[derive(Default)]
pub struct MemoryCacheStore {
	entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryCacheStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Names of all entries currently held, sorted.
	pub async fn entry_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.entries.read().await.keys().cloned().collect();
		names.sort();
		names
	}
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
	async fn load(&self, key: &CacheKey) -> Result<Option<CacheRecord>, StorageError> {
		let entries = self.entries.read().await;
		let offset = entries.get(&key.offset_entry()).cloned();
		let outputs = entries.get(&key.outputs_entry()).cloned();

		match (offset, outputs) {
			(None, None) => Ok(None),
			(Some(StoredEntry::Offset(offset)), Some(StoredEntry::Outputs(encrypted_outputs))) => {
				Ok(Some(CacheRecord {
					offset,
					encrypted_outputs,
				}))
			}
			_ => Err(StorageError::CorruptError {
				key: key.to_string(),
				reason: "offset and outputs entries are inconsistent".to_string(),
			}),
		}
	}

	async fn commit(
		&self,
		key: &CacheKey,
		expected: Option<u64>,
		record: &CacheRecord,
	) -> Result<(), StorageError> {
		let mut entries = self.entries.write().await;
		let found = match entries.get(&key.offset_entry()) {
			Some(StoredEntry::Offset(offset)) => Some(*offset),
			_ => None,
		};
		if found != expected {
			return Err(StorageError::ConflictError {
				key: key.to_string(),
				expected,
				found,
			});
		}

		entries.insert(key.offset_entry(), StoredEntry::Offset(record.offset));
		entries.insert(
			key.outputs_entry(),
			StoredEntry::Outputs(record.encrypted_outputs.clone()),
		);
		Ok(())
	}

	async fn remove(&self, key: &CacheKey) -> Result<(), StorageError> {
		let mut entries = self.entries.write().await;
		entries.remove(&key.offset_entry());
		entries.remove(&key.outputs_entry());
		Ok(())
	}
}

/// File-based store: one JSON document per cache key.
///
/// Writes go to a temporary file that is renamed over the record, so a crash leaves
/// either the old or the new record and never a mix. Commits through one store are
/// serialized so the offset check and the rename happen as one step.
pub struct FileCacheStore {
	data_dir: PathBuf,
	commit_lock: Mutex<()>,
}

impl FileCacheStore {
	pub fn new(data_dir: PathBuf) -> Self {
		Self {
			data_dir,
			commit_lock: Mutex::new(()),
		}
	}

	fn get_record_filename(&self, key: &CacheKey) -> PathBuf {
		self.data_dir.join(format!("{}.json", key.address()))
	}

	fn get_temp_filename(&self, key: &CacheKey) -> PathBuf {
		self.data_dir.join(format!("{}.json.tmp", key.address()))
	}
}

#[async_trait]
impl CacheStore for FileCacheStore {
	async fn load(&self, key: &CacheKey) -> Result<Option<CacheRecord>, StorageError> {
		let filename = self.get_record_filename(key);
		let content = match tokio::fs::read_to_string(&filename).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(e.into()),
		};

		let document: serde_json::Value = serde_json::from_str(&content)?;
		let corrupt = |reason: &str| StorageError::CorruptError {
			key: key.to_string(),
			reason: reason.to_string(),
		};

		let offset = document
			.get(key.offset_entry())
			.and_then(|o| o.as_u64())
			.ok_or_else(|| corrupt("missing offset entry"))?;
		let encrypted_outputs: Vec<String> = document
			.get(key.outputs_entry())
			.cloned()
			.map(serde_json::from_value::<Vec<String>>)
			.transpose()?
			.ok_or_else(|| corrupt("missing outputs entry"))?;

		debug!(
			"Loaded cache record {:?} at offset {} ({} outputs)",
			filename,
			offset,
			encrypted_outputs.len()
		);
		Ok(Some(CacheRecord {
			offset,
			encrypted_outputs,
		}))
	}

	async fn commit(
		&self,
		key: &CacheKey,
		expected: Option<u64>,
		record: &CacheRecord,
	) -> Result<(), StorageError> {
		let _commit = self.commit_lock.lock().await;
		let found = self.load(key).await?.map(|stored| stored.offset);
		if found != expected {
			return Err(StorageError::ConflictError {
				key: key.to_string(),
				expected,
				found,
			});
		}

		tokio::fs::create_dir_all(&self.data_dir).await?;

		let mut document = serde_json::Map::new();
		document.insert(key.offset_entry(), record.offset.into());
		document.insert(
			key.outputs_entry(),
			serde_json::to_value(&record.encrypted_outputs)?,
		);
		document.insert(
			"updated_at".to_string(),
			chrono::Utc::now().to_rfc3339().into(),
		);
		let content = serde_json::to_string(&serde_json::Value::Object(document))?;

		let temp = self.get_temp_filename(key);
		let filename = self.get_record_filename(key);
		tokio::fs::write(&temp, content).await?;
		tokio::fs::rename(&temp, &filename).await?;

		debug!(
			"Saved cache record {:?} at offset {}",
			filename, record.offset
		);
		Ok(())
	}

	async fn remove(&self, key: &CacheKey) -> Result<(), StorageError> {
		let _commit = self.commit_lock.lock().await;
		let filename = self.get_record_filename(key);
		match tokio::fs::remove_file(&filename).await {
			Ok(()) => {
				info!("Removed cache record {:?}", filename);
				Ok(())
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::asset::{AssetDescriptor, Pubkey};

	fn key() -> CacheKey {
		CacheKey::for_asset(&Pubkey([8u8; 32]), &AssetDescriptor::Native).unwrap()
	}

	fn record() -> CacheRecord {
		CacheRecord {
			offset: 3,
			encrypted_outputs: vec!["01".into(), "02".into(), "03".into()],
		}
	}

	#[tokio::test]
	async fn test_memory_store_uses_two_entries() {
		let store = MemoryCacheStore::new();
		assert_eq!(store.load(&key()).await.unwrap(), None);

		store.commit(&key(), None, &record()).await.unwrap();
		assert_eq!(store.load(&key()).await.unwrap(), Some(record()));

		let mut expected = vec![key().offset_entry(), key().outputs_entry()];
		expected.sort();
		assert_eq!(store.entry_names().await, expected);

		store.remove(&key()).await.unwrap();
		assert!(store.entry_names().await.is_empty());
	}

	#[tokio::test]
	async fn test_file_store_round_trip() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileCacheStore::new(dir.path().join("cache"));

		assert_eq!(store.load(&key()).await.unwrap(), None);
		store.commit(&key(), None, &record()).await.unwrap();
		assert_eq!(store.load(&key()).await.unwrap(), Some(record()));

		let raw = std::fs::read_to_string(store.get_record_filename(&key())).unwrap();
		assert!(raw.contains(&key().offset_entry()));
		assert!(raw.contains(&key().outputs_entry()));
		assert!(!store.get_temp_filename(&key()).exists());

		store.remove(&key()).await.unwrap();
		assert_eq!(store.load(&key()).await.unwrap(), None);
		store.remove(&key()).await.unwrap();
	}

	#[tokio::test]
	async fn test_file_store_reports_corrupt_record() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileCacheStore::new(dir.path().to_path_buf());
		std::fs::write(store.get_record_filename(&key()), r#"{"unrelated": 1}"#).unwrap();

		assert!(matches!(
			store.load(&key()).await,
			Err(StorageError::CorruptError { .. })
		));
	}

	async fn assert_commit_checks_offset(store: &dyn CacheStore) {
		store.commit(&key(), None, &record()).await.unwrap();

		let stale = CacheRecord {
			offset: 1,
			encrypted_outputs: vec!["01".into()],
		};
		assert!(matches!(
			store.commit(&key(), None, &stale).await,
			Err(StorageError::ConflictError {
				expected: None,
				found: Some(3),
				..
			})
		));
		assert!(matches!(
			store.commit(&key(), Some(0), &stale).await,
			Err(StorageError::ConflictError { .. })
		));
		assert_eq!(store.load(&key()).await.unwrap(), Some(record()));

		let mut next = record();
		next.append(vec!["04".into()]).unwrap();
		store.commit(&key(), Some(3), &next).await.unwrap();
		assert_eq!(store.load(&key()).await.unwrap(), Some(next));
	}

	#[tokio::test]
	async fn test_memory_store_commit_checks_offset() {
		assert_commit_checks_offset(&MemoryCacheStore::new()).await;
	}

	#[tokio::test]
	async fn test_file_store_commit_checks_offset() {
		let dir = tempfile::tempdir().unwrap();
		assert_commit_checks_offset(&FileCacheStore::new(dir.path().to_path_buf())).await;
	}
}
