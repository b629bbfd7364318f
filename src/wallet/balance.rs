use crate::asset::{AssetDescriptor, Pubkey};
use crate::cache::CacheRecord;
use crate::crypto::{Note, NoteCipher};
use crate::transaction::{EngineError, SpentIndex};

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Decrypts cached outputs and sums what is still spendable.
pub struct BalanceAggregator {
	cipher: Arc<dyn NoteCipher>,
}

impl BalanceAggregator {
	pub fn new(cipher: Arc<dyn NoteCipher>) -> Self {
		Self { cipher }
	}

	/// Notes in `record` that decrypt under our key and belong to `asset`.
	///
	/// Blobs addressed to other owners fail to decrypt and are skipped. A note that
	/// appears twice (same leaf index) is kept once. Zero-amount notes are dropped.
	pub fn decrypt_notes(&self, record: &CacheRecord, asset: &AssetDescriptor) -> Vec<Note> {
		let mut seen = HashSet::new();
		let mut notes = Vec::new();

		for (position, blob) in record.encrypted_outputs.iter().enumerate() {
			let note = match self.cipher.decrypt_hex(blob) {
				Ok(note) => note,
				Err(e) => {
					debug!("Note decode skipped at position {}: {}", position, e);
					continue;
				}
			};

			if note.asset != *asset || note.amount == 0 {
				continue;
			}
			if seen.insert(note.index) {
				notes.push(note);
			}
		}

		notes
	}

	/// Sum of unspent note amounts for `asset`, checked in one batch against `spent`.
	pub async fn aggregate<S: SpentIndex + ?Sized>(
		&self,
		owner: &Pubkey,
		record: &CacheRecord,
		asset: &AssetDescriptor,
		spent: &S,
	) -> Result<u64, EngineError> {
		let notes = self.decrypt_notes(record, asset);
		if notes.is_empty() {
			return Ok(0);
		}

		let flags = spent.spent_flags(owner, &notes).await?;
		if flags.len() != notes.len() {
			return Err(EngineError::msg(format!(
				"spent-state lookup returned {} flags for {} notes",
				flags.len(),
				notes.len()
			)));
		}

		let total = notes
			.iter()
			.zip(flags)
			.filter(|(_, is_spent)| !is_spent)
			.fold(0u64, |sum, (note, _)| sum.saturating_add(note.amount));

		debug!(
			"Aggregated {} {} notes for {}: {} base units",
			notes.len(),
			asset.symbol(),
			owner,
			total
		);
		Ok(total)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::AesGcmNoteCipher;
	use crate::identity::EncryptionKey;
	use async_trait::async_trait;
	use std::sync::Mutex;

	struct FixedSpent {
		spent: HashSet<u64>,
		calls: Mutex<usize>,
	}

	impl FixedSpent {
		fn new(spent: &[u64]) -> Self {
			Self {
				spent: spent.iter().copied().collect(),
				calls: Mutex::new(0),
			}
		}
	}

	#[async_trait]
	impl SpentIndex for FixedSpent {
		async fn spent_flags(&self, _owner: &Pubkey, notes: &[Note]) -> Result<Vec<bool>, EngineError> {
			*self.calls.lock().unwrap() += 1;
			Ok(notes.iter().map(|note| self.spent.contains(&note.index)).collect())
		}
	}

	struct FailingSpent;

	#[async_trait]
	impl SpentIndex for FailingSpent {
		async fn spent_flags(&self, _owner: &Pubkey, _notes: &[Note]) -> Result<Vec<bool>, EngineError> {
			Err(EngineError::msg("rpc unavailable"))
		}
	}

	fn cipher(seed: u8) -> AesGcmNoteCipher {
		AesGcmNoteCipher::new(&EncryptionKey::derive_from_signature(&[seed; 64]))
	}

	fn blob(cipher: &AesGcmNoteCipher, amount: u64, index: u64, asset: AssetDescriptor) -> String {
		let note = Note {
			amount,
			blinding: format!("{index}"),
			index,
			asset,
		};
		hex::encode(cipher.encrypt(&note).unwrap())
	}

	#[tokio::test]
	async fn test_sums_unspent_notes_of_requested_asset() {
		let ours = cipher(1);
		let theirs = cipher(2);
		let usdc = crate::asset::KNOWN_TOKENS[0].asset().unwrap();

		let mut record = CacheRecord::starting_at(0);
		record.append(vec![
			blob(&ours, 100, 0, AssetDescriptor::Native),
			blob(&theirs, 5_000, 1, AssetDescriptor::Native),
			blob(&ours, 250, 2, AssetDescriptor::Native),
			blob(&ours, 900, 3, usdc),
			blob(&ours, 0, 4, AssetDescriptor::Native),
			"not-hex".to_string(),
			blob(&ours, 40, 5, AssetDescriptor::Native),
		])
		.unwrap();

		let aggregator = BalanceAggregator::new(Arc::new(ours));
		let spent = FixedSpent::new(&[2]);
		let owner = Pubkey([3u8; 32]);

		let native = aggregator
			.aggregate(&owner, &record, &AssetDescriptor::Native, &spent)
			.await
			.unwrap();
		assert_eq!(native, 140);
		assert_eq!(*spent.calls.lock().unwrap(), 1);

		let tokens = aggregator.aggregate(&owner, &record, &usdc, &spent).await.unwrap();
		assert_eq!(tokens, 900);
	}

	#[tokio::test]
	async fn test_duplicate_index_counted_once() {
		let ours = cipher(1);
		let mut record = CacheRecord::starting_at(0);
		record.append(vec![
			blob(&ours, 100, 7, AssetDescriptor::Native),
			blob(&ours, 100, 7, AssetDescriptor::Native),
		])
		.unwrap();

		let aggregator = BalanceAggregator::new(Arc::new(ours));
		let total = aggregator
			.aggregate(&Pubkey([3u8; 32]), &record, &AssetDescriptor::Native, &FixedSpent::new(&[]))
			.await
			.unwrap();
		assert_eq!(total, 100);
	}

	#[tokio::test]
	async fn test_empty_record_is_zero_without_lookup() {
		let aggregator = BalanceAggregator::new(Arc::new(cipher(1)));
		let total = aggregator
			.aggregate(
				&Pubkey([3u8; 32]),
				&CacheRecord::default(),
				&AssetDescriptor::Native,
				&FailingSpent,
			)
			.await
			.unwrap();
		assert_eq!(total, 0);
	}

	#[tokio::test]
	async fn test_sum_saturates() {
		let ours = cipher(1);
		let mut record = CacheRecord::starting_at(0);
		record.append(vec![
			blob(&ours, u64::MAX, 0, AssetDescriptor::Native),
			blob(&ours, 10, 1, AssetDescriptor::Native),
		])
		.unwrap();

		let aggregator = BalanceAggregator::new(Arc::new(ours));
		let total = aggregator
			.aggregate(&Pubkey([3u8; 32]), &record, &AssetDescriptor::Native, &FixedSpent::new(&[]))
			.await
			.unwrap();
		assert_eq!(total, u64::MAX);
	}

	#[tokio::test]
	async fn test_spent_lookup_failure_propagates() {
		let ours = cipher(1);
		let mut record = CacheRecord::starting_at(0);
		record
			.append(vec![blob(&ours, 10, 0, AssetDescriptor::Native)])
			.unwrap();

		let aggregator = BalanceAggregator::new(Arc::new(ours));
		let error = aggregator
			.aggregate(&Pubkey([3u8; 32]), &record, &AssetDescriptor::Native, &FailingSpent)
			.await
			.unwrap_err();
		assert_eq!(error.to_string(), "rpc unavailable");
	}
}
