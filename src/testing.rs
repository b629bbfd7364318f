//! In-process fakes for the relayer and the engine.

use crate::asset::{AssetDescriptor, Pubkey};
use crate::crypto::{Note, NoteCipher};
use crate::relayer::{NotePage, NoteSource, RelayerError};
use crate::transaction::{
	DepositRequest, Engine, EngineError, OperationOutcome, SpentIndex, UnsignedTransaction,
	WithdrawRequest,
};

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Note source serving a scripted per-asset output stream.
#[derive(Default)]
pub struct ScriptedNoteSource {
	outputs: Mutex<HashMap<AssetDescriptor, Vec<String>>>,
	calls: AtomicUsize,
	fail_on: Mutex<HashSet<usize>>,
	hang_on: Mutex<HashSet<usize>>,
	gates: Mutex<HashMap<usize, Arc<Notify>>>,
	always_more: AtomicBool,
	called: Notify,
}

impl ScriptedNoteSource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append one output; returns its emission position.
	pub fn push(&self, asset: &AssetDescriptor, blob: String) -> u64 {
		let mut outputs = self.outputs.lock().unwrap();
		let stream = outputs.entry(*asset).or_default();
		stream.push(blob);
		(stream.len() - 1) as u64
	}

	pub fn push_many(&self, asset: &AssetDescriptor, blobs: &[&str]) {
		for blob in blobs {
			self.push(asset, blob.to_string());
		}
	}

	/// Fail the `n`th fetch (1-based) with a transport error.
	pub fn fail_on_call(&self, n: usize) {
		self.fail_on.lock().unwrap().insert(n);
	}

	/// Never complete the `n`th fetch (1-based).
	pub fn hang_on_call(&self, n: usize) {
		self.hang_on.lock().unwrap().insert(n);
	}

	/// Hold the `n`th fetch (1-based) until the returned gate is notified.
	pub fn gate_on_call(&self, n: usize) -> Arc<Notify> {
		let gate = Arc::new(Notify::new());
		self.gates.lock().unwrap().insert(n, gate.clone());
		gate
	}

	pub fn len(&self, asset: &AssetDescriptor) -> u64 {
		self.outputs.lock().unwrap().get(asset).map_or(0, |stream| stream.len() as u64)
	}

	pub fn set_always_more(&self, more: bool) {
		self.always_more.store(more, Ordering::SeqCst);
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub async fn wait_for_calls(&self, n: usize) {
		loop {
			let notified = self.called.notified();
			if self.calls() >= n {
				return;
			}
			notified.await;
		}
	}
}

#[async_trait]
impl NoteSource for ScriptedNoteSource {
	async fn fetch_range(
		&self,
		asset: &AssetDescriptor,
		start: u64,
		end: u64,
	) -> Result<NotePage, RelayerError> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
		self.called.notify_waiters();

		if self.fail_on.lock().unwrap().contains(&call) {
			return Err(RelayerError::TransportError("connection reset".to_string()));
		}
		if self.hang_on.lock().unwrap().contains(&call) {
			std::future::pending::<()>().await;
		}
		let gate = self.gates.lock().unwrap().get(&call).cloned();
		if let Some(gate) = gate {
			gate.notified().await;
		}

		let outputs = self.outputs.lock().unwrap();
		let stream = outputs.get(asset).map(Vec::as_slice).unwrap_or_default();
		let len = stream.len() as u64;
		let from = start.min(len) as usize;
		let to = end.min(len) as usize;

		Ok(NotePage {
			encrypted_outputs: stream[from..to].to_vec(),
			has_more: end < len || self.always_more.load(Ordering::SeqCst),
			total: Some(len),
		})
	}
}

/// Engine that "settles" deposits and withdrawals by emitting encrypted notes into a
/// [`ScriptedNoteSource`] and tracking spent leaves in memory.
pub struct FakeEngine {
	source: Arc<ScriptedNoteSource>,
	fee: u64,
	spent: Mutex<HashSet<(AssetDescriptor, u64)>>,
	failure: Mutex<Option<String>>,
	gate: Mutex<Option<Arc<Notify>>>,
	entered: Notify,
	has_entered: AtomicBool,
	last_recipient: Mutex<Option<Pubkey>>,
}

impl FakeEngine {
	pub const FEE: u64 = 5_000;

	pub fn new(source: Arc<ScriptedNoteSource>) -> Self {
		Self {
			source,
			fee: Self::FEE,
			spent: Mutex::new(HashSet::new()),
			failure: Mutex::new(None),
			gate: Mutex::new(None),
			entered: Notify::new(),
			has_entered: AtomicBool::new(false),
			last_recipient: Mutex::new(None),
		}
	}

	pub fn fee(&self) -> u64 {
		self.fee
	}

	pub fn fail_with(&self, message: &str) {
		*self.failure.lock().unwrap() = Some(message.to_string());
	}

	/// Block deposits and withdrawals until the returned gate is notified.
	pub fn hold(&self) -> Arc<Notify> {
		let gate = Arc::new(Notify::new());
		*self.gate.lock().unwrap() = Some(gate.clone());
		gate
	}

	pub async fn wait_until_entered(&self) {
		loop {
			let notified = self.entered.notified();
			if self.has_entered.load(Ordering::SeqCst) {
				return;
			}
			notified.await;
		}
	}

	pub fn last_recipient(&self) -> Option<Pubkey> {
		*self.last_recipient.lock().unwrap()
	}

	async fn enter(&self) -> Result<(), EngineError> {
		self.has_entered.store(true, Ordering::SeqCst);
		self.entered.notify_waiters();

		let gate = self.gate.lock().unwrap().clone();
		if let Some(gate) = gate {
			gate.notified().await;
		}

		match self.failure.lock().unwrap().clone() {
			Some(message) => Err(EngineError::msg(message)),
			None => Ok(()),
		}
	}

	fn emit(&self, cipher: &dyn NoteCipher, asset: &AssetDescriptor, amount: u64) -> Result<(), EngineError> {
		let index = self.source.len(asset);
		let blob = cipher
			.encrypt(&Note {
				amount,
				blinding: index.to_string(),
				index,
				asset: *asset,
			})
			.map_err(EngineError::new)?;
		self.source.push(asset, hex::encode(blob));
		Ok(())
	}
}

#[async_trait]
impl SpentIndex for FakeEngine {
	async fn spent_flags(&self, _owner: &Pubkey, notes: &[Note]) -> Result<Vec<bool>, EngineError> {
		let spent = self.spent.lock().unwrap();
		Ok(notes
			.iter()
			.map(|note| spent.contains(&(note.asset, note.index)))
			.collect())
	}
}

#[async_trait]
impl Engine for FakeEngine {
	async fn deposit(&self, request: DepositRequest<'_>) -> Result<OperationOutcome, EngineError> {
		self.enter().await?;

		let signed = request
			.signer
			.sign(UnsignedTransaction {
				message: format!("deposit:{}:{}", request.context.asset, request.amount).into_bytes(),
			})
			.await
			.map_err(EngineError::new)?;

		let credited = request.amount.saturating_sub(self.fee);
		self.emit(request.context.cipher, request.context.asset, credited)?;

		Ok(OperationOutcome {
			amount: request.amount,
			fee: self.fee,
			signature: signed.id(),
		})
	}

	async fn withdraw(&self, request: WithdrawRequest<'_>) -> Result<OperationOutcome, EngineError> {
		self.enter().await?;
		let context = &request.context;

		let notes: Vec<Note> = context
			.record
			.encrypted_outputs
			.iter()
			.filter_map(|blob| context.cipher.decrypt_hex(blob).ok())
			.filter(|note| note.asset == *context.asset && note.amount > 0)
			.collect();

		let needed = request.amount + self.fee;
		let mut selected = Vec::new();
		let mut total = 0u64;
		{
			let spent = self.spent.lock().unwrap();
			for note in notes {
				if total >= needed {
					break;
				}
				if !spent.contains(&(note.asset, note.index)) {
					total += note.amount;
					selected.push(note);
				}
			}
		}
		if total < needed {
			return Err(EngineError::msg("insufficient shielded balance"));
		}

		let signature = match request.signer {
			Some(signer) => signer
				.sign(UnsignedTransaction {
					message: format!("withdraw:{}:{}", context.asset, request.amount).into_bytes(),
				})
				.await
				.map_err(EngineError::new)?
				.id(),
			None => None,
		};

		{
			let mut spent = self.spent.lock().unwrap();
			for note in &selected {
				spent.insert((note.asset, note.index));
			}
		}
		let change = total - needed;
		if change > 0 {
			self.emit(context.cipher, context.asset, change)?;
		}
		*self.last_recipient.lock().unwrap() = Some(*request.recipient);

		Ok(OperationOutcome {
			amount: request.amount,
			fee: self.fee,
			signature,
		})
	}
}
