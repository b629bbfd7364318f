//! Contract of the external proof and transaction engine.
//!
//! The engine builds proofs, computes nullifiers, assembles and submits transactions.
//! The orchestrator hands it synchronized state and a signer; whatever it returns,
//! success or failure, is passed back to the caller unchanged.

use super::{LedgerConnection, TransactionSigner};
use crate::asset::{AssetDescriptor, Pubkey};
use crate::cache::CacheRecord;
use crate::crypto::{Note, NoteCipher};

use async_trait::async_trait;
use serde::Serialize;
use std::error::Error;
use std::fmt;

/// Opaque engine failure. Displays as the underlying error.
#[derive(Debug)]
pub struct EngineError(Box<dyn Error + Send + Sync>);

impl EngineError {
	pub fn new(source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
		Self(source.into())
	}

	pub fn msg(message: impl Into<String>) -> Self {
		Self(message.into().into())
	}

	pub fn into_inner(self) -> Box<dyn Error + Send + Sync> {
		self.0
	}
}

impl fmt::Display for EngineError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0, f)
	}
}

impl Error for EngineError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		self.0.source()
	}
}

/// What the engine reports for a completed deposit or withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationOutcome {
	/// Amount moved, in the asset's base unit.
	pub amount: u64,
	/// Protocol fee charged, in the asset's base unit.
	pub fee: u64,
	/// Ledger transaction id, when the engine submitted one.
	pub signature: Option<String>,
}

/// State shared by every engine request.
pub struct OperationContext<'a> {
	pub owner: &'a Pubkey,
	pub asset: &'a AssetDescriptor,
	/// Freshly synchronized cache for `asset`.
	pub record: &'a CacheRecord,
	pub ledger: &'a dyn LedgerConnection,
	pub cipher: &'a dyn NoteCipher,
}

pub struct DepositRequest<'a> {
	pub context: OperationContext<'a>,
	pub amount: u64,
	pub signer: &'a dyn TransactionSigner,
}

pub struct WithdrawRequest<'a> {
	pub context: OperationContext<'a>,
	pub amount: u64,
	pub recipient: &'a Pubkey,
	pub referrer: Option<&'a Pubkey>,
	/// Local signer when one is held; relayed withdrawals need none.
	pub signer: Option<&'a dyn TransactionSigner>,
}

/// Spent-state lookup for decrypted notes.
#[async_trait]
pub trait SpentIndex: Send + Sync {
	/// One flag per note, in input order: `true` when the note's nullifier is on chain.
	async fn spent_flags(&self, owner: &Pubkey, notes: &[Note]) -> Result<Vec<bool>, EngineError>;
}

#[async_trait]
pub trait Engine: SpentIndex {
	async fn deposit(&self, request: DepositRequest<'_>) -> Result<OperationOutcome, EngineError>;

	async fn withdraw(&self, request: WithdrawRequest<'_>) -> Result<OperationOutcome, EngineError>;
}
