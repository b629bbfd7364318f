//! Transaction signing capability.
//!
//! Callers pick exactly one signer per operation: an external one they pass in (a
//! hardware or browser wallet bridge), or the local key pair the identity holds.

use crate::asset::Pubkey;

use async_trait::async_trait;
use ed25519_dalek::{SIGNATURE_LENGTH, Signer, SigningKey};
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
	#[error("no signer available: supply an external signer or a local key pair")]
	MissingSigner,

	#[error("signer rejected the transaction: {0}")]
	Rejected(String),
}

/// Serialized transaction message awaiting signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
	pub message: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
	pub message: Vec<u8>,
	pub signatures: Vec<(Pubkey, [u8; SIGNATURE_LENGTH])>,
}

impl SignedTransaction {
	/// Base58 of the first signature, which the ledger uses as the transaction id.
	pub fn id(&self) -> Option<String> {
		self.signatures
			.first()
			.map(|(_, signature)| bs58::encode(signature).into_string())
	}
}

/// Produces a signed transaction from an unsigned one.
///
/// Implementations keep no mutable shared state, so independent transactions may be
/// signed concurrently.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
	fn public_key(&self) -> Pubkey;

	async fn sign(&self, transaction: UnsignedTransaction) -> Result<SignedTransaction, SignerError>;
}

/// Signs with a key pair held in process.
#[derive(Clone)]
pub struct LocalKeypairSigner {
	key: SigningKey,
}

impl LocalKeypairSigner {
	pub fn new(key: SigningKey) -> Self {
		Self { key }
	}
}

#[async_trait]
impl TransactionSigner for LocalKeypairSigner {
	fn public_key(&self) -> Pubkey {
		Pubkey(self.key.verifying_key().to_bytes())
	}

	async fn sign(&self, transaction: UnsignedTransaction) -> Result<SignedTransaction, SignerError> {
		let signature = self.key.sign(&transaction.message).to_bytes();
		Ok(SignedTransaction {
			signatures: vec![(self.public_key(), signature)],
			message: transaction.message,
		})
	}
}

type SignFn =
	dyn Fn(UnsignedTransaction) -> BoxFuture<'static, Result<SignedTransaction, SignerError>> + Send + Sync;

/// Delegates signing to a caller-supplied async function.
pub struct ExternalSigner {
	public_key: Pubkey,
	sign_fn: Box<SignFn>,
}

impl ExternalSigner {
	pub fn new<F, Fut>(public_key: Pubkey, sign_fn: F) -> Self
	where
		F: Fn(UnsignedTransaction) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<SignedTransaction, SignerError>> + Send + 'static,
	{
		Self {
			public_key,
			sign_fn: Box::new(move |transaction| sign_fn(transaction).boxed()),
		}
	}
}

#[async_trait]
impl TransactionSigner for ExternalSigner {
	fn public_key(&self) -> Pubkey {
		self.public_key
	}

	async fn sign(&self, transaction: UnsignedTransaction) -> Result<SignedTransaction, SignerError> {
		(self.sign_fn)(transaction).await
	}
}

/// The signer selected for one operation.
pub enum SigningStrategy {
	Local(LocalKeypairSigner),
	External(Arc<dyn TransactionSigner>),
}

impl SigningStrategy {
	/// An explicitly supplied external signer wins over the local key.
	pub fn resolve(
		external: Option<Arc<dyn TransactionSigner>>,
		local: Option<&SigningKey>,
	) -> Result<Self, SignerError> {
		match (external, local) {
			(Some(signer), _) => Ok(SigningStrategy::External(signer)),
			(None, Some(key)) => Ok(SigningStrategy::Local(LocalKeypairSigner::new(key.clone()))),
			(None, None) => Err(SignerError::MissingSigner),
		}
	}

	pub fn as_signer(&self) -> &dyn TransactionSigner {
		match self {
			SigningStrategy::Local(signer) => signer as &dyn TransactionSigner,
			SigningStrategy::External(signer) => signer.as_ref(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ed25519_dalek::{Signature, Verifier};

	fn key() -> SigningKey {
		SigningKey::from_bytes(&[21u8; 32])
	}

	#[tokio::test]
	async fn test_local_signer_produces_valid_signature() {
		let signer = LocalKeypairSigner::new(key());
		let signed = signer
			.sign(UnsignedTransaction {
				message: b"transfer".to_vec(),
			})
			.await
			.unwrap();

		let (public_key, signature) = signed.signatures[0];
		assert_eq!(public_key, signer.public_key());
		key()
			.verifying_key()
			.verify(b"transfer", &Signature::from_bytes(&signature))
			.unwrap();
		assert!(signed.id().is_some());
	}

	#[tokio::test]
	async fn test_external_signer_delegates() {
		let public_key = Pubkey([5u8; 32]);
		let signer = ExternalSigner::new(public_key, move |transaction: UnsignedTransaction| async move {
			Ok(SignedTransaction {
				message: transaction.message,
				signatures: vec![(public_key, [9u8; SIGNATURE_LENGTH])],
			})
		});

		let signed = signer
			.sign(UnsignedTransaction { message: vec![1, 2] })
			.await
			.unwrap();
		assert_eq!(signed.message, vec![1, 2]);
		assert_eq!(signed.signatures[0].1, [9u8; SIGNATURE_LENGTH]);
	}

	#[tokio::test]
	async fn test_external_signer_rejection_propagates() {
		let signer = ExternalSigner::new(Pubkey([5u8; 32]), |_| async {
			Err(SignerError::Rejected("user declined".to_string()))
		});
		assert_eq!(
			signer.sign(UnsignedTransaction { message: vec![] }).await,
			Err(SignerError::Rejected("user declined".to_string()))
		);
	}

	#[test]
	fn test_resolution_order() {
		let external: Arc<dyn TransactionSigner> = Arc::new(LocalKeypairSigner::new(
			SigningKey::from_bytes(&[22u8; 32]),
		));
		let local = key();

		let picked = SigningStrategy::resolve(Some(external.clone()), Some(&local)).unwrap();
		assert_eq!(picked.as_signer().public_key(), external.public_key());

		let picked = SigningStrategy::resolve(None, Some(&local)).unwrap();
		assert!(matches!(picked, SigningStrategy::Local(_)));

		assert!(matches!(
			SigningStrategy::resolve(None, None),
			Err(SignerError::MissingSigner)
		));
	}
}
