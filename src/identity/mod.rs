//! Wallet identity and encryption key derivation.
//!
//! The note encryption key is derived from the wallet's ed25519 signature over a fixed
//! sign-in message. Signing is deterministic, so holding the secret key and holding the
//! signature produce the same key, and re-deriving always reproduces it. The key has no
//! public accessor and never leaves the process.

/// Owner credential variants
pub mod credentials;

pub use credentials::{Credentials, OwnerKey};

use crate::asset::Pubkey;
use ed25519_dalek::{SIGNATURE_LENGTH, Signer, SigningKey};
use sha3::{Digest, Keccak256};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Message every wallet signs to unlock its notes.
pub const SIGN_IN_MESSAGE: &[u8] = b"Privacy Money account sign in";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
	#[error("no credential supplied: provide key material or a signature")]
	MissingCredential,

	#[error("invalid credential: {0}")]
	InvalidCredential(String),
}

/// Symmetric key protecting the owner's notes.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
	pub fn derive_from_signature(signature: &[u8; SIGNATURE_LENGTH]) -> Self {
		Self(Keccak256::digest(signature).into())
	}

	pub(crate) fn expose(&self) -> &[u8; 32] {
		&self.0
	}
}

impl fmt::Debug for EncryptionKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("EncryptionKey(<redacted>)")
	}
}

/// The owner of the notes being synchronized.
pub struct Identity {
	public_key: Pubkey,
	signing_key: Option<SigningKey>,
	encryption_key: EncryptionKey,
}

impl Identity {
	/// Resolves an identity from whichever credential the caller supplied.
	pub fn resolve(credentials: Option<Credentials>) -> Result<Self, IdentityError> {
		match credentials.ok_or(IdentityError::MissingCredential)? {
			Credentials::Owner(owner_key) => Ok(Self::from_signing_key(owner_key.into_signing_key()?)),
			Credentials::Signature {
				public_key,
				signature,
			} => Ok(Self::from_signature(public_key, &signature)),
		}
	}

	pub fn from_signing_key(signing_key: SigningKey) -> Self {
		let public_key = Pubkey(signing_key.verifying_key().to_bytes());
		let signature = signing_key.sign(SIGN_IN_MESSAGE).to_bytes();
		debug!("Derived encryption key for {} from held key pair", public_key);
		Self {
			public_key,
			encryption_key: EncryptionKey::derive_from_signature(&signature),
			signing_key: Some(signing_key),
		}
	}

	pub fn from_signature(public_key: Pubkey, signature: &[u8; SIGNATURE_LENGTH]) -> Self {
		debug!("Derived encryption key for {} from external signature", public_key);
		Self {
			public_key,
			signing_key: None,
			encryption_key: EncryptionKey::derive_from_signature(signature),
		}
	}

	pub fn public_key(&self) -> &Pubkey {
		&self.public_key
	}

	pub(crate) fn signing_key(&self) -> Option<&SigningKey> {
		self.signing_key.as_ref()
	}

	pub(crate) fn encryption_key(&self) -> &EncryptionKey {
		&self.encryption_key
	}
}

impl fmt::Debug for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Identity")
			.field("public_key", &self.public_key)
			.field("has_signing_key", &self.signing_key.is_some())
			.finish()
	}
}
