//! Note encryption capability.
//!
//! The rest of the crate only sees the [`NoteCipher`] trait. [`AesGcmNoteCipher`] is the
//! bundled implementation keyed by the identity's derived key.

/// AES-256-GCM implementation
pub mod cipher;
/// Decrypted note type and plaintext codec
pub mod note;

pub use cipher::AesGcmNoteCipher;
pub use note::Note;

use thiserror::Error;

/// Failure to encrypt or decode a single note.
///
/// Decode failures are expected for notes addressed to other owners and are skipped
/// by balance aggregation rather than returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NoteCipherError {
	#[error("malformed note blob: {0}")]
	MalformedBlob(String),

	#[error("unsupported note blob version {0}")]
	UnsupportedVersion(u8),

	#[error("note did not decrypt under this key")]
	DecryptionFailed,

	#[error("malformed note plaintext: {0}")]
	MalformedPlaintext(String),

	#[error("note encryption failed")]
	EncryptionFailed,
}

/// Per-note encrypt/decrypt under the owner's key.
pub trait NoteCipher: Send + Sync {
	fn encrypt(&self, note: &Note) -> Result<Vec<u8>, NoteCipherError>;

	fn decrypt(&self, blob: &[u8]) -> Result<Note, NoteCipherError>;

	/// Decrypts a hex-encoded blob as stored in the cache.
	fn decrypt_hex(&self, encoded: &str) -> Result<Note, NoteCipherError> {
		let blob = hex::decode(encoded).map_err(|e| NoteCipherError::MalformedBlob(e.to_string()))?;
		self.decrypt(&blob)
	}
}
