//! AES-256-GCM note cipher keyed by the owner's derived encryption key.
//!
//! Blob layout: `version (1) ‖ nonce (12) ‖ ciphertext ‖ tag (16)`.

use super::{Note, NoteCipher, NoteCipherError};
use crate::identity::EncryptionKey;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::Rng;

const BLOB_VERSION: u8 = 2;
const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;
const HEADER_SIZE: usize = 1 + NONCE_SIZE;

pub struct AesGcmNoteCipher {
	cipher: Aes256Gcm,
}

impl AesGcmNoteCipher {
	pub fn new(key: &EncryptionKey) -> Self {
		Self {
			cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.expose())),
		}
	}
}

impl NoteCipher for AesGcmNoteCipher {
	fn encrypt(&self, note: &Note) -> Result<Vec<u8>, NoteCipherError> {
		let mut nonce = [0u8; NONCE_SIZE];
		rand::rng().fill(&mut nonce);

		let ciphertext = self
			.cipher
			.encrypt(Nonce::from_slice(&nonce), note.to_plaintext().as_bytes())
			.map_err(|_| NoteCipherError::EncryptionFailed)?;

		let mut blob = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
		blob.push(BLOB_VERSION);
		blob.extend_from_slice(&nonce);
		blob.extend_from_slice(&ciphertext);
		Ok(blob)
	}

	fn decrypt(&self, blob: &[u8]) -> Result<Note, NoteCipherError> {
		if blob.len() < HEADER_SIZE + TAG_SIZE {
			return Err(NoteCipherError::MalformedBlob(format!(
				"{} bytes is shorter than header and tag",
				blob.len()
			)));
		}
		if blob[0] != BLOB_VERSION {
			return Err(NoteCipherError::UnsupportedVersion(blob[0]));
		}

		let (nonce, ciphertext) = blob[1..].split_at(NONCE_SIZE);
		let plaintext = self
			.cipher
			.decrypt(Nonce::from_slice(nonce), ciphertext)
			.map_err(|_| NoteCipherError::DecryptionFailed)?;
		let plaintext = String::from_utf8(plaintext)
			.map_err(|e| NoteCipherError::MalformedPlaintext(e.to_string()))?;

		Note::from_plaintext(&plaintext)
	}
}
