//! Owner credential variants.

use super::IdentityError;
use crate::asset::Pubkey;
use ed25519_dalek::{KEYPAIR_LENGTH, SECRET_KEY_LENGTH, SIGNATURE_LENGTH, SigningKey};

/// Key-pair material in one of the forms wallets hand out.
pub enum OwnerKey {
	/// 32-byte secret seed or 64-byte seed ‖ public key.
	RawKeyBytes(Vec<u8>),
	/// Base58 text of the raw bytes, or a JSON byte array as written by keypair files.
	EncodedKeyString(String),
	/// An already parsed signing key.
	KeypairHandle(SigningKey),
}

impl OwnerKey {
	pub fn into_signing_key(self) -> Result<SigningKey, IdentityError> {
		match self {
			OwnerKey::RawKeyBytes(bytes) => signing_key_from_bytes(&bytes),
			OwnerKey::EncodedKeyString(encoded) => {
				let bytes = decode_key_string(encoded.trim())?;
				signing_key_from_bytes(&bytes)
			}
			OwnerKey::KeypairHandle(key) => Ok(key),
		}
	}
}

/// Exactly one credential form backs an identity.
pub enum Credentials {
	Owner(OwnerKey),
	/// A public key plus the wallet's signature over the sign-in message, for
	/// wallets that never reveal their secret key.
	Signature {
		public_key: Pubkey,
		signature: [u8; SIGNATURE_LENGTH],
	},
}

impl Credentials {
	pub fn from_signature_bytes(public_key: &[u8], signature: &[u8]) -> Result<Self, IdentityError> {
		let public_key = Pubkey::from_bytes(public_key)
			.map_err(|e| IdentityError::InvalidCredential(e.to_string()))?;
		let signature: [u8; SIGNATURE_LENGTH] = signature.try_into().map_err(|_| {
			IdentityError::InvalidCredential(format!(
				"signature must be {} bytes, got {}",
				SIGNATURE_LENGTH,
				signature.len()
			))
		})?;
		Ok(Credentials::Signature {
			public_key,
			signature,
		})
	}
}

impl From<OwnerKey> for Credentials {
	fn from(key: OwnerKey) -> Self {
		Credentials::Owner(key)
	}
}

fn decode_key_string(encoded: &str) -> Result<Vec<u8>, IdentityError> {
	if encoded.starts_with('[') {
		return serde_json::from_str::<Vec<u8>>(encoded).map_err(|e| {
			IdentityError::InvalidCredential(format!("malformed key byte array: {}", e))
		});
	}
	bs58::decode(encoded)
		.into_vec()
		.map_err(|e| IdentityError::InvalidCredential(format!("malformed base58 key: {}", e)))
}

fn signing_key_from_bytes(bytes: &[u8]) -> Result<SigningKey, IdentityError> {
	match bytes.len() {
		SECRET_KEY_LENGTH => {
			let mut seed = [0u8; SECRET_KEY_LENGTH];
			seed.copy_from_slice(bytes);
			Ok(SigningKey::from_bytes(&seed))
		}
		KEYPAIR_LENGTH => {
			let mut pair = [0u8; KEYPAIR_LENGTH];
			pair.copy_from_slice(bytes);
			SigningKey::from_keypair_bytes(&pair).map_err(|e| {
				IdentityError::InvalidCredential(format!(
					"public key does not match secret key: {}",
					e
				))
			})
		}
		other => Err(IdentityError::InvalidCredential(format!(
			"expected {} or {} key bytes, got {}",
			SECRET_KEY_LENGTH, KEYPAIR_LENGTH, other
		))),
	}
}
