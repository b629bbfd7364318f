//!
//! Ledger addresses and program-derived address derivation.
//!
//! Addresses on the ledger are 32-byte ed25519 public keys shown in base58. Token
//! accounts live at program-derived addresses, which are SHA-256 digests forced off
//! the ed25519 curve by a bump seed.

use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// SPL token program.
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
/// Associated token account program.
pub const ASSOCIATED_TOKEN_PROGRAM_ID: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";
const MAX_SEED_LEN: usize = 32;

static TOKEN_PROGRAM: LazyLock<Pubkey> =
	LazyLock::new(|| Pubkey::from_str(TOKEN_PROGRAM_ID).expect("token program id is valid base58"));
static ASSOCIATED_TOKEN_PROGRAM: LazyLock<Pubkey> = LazyLock::new(|| {
	Pubkey::from_str(ASSOCIATED_TOKEN_PROGRAM_ID)
		.expect("associated token program id is valid base58")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
	#[error("invalid base58 address: {0}")]
	InvalidBase58(String),
	#[error("address must be 32 bytes, got {0}")]
	InvalidLength(usize),
	#[error("seed exceeds {MAX_SEED_LEN} bytes")]
	SeedTooLong,
	#[error("no viable bump seed for program address")]
	NoViableBump,
}

/// A ledger address (ed25519 public key or program-derived address).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pubkey(pub [u8; 32]);

impl Pubkey {
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
		let array: [u8; 32] = bytes
			.try_into()
			.map_err(|_| AddressError::InvalidLength(bytes.len()))?;
		Ok(Self(array))
	}

	pub fn as_bytes(&self) -> &[u8; 32] {
		&self.0
	}

	/// Whether the bytes decompress to a point on the ed25519 curve.
	pub fn is_on_curve(&self) -> bool {
		VerifyingKey::from_bytes(&self.0).is_ok()
	}

	/// Hash `seeds ‖ [bump] ‖ program_id ‖ marker` and accept the digest only if it is off-curve.
	pub fn create_program_address(
		seeds: &[&[u8]],
		bump: u8,
		program_id: &Pubkey,
	) -> Result<Option<Pubkey>, AddressError> {
		let mut hasher = Sha256::new();
		for seed in seeds {
			if seed.len() > MAX_SEED_LEN {
				return Err(AddressError::SeedTooLong);
			}
			hasher.update(seed);
		}
		hasher.update([bump]);
		hasher.update(program_id.as_bytes());
		hasher.update(PDA_MARKER);

		let candidate = Pubkey(hasher.finalize().into());
		Ok((!candidate.is_on_curve()).then_some(candidate))
	}

	/// Finds the canonical program address by walking bump seeds down from 255.
	pub fn find_program_address(
		seeds: &[&[u8]],
		program_id: &Pubkey,
	) -> Result<(Pubkey, u8), AddressError> {
		for bump in (0..=u8::MAX).rev() {
			if let Some(address) = Self::create_program_address(seeds, bump, program_id)? {
				return Ok((address, bump));
			}
		}
		Err(AddressError::NoViableBump)
	}
}

impl FromStr for Pubkey {
	type Err = AddressError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let bytes = bs58::decode(s)
			.into_vec()
			.map_err(|e| AddressError::InvalidBase58(e.to_string()))?;
		Self::from_bytes(&bytes)
	}
}

impl fmt::Display for Pubkey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&bs58::encode(self.0).into_string())
	}
}

impl fmt::Debug for Pubkey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Pubkey({})", self)
	}
}

/// Associated token account of `owner` for `mint`, derived the way the ledger derives it.
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Result<Pubkey, AddressError> {
	let (address, _) = Pubkey::find_program_address(
		&[owner.as_bytes(), TOKEN_PROGRAM.as_bytes(), mint.as_bytes()],
		&ASSOCIATED_TOKEN_PROGRAM,
	)?;
	Ok(address)
}
