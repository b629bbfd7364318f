//! Asset identification and cache addressing.
//!
//! Every cache record is keyed by the ledger address that notes for an asset are
//! indexed under: the owner's own address for the native asset, and the owner's
//! associated token account for a fungible token.

/// Ledger addresses and program-derived address derivation
pub mod address;
/// Statically known token mints
pub mod registry;

pub use address::{AddressError, Pubkey, associated_token_address};
pub use registry::{KNOWN_TOKENS, NATIVE_DECIMALS, TokenInfo, registered_assets};

use std::fmt;
use std::str::FromStr;

const NATIVE_TAG: &str = "native";
const OFFSET_ENTRY_PREFIX: &str = "fetch_offset";
const OUTPUTS_ENTRY_PREFIX: &str = "encrypted_outputs";

/// Identifies the native asset or a fungible token by mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetDescriptor {
	Native,
	Token(Pubkey),
}

impl AssetDescriptor {
	/// Ledger address whose note stream this asset's cache mirrors.
	pub fn cache_address(&self, owner: &Pubkey) -> Result<Pubkey, AddressError> {
		match self {
			AssetDescriptor::Native => Ok(*owner),
			AssetDescriptor::Token(mint) => associated_token_address(owner, mint),
		}
	}

	pub fn decimals(&self) -> u32 {
		match self {
			AssetDescriptor::Native => NATIVE_DECIMALS,
			AssetDescriptor::Token(mint) => registry::lookup_by_mint(mint)
				.map(|token| token.decimals)
				.unwrap_or(0),
		}
	}

	pub fn symbol(&self) -> String {
		match self {
			AssetDescriptor::Native => "SOL".to_string(),
			AssetDescriptor::Token(mint) => registry::lookup_by_mint(mint)
				.map(|token| token.symbol.to_string())
				.unwrap_or_else(|| mint.to_string()),
		}
	}

	pub fn mint(&self) -> Option<&Pubkey> {
		match self {
			AssetDescriptor::Native => None,
			AssetDescriptor::Token(mint) => Some(mint),
		}
	}
}

impl fmt::Display for AssetDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AssetDescriptor::Native => f.write_str(NATIVE_TAG),
			AssetDescriptor::Token(mint) => write!(f, "{}", mint),
		}
	}
}

impl FromStr for AssetDescriptor {
	type Err = AddressError;

	/// Accepts `native`/`sol`, a registered token symbol, or a base58 mint.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.eq_ignore_ascii_case(NATIVE_TAG) || s.eq_ignore_ascii_case("sol") {
			return Ok(AssetDescriptor::Native);
		}
		if let Some(token) = registry::lookup_by_symbol(s) {
			return Pubkey::from_str(token.mint).map(AssetDescriptor::Token);
		}
		Pubkey::from_str(s).map(AssetDescriptor::Token)
	}
}

/// Stable key of one cache record in persistent storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
	address: String,
}

impl CacheKey {
	pub fn for_asset(owner: &Pubkey, asset: &AssetDescriptor) -> Result<Self, AddressError> {
		Ok(Self {
			address: asset.cache_address(owner)?.to_string(),
		})
	}

	pub fn address(&self) -> &str {
		&self.address
	}

	/// Entry name holding the offset watermark.
	pub fn offset_entry(&self) -> String {
		format!("{}{}", OFFSET_ENTRY_PREFIX, self.address)
	}

	/// Entry name holding the ordered encrypted outputs.
	pub fn outputs_entry(&self) -> String {
		format!("{}{}", OUTPUTS_ENTRY_PREFIX, self.address)
	}
}

impl fmt::Display for CacheKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.address)
	}
}
