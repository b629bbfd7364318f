//! Statically known fungible tokens.
//!
//! Cache clearing only enumerates these mints. Tokens outside the registry can still
//! be synced and queried, but their cache entries survive `clear_cache`.

use super::{AssetDescriptor, Pubkey};
use std::str::FromStr;

/// Decimal places of the native asset (lamports per unit).
pub const NATIVE_DECIMALS: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfo {
	pub symbol: &'static str,
	pub mint: &'static str,
	pub decimals: u32,
}

pub const KNOWN_TOKENS: &[TokenInfo] = &[
	TokenInfo {
		symbol: "USDC",
		mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
		decimals: 6,
	},
	TokenInfo {
		symbol: "USDT",
		mint: "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB",
		decimals: 6,
	},
];

impl TokenInfo {
	pub fn asset(&self) -> Option<AssetDescriptor> {
		Pubkey::from_str(self.mint).ok().map(AssetDescriptor::Token)
	}
}

pub fn lookup_by_mint(mint: &Pubkey) -> Option<&'static TokenInfo> {
	let encoded = mint.to_string();
	KNOWN_TOKENS.iter().find(|token| token.mint == encoded)
}

pub fn lookup_by_symbol(symbol: &str) -> Option<&'static TokenInfo> {
	KNOWN_TOKENS
		.iter()
		.find(|token| token.symbol.eq_ignore_ascii_case(symbol))
}

/// The native asset followed by every registered token.
pub fn registered_assets() -> Vec<AssetDescriptor> {
	std::iter::once(AssetDescriptor::Native)
		.chain(KNOWN_TOKENS.iter().filter_map(TokenInfo::asset))
		.collect()
}
