//! Client-side sync and orchestration for a shielded token pool.
//!
//! Keeps a local cache of the encrypted notes the pool has emitted, decrypts the
//! ones addressed to the owner, and coordinates deposits and withdrawals through an
//! external proof and transaction engine.

pub mod asset;
pub mod cache;
pub mod client;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod operations;
pub mod relayer;
pub mod transaction;
pub mod utils;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use client::{PrivacyClient, PrivacyClientBuilder};
pub use error::PrivacyError;
