//!
//! Utility module for the shielded client.
//!
//! Formatting helpers for log output and the cancellation adapter shared by sync and
//! operations.
/// Cancellation adapter for long-running futures
pub mod cancel;
/// Utility functions for formatting and display
pub mod index;

pub use cancel::until_cancelled;
pub use index::format_token_amount;
