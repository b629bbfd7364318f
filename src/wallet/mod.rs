/// Cached-note balance aggregation
pub mod balance;
pub mod sync;
pub mod types;

pub use balance::BalanceAggregator;
pub use sync::{NoteSynchronizer, SyncConfig};
pub use types::*;
