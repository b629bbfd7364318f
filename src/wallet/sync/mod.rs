//! Incremental synchronization of the encrypted note cache.

/// Progress logging for a sync pass
pub mod progress_tracker;
/// Page-by-page relayer sync into the cache store
pub mod synchronizer;

pub use progress_tracker::{SyncProgressTracker, SyncStats};
pub use synchronizer::{DEFAULT_PAGE_SIZE, NoteSynchronizer, SyncConfig};
