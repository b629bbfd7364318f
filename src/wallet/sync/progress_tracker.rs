//! Progress tracking for note synchronization.
//!
//! Records pages and outputs received while a sync pass walks the relayer's
//! emission sequence, and logs at regular intervals.

use tracing::info;

/// Outputs between periodic progress logs.
const LOG_INTERVAL: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct SyncProgressTracker {
	/// Offset the pass started from
	start_offset: u64,
	/// Offset after the last committed page
	current_offset: u64,
	pages_committed: usize,
	outputs_received: usize,
	/// Offset at which we last logged progress
	last_logged_offset: u64,
}

impl SyncProgressTracker {
	pub fn new(start_offset: u64) -> Self {
		Self {
			start_offset,
			current_offset: start_offset,
			pages_committed: 0,
			outputs_received: 0,
			last_logged_offset: start_offset,
		}
	}

	/// Record a committed page that advanced the watermark to `offset`.
	pub fn record_page(&mut self, outputs: usize, offset: u64) {
		self.pages_committed += 1;
		self.outputs_received += outputs;
		self.current_offset = self.current_offset.max(offset);
	}

	/// Log progress every `LOG_INTERVAL` outputs or when forced
	pub fn log_progress(&mut self, force: bool) {
		let since_last_log = self.current_offset.saturating_sub(self.last_logged_offset);
		if force || since_last_log >= LOG_INTERVAL {
			info!(
				"Sync progress: {} outputs in {} pages, offset {}",
				self.outputs_received, self.pages_committed, self.current_offset
			);
			self.last_logged_offset = self.current_offset;
		}
	}

	pub fn get_stats(&self) -> SyncStats {
		SyncStats {
			start_offset: self.start_offset,
			end_offset: self.current_offset,
			pages_committed: self.pages_committed,
			outputs_received: self.outputs_received,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStats {
	pub start_offset: u64,
	pub end_offset: u64,
	pub pages_committed: usize,
	pub outputs_received: usize,
}

impl SyncStats {
	pub fn summary(&self) -> String {
		format!(
			"Sync from {} to {}: {} outputs in {} pages",
			self.start_offset, self.end_offset, self.outputs_received, self.pages_committed
		)
	}
}
