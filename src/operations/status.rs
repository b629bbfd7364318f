//! Terminal status line for long-running operations.
//!
//! A background task watches the orchestrator's published status and redraws a
//! single line every tick while an operation runs. It clears the line once when the
//! operation finishes.

use std::io::Write;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const STATUS_INTERVAL: Duration = Duration::from_millis(250);

const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

/// Orchestrator state as published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperationStatus {
	#[default]
	Idle,
	Running {
		phase: String,
	},
}

impl OperationStatus {
	pub fn is_running(&self) -> bool {
		matches!(self, OperationStatus::Running { .. })
	}
}

/// Destination for rendered status lines.
pub trait StatusSink: Send + 'static {
	fn render(&mut self, line: &str);

	fn clear(&mut self);
}

/// Redraws in place on stderr.
#[derive(Debug, Default)]
pub struct TerminalStatusSink;

impl StatusSink for TerminalStatusSink {
	fn render(&mut self, line: &str) {
		let mut stderr = std::io::stderr().lock();
		let _ = write!(stderr, "\r\x1b[2K{}", line);
		let _ = stderr.flush();
	}

	fn clear(&mut self) {
		let mut stderr = std::io::stderr().lock();
		let _ = write!(stderr, "\r\x1b[2K");
		let _ = stderr.flush();
	}
}

pub struct StatusReporter {
	cancel: CancellationToken,
	handle: Option<JoinHandle<()>>,
}

impl StatusReporter {
	/// Spawn the reporter on the current tokio runtime.
	pub fn spawn(status: watch::Receiver<OperationStatus>, sink: Box<dyn StatusSink>) -> Self {
		let cancel = CancellationToken::new();
		let handle = tokio::spawn(Self::run(status, sink, cancel.clone()));
		Self {
			cancel,
			handle: Some(handle),
		}
	}

	async fn run(
		status: watch::Receiver<OperationStatus>,
		mut sink: Box<dyn StatusSink>,
		cancel: CancellationToken,
	) {
		let mut ticker = tokio::time::interval(STATUS_INTERVAL);
		let mut frame = 0usize;
		let mut rendered = false;

		loop {
			tokio::select! {
				biased;
				_ = cancel.cancelled() => break,
				_ = ticker.tick() => {}
			}

			let current = status.borrow().clone();
			match current {
				OperationStatus::Running { phase } => {
					let spinner = SPINNER_FRAMES[frame % SPINNER_FRAMES.len()];
					sink.render(&format!("{} {}", spinner, phase));
					frame = frame.wrapping_add(1);
					rendered = true;
				}
				OperationStatus::Idle if rendered => {
					sink.clear();
					rendered = false;
				}
				OperationStatus::Idle => {}
			}
		}

		if rendered {
			sink.clear();
		}
		debug!("Status reporter stopped");
	}

	/// Stop the reporter and wait for it to finish.
	pub async fn stop(mut self) {
		self.cancel.cancel();
		if let Some(handle) = self.handle.take() {
			let _ = handle.await;
		}
	}
}

impl Drop for StatusReporter {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}
