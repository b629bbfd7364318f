//! Deposit and withdraw coordination plus the status line that tracks it.

/// Single-flight coordinator
pub mod orchestrator;
/// Periodic status rendering
pub mod status;

pub use orchestrator::{OperationOrchestrator, RunningGuard};
pub use status::{
	OperationStatus, STATUS_INTERVAL, StatusReporter, StatusSink, TerminalStatusSink,
};
