//! Types for the relayer's note-range endpoint

use serde::{Deserialize, Serialize};

/// One page of encrypted outputs, in emission order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotePage {
	/// Hex-encoded encrypted note blobs.
	pub encrypted_outputs: Vec<String>,
	/// Whether more outputs exist past the end of this page.
	#[serde(rename = "hasMore", default)]
	pub has_more: bool,
	/// Total outputs emitted so far, when the relayer reports it.
	#[serde(default)]
	pub total: Option<u64>,
}

/// Error types for relayer requests
#[derive(Debug, thiserror::Error)]
pub enum RelayerError {
	#[error("HTTP error: {0}")]
	HttpError(#[from] reqwest::Error),

	#[error("Relayer returned status {status}: {body}")]
	StatusError { status: u16, body: String },

	#[error("JSON parse error: {0}")]
	JsonError(#[from] serde_json::Error),

	#[error("Invalid relayer URL: {0}")]
	UrlError(String),

	#[error("Transport error: {0}")]
	TransportError(String),
}
