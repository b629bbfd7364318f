use std::fmt;
use std::sync::Arc;

/// Ledger connectivity handed through to the engine. This crate never talks to the
/// ledger itself.
pub trait LedgerConnection: Send + Sync {
	fn endpoint(&self) -> &str;
}

/// Plain RPC endpoint URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcEndpoint {
	url: String,
}

impl RpcEndpoint {
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: url.into() }
	}
}

impl LedgerConnection for RpcEndpoint {
	fn endpoint(&self) -> &str {
		&self.url
	}
}

/// How the client reaches the ledger: exactly one of an endpoint or a provider.
#[derive(Clone)]
pub enum LedgerAccess {
	Endpoint(String),
	Provider(Arc<dyn LedgerConnection>),
}

impl LedgerAccess {
	/// `None` for an empty endpoint string.
	pub fn into_connection(self) -> Option<Arc<dyn LedgerConnection>> {
		match self {
			LedgerAccess::Endpoint(url) if url.trim().is_empty() => None,
			LedgerAccess::Endpoint(url) => Some(Arc::new(RpcEndpoint::new(url))),
			LedgerAccess::Provider(provider) => Some(provider),
		}
	}
}

impl fmt::Debug for LedgerAccess {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LedgerAccess::Endpoint(url) => f.debug_tuple("Endpoint").field(url).finish(),
			LedgerAccess::Provider(provider) => {
				f.debug_tuple("Provider").field(&provider.endpoint()).finish()
			}
		}
	}
}
