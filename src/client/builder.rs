//! Builder for [`PrivacyClient`]
//!
//! Collects credentials, ledger access, the note source and the optional
//! collaborators, then validates and wires them together in [`build`].
//!
//! [`build`]: PrivacyClientBuilder::build

use super::PrivacyClient;
use crate::asset::{AssetDescriptor, Pubkey};
use crate::cache::{CacheStore, MemoryCacheStore};
use crate::crypto::{AesGcmNoteCipher, NoteCipher};
use crate::error::PrivacyError;
use crate::identity::{Credentials, Identity, OwnerKey};
use crate::operations::{OperationOrchestrator, StatusReporter, StatusSink, TerminalStatusSink};
use crate::relayer::{NoteSource, RelayerClient};
use crate::transaction::{Engine, LedgerAccess, LedgerConnection};
use crate::wallet::{BalanceAggregator, NoteSynchronizer, SyncConfig};

use ed25519_dalek::SIGNATURE_LENGTH;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Default)]
pub struct PrivacyClientBuilder {
	/// Key pair or public key plus sign-in signature
	credentials: Option<Credentials>,
	/// Endpoint URL or connection provider handed to the engine
	ledger: Option<LedgerAccess>,
	relayer_url: Option<String>,
	/// Overrides the relayer URL when set
	note_source: Option<Arc<dyn NoteSource>>,
	max_retry_elapsed: Option<Duration>,
	engine: Option<Arc<dyn Engine>>,
	cache_store: Option<Arc<dyn CacheStore>>,
	note_cipher: Option<Arc<dyn NoteCipher>>,
	sync_config: SyncConfig,
	status_sink: Option<Box<dyn StatusSink>>,
	debug: bool,
}

impl PrivacyClientBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_credentials(mut self, credentials: Credentials) -> Self {
		self.credentials = Some(credentials);
		self
	}

	/// Key-pair credentials
	pub fn with_owner_key(self, key: OwnerKey) -> Self {
		self.with_credentials(Credentials::Owner(key))
	}

	/// Public key plus an externally produced signature over the sign-in message
	pub fn with_signature(self, public_key: Pubkey, signature: [u8; SIGNATURE_LENGTH]) -> Self {
		self.with_credentials(Credentials::Signature {
			public_key,
			signature,
		})
	}

	pub fn with_ledger_endpoint(mut self, url: impl Into<String>) -> Self {
		self.ledger = Some(LedgerAccess::Endpoint(url.into()));
		self
	}

	pub fn with_ledger_connection(mut self, connection: Arc<dyn LedgerConnection>) -> Self {
		self.ledger = Some(LedgerAccess::Provider(connection));
		self
	}

	pub fn with_relayer_url(mut self, url: impl Into<String>) -> Self {
		self.relayer_url = Some(url.into());
		self
	}

	/// Bound on retrying one relayer request before it surfaces as retryable
	pub fn with_max_retry_elapsed(mut self, max_retry_elapsed: Duration) -> Self {
		self.max_retry_elapsed = Some(max_retry_elapsed);
		self
	}

	pub fn with_note_source(mut self, source: Arc<dyn NoteSource>) -> Self {
		self.note_source = Some(source);
		self
	}

	pub fn with_engine(mut self, engine: Arc<dyn Engine>) -> Self {
		self.engine = Some(engine);
		self
	}

	pub fn with_cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
		self.cache_store = Some(store);
		self
	}

	pub fn with_note_cipher(mut self, cipher: Arc<dyn NoteCipher>) -> Self {
		self.note_cipher = Some(cipher);
		self
	}

	/// Offset used for `asset` when no cache record exists yet
	pub fn with_starting_offset(mut self, asset: AssetDescriptor, offset: u64) -> Self {
		self.sync_config.starting_offsets.insert(asset, offset);
		self
	}

	pub fn with_page_size(mut self, page_size: u64) -> Self {
		self.sync_config.page_size = page_size;
		self
	}

	pub fn with_status_sink(mut self, sink: Box<dyn StatusSink>) -> Self {
		self.status_sink = Some(sink);
		self
	}

	/// Log phase changes instead of rendering a status line
	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	fn note_source(&mut self) -> Result<Arc<dyn NoteSource>, PrivacyError> {
		if let Some(source) = self.note_source.take() {
			return Ok(source);
		}

		let url = self
			.relayer_url
			.take()
			.filter(|url| !url.trim().is_empty())
			.ok_or(PrivacyError::MissingConnection("relayer URL or note source"))?;
		let mut client =
			RelayerClient::new(&url).map_err(|e| PrivacyError::RelayerConfig(e.to_string()))?;
		if let Some(max_retry_elapsed) = self.max_retry_elapsed {
			client = client.with_max_retry_elapsed(max_retry_elapsed);
		}
		Ok(Arc::new(client))
	}

	pub fn build(mut self) -> Result<PrivacyClient, PrivacyError> {
		let identity = Arc::new(Identity::resolve(self.credentials.take())?);

		let ledger = self
			.ledger
			.take()
			.and_then(LedgerAccess::into_connection)
			.ok_or(PrivacyError::MissingConnection("ledger endpoint or connection provider"))?;
		let source = self.note_source()?;

		let store = self
			.cache_store
			.take()
			.unwrap_or_else(|| Arc::new(MemoryCacheStore::new()) as Arc<dyn CacheStore>);
		let cipher = self.note_cipher.take().unwrap_or_else(|| {
			Arc::new(AesGcmNoteCipher::new(identity.encryption_key())) as Arc<dyn NoteCipher>
		});

		let synchronizer = Arc::new(NoteSynchronizer::new(source, store, self.sync_config));
		let orchestrator = Arc::new(OperationOrchestrator::new(
			identity.clone(),
			synchronizer.clone(),
			self.engine.clone(),
			cipher.clone(),
			ledger,
			self.debug,
		));

		let reporter = if self.debug {
			None
		} else if tokio::runtime::Handle::try_current().is_ok() {
			let sink = self
				.status_sink
				.take()
				.unwrap_or_else(|| Box::new(TerminalStatusSink) as Box<dyn StatusSink>);
			Some(StatusReporter::spawn(orchestrator.subscribe(), sink))
		} else {
			debug!("No tokio runtime at build time; status reporter not started");
			None
		};

		info!("Privacy client ready for {}", identity.public_key());
		Ok(PrivacyClient {
			identity,
			synchronizer,
			aggregator: BalanceAggregator::new(cipher),
			orchestrator,
			engine: self.engine,
			reporter,
		})
	}
}
