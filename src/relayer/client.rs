//! HTTP client for the relayer's note-range endpoint.
//!
//! Transient failures (connection errors, 5xx, 429) are retried with exponential
//! backoff up to a bounded elapsed time; anything left over is surfaced to the
//! synchronizer, which reports it as retryable without touching the cache.

use super::NoteSource;
use super::types::*;
use crate::asset::AssetDescriptor;

use async_trait::async_trait;
use backoff::{ExponentialBackoff, future::retry};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, warn};

const RANGE_PATH: &str = "utxos/range";

/// Relayer HTTP client
#[derive(Clone)]
pub struct RelayerClient {
	/// The underlying HTTP client.
	http_client: Client,
	/// Base URL, always ending in `/`.
	base_url: Url,
	/// Upper bound on time spent retrying one request.
	max_retry_elapsed: Duration,
}

impl RelayerClient {
	/// Create a new relayer client.
	///
	/// # Arguments
	/// * `base_url` - Root URL of the relayer API.
	pub fn new(base_url: &str) -> Result<Self, RelayerError> {
		let http_client = Client::builder()
			.timeout(Duration::from_secs(30))
			.build()?;

		let normalized = if base_url.ends_with('/') {
			base_url.to_string()
		} else {
			format!("{}/", base_url)
		};
		let base_url = Url::parse(&normalized).map_err(|e| RelayerError::UrlError(e.to_string()))?;

		Ok(Self {
			http_client,
			base_url,
			max_retry_elapsed: Duration::from_secs(10),
		})
	}

	pub fn with_max_retry_elapsed(mut self, max_retry_elapsed: Duration) -> Self {
		self.max_retry_elapsed = max_retry_elapsed;
		self
	}

	fn range_url(&self, asset: &AssetDescriptor, start: u64, end: u64) -> Result<Url, RelayerError> {
		let mut url = self
			.base_url
			.join(RANGE_PATH)
			.map_err(|e| RelayerError::UrlError(e.to_string()))?;
		{
			let mut query = url.query_pairs_mut();
			query
				.append_pair("start", &start.to_string())
				.append_pair("end", &end.to_string());
			if let Some(mint) = asset.mint() {
				query.append_pair("token", &mint.to_string());
			}
		}
		Ok(url)
	}

	async fn fetch_once(&self, url: &Url) -> Result<NotePage, backoff::Error<RelayerError>> {
		let response = self
			.http_client
			.get(url.clone())
			.send()
			.await
			.map_err(|e| {
				warn!("Relayer request failed: {}", e);
				backoff::Error::transient(RelayerError::HttpError(e))
			})?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			let error = RelayerError::StatusError {
				status: status.as_u16(),
				body,
			};
			return if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
				warn!("Relayer returned {}, retrying", status);
				Err(backoff::Error::transient(error))
			} else {
				Err(backoff::Error::permanent(error))
			};
		}

		let bytes = response
			.bytes()
			.await
			.map_err(|e| backoff::Error::transient(RelayerError::HttpError(e)))?;
		serde_json::from_slice::<NotePage>(&bytes)
			.map_err(|e| backoff::Error::permanent(RelayerError::JsonError(e)))
	}
}

#[async_trait]
impl NoteSource for RelayerClient {
	async fn fetch_range(
		&self,
		asset: &AssetDescriptor,
		start: u64,
		end: u64,
	) -> Result<NotePage, RelayerError> {
		let url = self.range_url(asset, start, end)?;
		debug!("Fetching notes {}..{} from {}", start, end, url);

		let policy = ExponentialBackoff {
			max_elapsed_time: Some(self.max_retry_elapsed),
			..ExponentialBackoff::default()
		};
		let page = retry(policy, || self.fetch_once(&url)).await?;

		debug!(
			"Relayer returned {} outputs (has_more: {})",
			page.encrypted_outputs.len(),
			page.has_more
		);
		Ok(page)
	}
}
