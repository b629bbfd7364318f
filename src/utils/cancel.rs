use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Drives `future` unless `cancel` fires first, in which case the future is dropped
/// and `None` is returned. Cancellation wins ties.
pub async fn until_cancelled<F: Future>(
	cancel: Option<&CancellationToken>,
	future: F,
) -> Option<F::Output> {
	match cancel {
		Some(token) => tokio::select! {
			biased;
			_ = token.cancelled() => None,
			output = future => Some(output),
		},
		None => Some(future.await),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_completes_without_token() {
		assert_eq!(until_cancelled(None, async { 7 }).await, Some(7));
	}

	#[tokio::test]
	async fn test_cancelled_token_drops_future() {
		let token = CancellationToken::new();
		token.cancel();
		assert_eq!(until_cancelled(Some(&token), async { 7 }).await, None);
	}

	#[tokio::test(start_paused = true)]
	async fn test_cancel_interrupts_pending_future() {
		let token = CancellationToken::new();
		let canceller = token.clone();
		tokio::spawn(async move {
			tokio::time::sleep(std::time::Duration::from_millis(50)).await;
			canceller.cancel();
		});
		let result = until_cancelled(Some(&token), std::future::pending::<()>()).await;
		assert_eq!(result, None);
	}
}
