//! Adapter fetches with exponential backoff

use lithomosaic_core::config::MosaicSettings;
use lithomosaic_core::error::Result;
use lithomosaic_core::models::RawRecord;
use lithomosaic_core::ports::SourceAdapter;
use std::time::Duration;

/// Retries retryable adapter failures, doubling the delay each attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    pub fn from_settings(settings: &MosaicSettings) -> Self {
        Self::new(settings.max_retries, settings.retry_base_delay)
    }

    /// Delay before retry number `attempt + 1`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }

    pub async fn fetch<A>(&self, adapter: &A, source_id: &str) -> Result<Vec<RawRecord>>
    where
        A: SourceAdapter + ?Sized,
    {
        let mut attempt = 0;
        loop {
            match adapter.fetch(source_id).await {
                Ok(records) => {
                    if attempt > 0 {
                        tracing::info!(source = source_id, attempt, "Fetch succeeded after retry");
                    }
                    return Ok(records);
                }
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let backoff = self.delay_for(attempt);
                    tracing::warn!(
                        source = source_id,
                        adapter = adapter.name(),
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Fetch failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
