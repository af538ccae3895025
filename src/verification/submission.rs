// Submission of confirmed snapshots: the simulated sink and the
// timeout/retry policy wrapped around any sink

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::errors::SubmissionError;
use super::traits::{SubmissionReceipt, SubmissionSink};
use super::types::{ActionKind, Snapshot};
use crate::config::SubmissionConfig;

/// Stand-in for the ERP backend: accepts every snapshot after a fixed delay
#[derive(Debug, Clone)]
pub struct SimulatedSubmission {
    delay: Duration,
}

impl Default for SimulatedSubmission {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

impl SimulatedSubmission {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_config(config: &SubmissionConfig) -> Self {
        Self::new(Duration::from_millis(config.simulated_delay_ms))
    }
}

#[async_trait]
impl SubmissionSink for SimulatedSubmission {
    async fn submit(&self, snapshot: &Snapshot) -> Result<SubmissionReceipt, SubmissionError> {
        sleep(self.delay).await;

        let message = match snapshot.action {
            ActionKind::Verify => "Records updated in Navy ERP system",
            ActionKind::Discrepancy => "Discrepancy logged for investigation",
        };

        Ok(SubmissionReceipt {
            reference: uuid::Uuid::new_v4().to_string(),
            accepted_at: Utc::now(),
            message: Some(message.to_string()),
        })
    }
}

/// Per-attempt timeout and exponential backoff between retryable failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(10),
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &SubmissionConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            attempt_timeout: Duration::from_millis(config.timeout_ms),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Submit through `sink`, retrying timeouts and transport errors
    pub async fn submit(
        &self,
        sink: &dyn SubmissionSink,
        snapshot: &Snapshot,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match timeout(self.attempt_timeout, sink.submit(snapshot)).await {
                Ok(result) => result,
                Err(_) => Err(SubmissionError::Timeout {
                    timeout_ms: self.attempt_timeout.as_millis() as u64,
                }),
            };

            match result {
                Ok(receipt) => {
                    debug!(
                        correlation_id = %snapshot.correlation_id,
                        attempt,
                        reference = %receipt.reference,
                        "Snapshot accepted"
                    );
                    return Ok(receipt);
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        correlation_id = %snapshot.correlation_id,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Submission attempt failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
