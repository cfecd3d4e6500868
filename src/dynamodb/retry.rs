//! Retry policies for control-plane requests.
//!
//! A policy wraps a transport attempt and decides whether a failed attempt is
//! worth repeating. Two policies ship with the crate: [`NoRetry`] and
//! [`BoundedBackoffRetry`]; anything implementing [`RetryPolicy`] can be
//! attached to a [`DynamoDb`](crate::dynamodb::DynamoDb) or a
//! [`Table`](crate::dynamodb::Table) in their place.
//!
//! Backoff follows the AWS guidance for DynamoDB API retries:
//! <http://docs.aws.amazon.com/amazondynamodb/latest/developerguide/ErrorHandling.html#APIRetries>

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::dynamodb::error::TransportError;
use crate::dynamodb::transport::BoxFuture;

/// Retries after the first attempt; five invocations in total.
pub const MAX_RETRIES: u32 = 4;

/// Delay before the first retry. Doubles on each further retry.
pub const BASE_DELAY: Duration = Duration::from_millis(50);

/// Outcome of one transport attempt.
pub type Attempt<'a> = BoxFuture<'a, Result<Vec<u8>, TransportError>>;

/// A repeatable transport attempt.
pub type AttemptFn<'a> = dyn Fn() -> Attempt<'a> + Send + Sync + 'a;

/// Pins down the signature of an attempt closure so its future is boxed as an [`Attempt`].
pub fn operation<'a, F>(f: F) -> F
where
    F: Fn() -> Attempt<'a> + Send + Sync + 'a,
{
    f
}

/// Returns true for failures expected to clear on retry: HTTP 500,
/// throttling, or exceeded provisioned throughput.
pub fn is_transient(err: &TransportError) -> bool {
    match err {
        TransportError::Service { status, code, .. } => {
            *status == 500
                || code == "ThrottlingException"
                || code == "ProvisionedThroughputExceededException"
        }
        TransportError::Dispatch(_) => false,
    }
}

/// Something that happened while a policy was executing an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryEvent {
    AttemptFailed {
        attempt: u32,
        error: TransportError,
        retryable: bool,
    },
    BackoffScheduled {
        attempt: u32,
        delay: Duration,
    },
}

/// Receives retry events.
pub trait RetryObserver: Send + Sync + fmt::Debug {
    fn observe(&self, event: &RetryEvent);
}

/// Logs retry events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RetryObserver for TracingObserver {
    fn observe(&self, event: &RetryEvent) {
        match event {
            RetryEvent::AttemptFailed { attempt, error, .. } => {
                warn!("Error requesting from DynamoDB (attempt {}): {}", attempt + 1, error);
            }
            RetryEvent::BackoffScheduled { delay, .. } => {
                info!("Retrying in {} ms", delay.as_millis());
            }
        }
    }
}

/// Executes a transport attempt with retry semantics.
///
/// Returns the outcome of the last invocation of `attempt`.
#[async_trait]
pub trait RetryPolicy: Send + Sync + fmt::Debug {
    async fn execute<'a>(
        &self,
        attempt: &'a AttemptFn<'a>,
    ) -> Result<Vec<u8>, TransportError>;
}

/// Runs the attempt exactly once.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRetry;

#[async_trait]
impl RetryPolicy for NoRetry {
    async fn execute<'a>(
        &self,
        attempt: &'a AttemptFn<'a>,
    ) -> Result<Vec<u8>, TransportError> {
        attempt().await
    }
}

/// Retries transient failures with exponential backoff, up to a fixed cap.
#[derive(Debug, Clone)]
pub struct BoundedBackoffRetry {
    max_retries: u32,
    base_delay: Duration,
    observer: Arc<dyn RetryObserver>,
}

impl Default for BoundedBackoffRetry {
    fn default() -> Self {
        Self::new(MAX_RETRIES, BASE_DELAY)
    }
}

impl BoundedBackoffRetry {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the default tracing observer.
    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `attempt + 1`: `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

#[async_trait]
impl RetryPolicy for BoundedBackoffRetry {
    async fn execute<'a>(
        &self,
        attempt: &'a AttemptFn<'a>,
    ) -> Result<Vec<u8>, TransportError> {
        let mut current = 0;
        loop {
            let err = match attempt().await {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };

            let retryable = is_transient(&err);
            self.observer.observe(&RetryEvent::AttemptFailed {
                attempt: current,
                error: err.clone(),
                retryable,
            });

            if current >= self.max_retries || !retryable {
                return Err(err);
            }

            let delay = self.delay_for(current);
            self.observer.observe(&RetryEvent::BackoffScheduled {
                attempt: current,
                delay,
            });
            sleep(delay).await;
            current += 1;
        }
    }
}
