use std::{future::Future, time::Duration};

use tokio::time::sleep;

use crate::errors::{EvaluationError, GatewayError};

/// Bounded retry for platform errors.
///
/// Rate limits are not retried here; they are handed back as
/// [`EvaluationError::RateLimited`] so the caller can wait for the signaled duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Option<Duration>,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

    pub fn new(delay: Option<Duration>) -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            delay,
        }
    }

    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, EvaluationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match op().await {
                Ok(v) => return Ok(v),
                Err(GatewayError::RateLimited { retry_after }) => {
                    return Err(EvaluationError::RateLimited { retry_after });
                }
                Err(GatewayError::Platform { message }) => {
                    if let Some(delay) = self.delay {
                        sleep(delay).await;
                    }
                    if attempts >= max_attempts {
                        return Err(EvaluationError::Exhausted { attempts, message });
                    }
                    tracing::debug!(attempt = attempts, error = %message, "retrying platform call");
                }
            }
        }
    }
}
