//! Parameterized retry helper
//!
//! Validation against an eventually-consistent metrics pipeline needs a
//! bounded number of attempts with a fixed inter-attempt sleep. All retry
//! loops in the harness go through `RetryPolicy` so the contract is
//! testable independently of any specific metric.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use super::cancel::CancelToken;
use super::{Error, Result};

/// Bounded retry with a fixed sleep between attempts
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Run `attempt` until `is_done` accepts its outcome or the attempt
    /// budget is exhausted. Returns the last outcome either way; the caller
    /// inspects it for the verdict. Errors only on cancellation, which is
    /// observed during the inter-attempt sleep so an in-flight attempt is
    /// never torn down halfway.
    ///
    /// A zero attempt budget (possible through config overrides) is treated
    /// as one attempt: the check always runs at least once.
    pub async fn run_until<T, F, Fut, P>(
        &self,
        cancel: &CancelToken,
        mut attempt: F,
        mut is_done: P,
    ) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = T>,
        P: FnMut(&T) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);

        let mut last = None;
        for n in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let outcome = attempt(n).await;
            if is_done(&outcome) {
                return Ok(outcome);
            }
            last = Some(outcome);

            if n < max_attempts {
                debug!(attempt = n, max = max_attempts, "attempt failed, sleeping before retry");
                tokio::select! {
                    _ = tokio::time::sleep(self.interval) => {}
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                }
            }
        }

        // max_attempts >= 1, so at least one outcome was recorded
        Ok(last.unwrap())
    }
}
