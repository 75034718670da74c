//! Long-running operation handling.
//!
//! Every mutating API call returns an operation that completes
//! asynchronously. [`wait_operation`] polls it to a terminal state;
//! [`retry_conflicting_operation`] retries the submission itself when
//! the parent resource is busy with another operation.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use cirrus_common::api::operation::{GetOperationRequest, Operation};
use cirrus_common::{Error, Result};

use crate::client::CloudApi;

/// Total submission attempts, including the first one.
const MAX_CONFLICT_ATTEMPTS: u32 = 5;
const INITIAL_CONFLICT_BACKOFF: Duration = Duration::from_millis(500);

/// Poll `op` until it reaches a terminal state or `timeout` elapses.
///
/// A finished operation carrying an error payload becomes
/// [`Error::OperationFailed`]; running out of time becomes
/// [`Error::Timeout`]. Poll errors from the API propagate as-is.
pub async fn wait_operation(
    api: &dyn CloudApi,
    mut op: Operation,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<Operation> {
    let started = tokio::time::Instant::now();
    loop {
        if op.done {
            match op.error.take() {
                Some(status) => {
                    return Err(Error::OperationFailed {
                        id: op.id,
                        message: status.message,
                    })
                }
                None => return Ok(op),
            }
        }

        let elapsed = started.elapsed();
        if elapsed >= timeout {
            warn!(operation_id = %op.id, timeout_secs = timeout.as_secs(), "operation wait timed out");
            return Err(Error::Timeout {
                seconds: timeout.as_secs(),
            });
        }

        tokio::time::sleep(poll_interval.min(timeout - elapsed)).await;
        op = api
            .get_operation(GetOperationRequest {
                operation_id: op.id.clone(),
            })
            .await?;
    }
}

/// Submit an operation, retrying with doubling backoff while the API
/// reports a conflicting operation on the same resource.
///
/// Only the submission is retried. Any other error, and a conflict
/// still present after the attempt budget, propagate to the caller.
pub async fn retry_conflicting_operation<F, Fut>(mut submit: F) -> Result<Operation>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Operation>>,
{
    let mut backoff = INITIAL_CONFLICT_BACKOFF;
    let mut attempt = 1;
    loop {
        match submit().await {
            Err(err) if err.is_conflict() && attempt < MAX_CONFLICT_ATTEMPTS => {
                debug!(attempt, backoff_ms = backoff.as_millis() as u64, "conflicting operation, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;

    struct PollingApi {
        polls_until_done: u32,
        polls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl CloudApi for PollingApi {
        async fn get_operation(&self, request: GetOperationRequest) -> Result<Operation> {
            let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if polls < self.polls_until_done {
                Ok(Operation::running(request.operation_id))
            } else if self.fail {
                Ok(Operation::failed(request.operation_id, 9, "disk quota exceeded"))
            } else {
                Ok(Operation::done(request.operation_id))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_until_done() {
        let api = PollingApi {
            polls_until_done: 3,
            polls: AtomicU32::new(0),
            fail: false,
        };
        let op = wait_operation(
            &api,
            Operation::running("op-1"),
            Duration::from_secs(1),
            Duration::from_secs(60),
        )
        .await
        .unwrap();
        assert!(op.done);
        assert_eq!(api.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn already_done_operation_is_not_polled() {
        let api = PollingApi {
            polls_until_done: 1,
            polls: AtomicU32::new(0),
            fail: false,
        };
        wait_operation(
            &api,
            Operation::done("op-1"),
            Duration::from_secs(1),
            Duration::from_secs(60),
        )
        .await
        .unwrap();
        assert_eq!(api.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_operation_surfaces_message() {
        let api = PollingApi {
            polls_until_done: 2,
            polls: AtomicU32::new(0),
            fail: true,
        };
        let err = wait_operation(
            &api,
            Operation::running("op-9"),
            Duration::from_secs(1),
            Duration::from_secs(60),
        )
        .await
        .unwrap_err();
        match err {
            Error::OperationFailed { id, message } => {
                assert_eq!(id, "op-9");
                assert!(message.contains("disk quota"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_on_operation_that_never_finishes() {
        let api = PollingApi {
            polls_until_done: u32::MAX,
            polls: AtomicU32::new(0),
            fail: false,
        };
        let err = wait_operation(
            &api,
            Operation::running("op-slow"),
            Duration::from_secs(1),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Timeout { seconds: 5 }));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_conflicts_then_succeeds() {
        let attempts = AtomicU32::new(0);
        let op = retry_conflicting_operation(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n <= 2 {
                    Err(Error::Conflict("cluster is busy".into()))
                } else {
                    Ok(Operation::done("op-3"))
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(op.id, "op-3");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_attempt_budget() {
        let attempts = AtomicU32::new(0);
        let err = retry_conflicting_operation(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Conflict("cluster is busy".into())) }
        })
        .await
        .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_CONFLICT_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_are_not_retried() {
        let attempts = AtomicU32::new(0);
        let err = retry_conflicting_operation(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::InvalidConfig("bad spec".into())) }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
