//! Remote-condition polling.
//!
//! `StateChangeConf` blocks the calling operation until a remote object
//! reaches one of the target states: provisioning-state waits after
//! PUT/DELETE, and the Domain Services wait for replica sets to report
//! enough domain controllers. Cancellation from the plugin context and the
//! configured timeout both end the wait.

use crate::api::ApiError;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tfkit::Context;
use thiserror::Error;

pub type RefreshResult<T> = Result<(T, String), ApiError>;

/// Async refresh function returning the current value and its state label.
pub type RefreshFn<T> =
    Box<dyn Fn() -> Pin<Box<dyn Future<Output = RefreshResult<T>> + Send>> + Send + Sync>;

pub struct StateChangeConf<T> {
    /// States the object may pass through while we keep waiting.
    pub pending: Vec<String>,
    /// States that end the wait successfully.
    pub target: Vec<String>,
    pub refresh: RefreshFn<T>,
    /// Wait before the first refresh; freshly issued PUTs often 404 or show
    /// stale state for a few seconds.
    pub delay: Duration,
    pub poll_interval: Duration,
    pub timeout: Duration,
    /// Consecutive not-found responses tolerated before giving up; covers
    /// eventual consistency right after create.
    pub not_found_checks: u32,
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("timed out waiting for state to become one of {target:?}, last state was {last:?}")]
    Timeout { target: Vec<String>, last: String },

    #[error("unexpected state {state:?}, wanted one of {target:?}")]
    UnexpectedState { state: String, target: Vec<String> },

    #[error("object was not found while waiting")]
    NotFound,

    #[error("wait was cancelled")]
    Cancelled,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl<T> StateChangeConf<T> {
    pub async fn wait_for_state(self, ctx: &Context) -> Result<T, PollError> {
        let started = Instant::now();
        let mut done = ctx.done();
        let mut last_state = String::new();
        let mut not_found = 0u32;

        if !self.delay.is_zero() {
            sleep_or_cancel(self.delay, &mut done).await?;
        }

        loop {
            if started.elapsed() > self.timeout {
                return Err(PollError::Timeout {
                    target: self.target,
                    last: last_state,
                });
            }

            match (self.refresh)().await {
                Ok((value, state)) => {
                    tracing::debug!(state = %state, "poll refresh");
                    not_found = 0;

                    if self.target.iter().any(|t| t == &state) {
                        return Ok(value);
                    }
                    if !self.pending.iter().any(|p| p == &state) {
                        return Err(PollError::UnexpectedState {
                            state,
                            target: self.target,
                        });
                    }
                    last_state = state;
                }
                Err(e) if e.was_not_found() => {
                    not_found += 1;
                    if not_found > self.not_found_checks {
                        return Err(PollError::NotFound);
                    }
                    tracing::debug!(checks = not_found, "object not found yet, still waiting");
                }
                Err(e) => return Err(PollError::Api(e)),
            }

            sleep_or_cancel(self.poll_interval, &mut done).await?;
        }
    }
}

async fn sleep_or_cancel(
    duration: Duration,
    done: &mut tokio::sync::watch::Receiver<bool>,
) -> Result<(), PollError> {
    tokio::select! {
        _ = tokio::time::sleep(duration) => Ok(()),
        changed = done.changed() => {
            if changed.is_ok() && *done.borrow() {
                Err(PollError::Cancelled)
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn conf(refresh: RefreshFn<u32>, pending: &[&str], target: &[&str]) -> StateChangeConf<u32> {
        StateChangeConf {
            pending: pending.iter().map(|s| s.to_string()).collect(),
            target: target.iter().map(|s| s.to_string()).collect(),
            refresh,
            delay: Duration::ZERO,
            poll_interval: Duration::from_millis(5),
            timeout: Duration::from_secs(2),
            not_found_checks: 2,
        }
    }

    #[tokio::test]
    async fn reaches_target_after_pending_states() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let refresh: RefreshFn<u32> = Box::new(move || {
            let counter = counter.clone();
            Box::pin(async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let state = if n < 3 { "Updating" } else { "Succeeded" };
                Ok((n, state.to_string()))
            })
        });

        let result = conf(refresh, &["Updating"], &["Succeeded"])
            .wait_for_state(&Context::new())
            .await
            .unwrap();
        assert_eq!(result, 3);
    }

    #[tokio::test]
    async fn unexpected_state_fails_fast() {
        let refresh: RefreshFn<u32> =
            Box::new(|| Box::pin(async { Ok((0, "Failed".to_string())) }));

        let err = conf(refresh, &["Updating"], &["Succeeded"])
            .wait_for_state(&Context::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::UnexpectedState { state, .. } if state == "Failed"));
    }

    #[tokio::test]
    async fn tolerates_a_few_not_found_responses() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let refresh: RefreshFn<u32> = Box::new(move || {
            let counter = counter.clone();
            Box::pin(async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(ApiError::Cloud {
                        status: 404,
                        code: "ResourceNotFound".to_string(),
                        message: String::new(),
                    })
                } else {
                    Ok((n, "Succeeded".to_string()))
                }
            })
        });

        let result = conf(refresh, &[], &["Succeeded"])
            .wait_for_state(&Context::new())
            .await
            .unwrap();
        assert_eq!(result, 2);
    }

    #[tokio::test]
    async fn gives_up_after_too_many_not_found() {
        let refresh: RefreshFn<u32> = Box::new(|| {
            Box::pin(async {
                Err(ApiError::Cloud {
                    status: 404,
                    code: "ResourceNotFound".to_string(),
                    message: String::new(),
                })
            })
        });

        let err = conf(refresh, &[], &["Succeeded"])
            .wait_for_state(&Context::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::NotFound));
    }

    #[tokio::test]
    async fn cancellation_ends_the_wait() {
        let refresh: RefreshFn<u32> =
            Box::new(|| Box::pin(async { Ok((0, "Updating".to_string())) }));

        let ctx = Context::new();
        let cancel_ctx = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel_ctx.cancel();
        });

        let mut c = conf(refresh, &["Updating"], &["Succeeded"]);
        c.timeout = Duration::from_secs(30);
        let err = c.wait_for_state(&ctx).await.unwrap_err();
        assert!(matches!(err, PollError::Cancelled));
    }

    #[tokio::test]
    async fn times_out_with_last_state() {
        let refresh: RefreshFn<u32> =
            Box::new(|| Box::pin(async { Ok((0, "Updating".to_string())) }));

        let mut c = conf(refresh, &["Updating"], &["Succeeded"]);
        c.timeout = Duration::from_millis(30);
        let err = c.wait_for_state(&Context::new()).await.unwrap_err();
        assert!(matches!(err, PollError::Timeout { last, .. } if last == "Updating"));
    }
}
