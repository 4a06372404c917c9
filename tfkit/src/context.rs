//! Request-scoped context: cancellation, deadlines, request ids.
//!
//! Every trait method on providers, resources and data sources receives a
//! Context as its first parameter. Long-running operations (remote polling
//! in particular) must watch `done()` so Terraform's Ctrl-C propagates.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time;
use uuid::Uuid;

#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    request_id: Uuid,
    deadline: Option<Instant>,
    done: watch::Receiver<bool>,
    done_tx: watch::Sender<bool>,
}

impl Context {
    pub fn new() -> Self {
        let (done_tx, done_rx) = watch::channel(false);

        Self {
            inner: Arc::new(ContextInner {
                request_id: Uuid::new_v4(),
                deadline: None,
                done: done_rx,
                done_tx,
            }),
        }
    }

    /// A child context that cancels itself once `timeout` elapses.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        let (done_tx, done_rx) = watch::channel(false);

        let timeout_tx = done_tx.clone();
        tokio::spawn(async move {
            time::sleep_until(deadline.into()).await;
            let _ = timeout_tx.send(true);
        });

        Self {
            inner: Arc::new(ContextInner {
                request_id: self.inner.request_id,
                deadline: Some(deadline),
                done: done_rx,
                done_tx,
            }),
        }
    }

    /// Correlates log lines across one plugin RPC.
    pub fn request_id(&self) -> Uuid {
        self.inner.request_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.done.borrow()
    }

    /// Channel that flips to `true` when work on behalf of this context
    /// should stop.
    pub fn done(&self) -> watch::Receiver<bool> {
        self.inner.done.clone()
    }

    pub fn cancel(&self) {
        let _ = self.inner.done_tx.send(true);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn timeout_cancels_context() {
        let ctx = Context::new().with_timeout(Duration::from_millis(50));
        assert!(!ctx.is_cancelled());

        sleep(Duration::from_millis(100)).await;
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn manual_cancel_flips_done() {
        let ctx = Context::new();
        let mut done = ctx.done();

        ctx.cancel();
        done.changed().await.unwrap();
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn deadline_only_set_with_timeout() {
        let ctx = Context::new();
        assert!(ctx.deadline().is_none());
        assert!(ctx.with_timeout(Duration::from_secs(1)).deadline().is_some());
    }

    #[test]
    fn request_id_is_stable_across_clones() {
        let ctx = Context::new();
        let clone = ctx.clone();
        assert_eq!(ctx.request_id(), clone.request_id());
    }
}
