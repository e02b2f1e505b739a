//! Cancellation and deadline signal threaded through model calls.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cheap-to-clone handle: every clone observes the same cancel flag.
#[derive(Debug, Clone, Default)]
pub struct Context {
    state: Arc<CancelState>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled unless [`Context::cancel`] is called.
    pub fn background() -> Self { Self::default() }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self { state: Arc::default(), deadline: Some(deadline) }
    }

    pub fn deadline(&self) -> Option<Instant> { self.deadline }

    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Returns `Err(Error::Cancelled)` once cancelled or past the deadline.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() { Err(Error::Cancelled) } else { Ok(()) }
    }

    /// Resolves when the context is cancelled or its deadline passes.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel() is not missed.
            let notified = self.state.notify.notified();
            if self.is_cancelled() {
                return;
            }
            match self.deadline {
                Some(deadline) => tokio::select! {
                    () = notified => {}
                    () = tokio::time::sleep_until(deadline) => return,
                },
                None => notified.await,
            }
        }
    }

    /// Drives `fut` unless the context is cancelled first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            () = self.cancelled() => Err(Error::Cancelled),
            out = fut => out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_interrupts_pending_future() {
        let ctx = Context::background();
        let other = ctx.clone();
        let handle = tokio::spawn(async move {
            other.run(async { never().await }).await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        ctx.cancel();
        let out = handle.await.expect("join");
        assert_eq!(out, Err(Error::Cancelled));
    }

    #[tokio::test]
    async fn deadline_expires() {
        let ctx = Context::with_timeout(Duration::from_millis(5));
        let out: Result<()> = ctx.run(never()).await;
        assert_eq!(out, Err(Error::Cancelled));
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn completed_future_passes_through() {
        let ctx = Context::background();
        assert_eq!(ctx.run(async { Ok(7) }).await, Ok(7));
    }

    async fn never() -> Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}
