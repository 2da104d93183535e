//! The poll scheduler: an explicit timer-and-wake loop instead of ambient
//! timers, so its lifecycle is scoped and tests can drive poll cycles
//! directly through the reconciler.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::client::ReportsBackend;

use super::reconciler::TriageReconciler;

/// Drives the reconciler on a fixed interval, with an out-of-band wake for
/// focus-regain and post-mutation triggers. The first poll fires
/// immediately (the mount trigger).
pub struct PollScheduler {
    wake: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl PollScheduler {
    pub fn start<B>(reconciler: TriageReconciler<B>, interval: Duration) -> Self
    where
        B: ReportsBackend + 'static,
    {
        let wake = Arc::new(Notify::new());
        let waker = Arc::clone(&wake);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = waker.notified() => debug!("scheduler woken early"),
                }
                // A tick while a poll is in flight falls through to
                // `begin_poll`, which skips it.
                reconciler.poll_once().await;
            }
        });
        Self {
            wake,
            handle: Some(handle),
        }
    }

    /// External trigger: the view regained focus, or a mutation invalidated
    /// the collection.
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    /// Handle for components that need to wake the loop without owning the
    /// scheduler, e.g. the mutation guard.
    pub fn wake_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
