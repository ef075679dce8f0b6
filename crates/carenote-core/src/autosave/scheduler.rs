//! Single-slot delayed task scheduler.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Holds at most one pending delayed task.
///
/// Scheduling replaces (aborts) the pending task, so only the last task of
/// a burst ever fires. Once the delay expires the task body is detached
/// into its own tokio task: cancelling the slot stops timers, never work
/// that already started.
#[derive(Debug, Default)]
pub struct DebounceSlot {
    pending: Option<JoinHandle<()>>,
    closed: bool,
}

impl DebounceSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay` unless rescheduled or cancelled first.
    pub fn schedule<F>(&mut self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.closed {
            return;
        }
        self.cancel();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(task);
        }));
    }

    /// Drop the pending task. Returns whether one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancel the pending task and refuse further scheduling.
    pub fn close(&mut self) {
        self.closed = true;
        self.cancel();
    }
}

impl Drop for DebounceSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task(counter: &Arc<AtomicUsize>, value: usize) -> impl Future<Output = ()> {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(value, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_pending_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut slot = DebounceSlot::new();

        slot.schedule(Duration::from_millis(100), counting_task(&counter, 1));
        tokio::time::sleep(Duration::from_millis(50)).await;
        slot.schedule(Duration::from_millis(100), counting_task(&counter, 10));
        assert!(slot.is_pending());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert!(!slot.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_slot_never_fires() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut slot = DebounceSlot::new();

        slot.schedule(Duration::from_millis(100), counting_task(&counter, 1));
        slot.close();
        slot.schedule(Duration::from_millis(100), counting_task(&counter, 1));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_slot_cancels_timer() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let mut slot = DebounceSlot::new();
            slot.schedule(Duration::from_millis(100), counting_task(&counter, 1));
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
