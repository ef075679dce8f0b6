//! Periodic notification refresh tied to the signed-in session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::NotificationCenter;
use crate::config::DEFAULT_NOTIFICATION_POLL_MS;

/// Refreshes a [`NotificationCenter`] on a fixed interval while active.
pub struct NotificationPoller {
    center: Arc<NotificationCenter>,
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationPoller {
    pub fn new(center: Arc<NotificationCenter>) -> Self {
        Self {
            center,
            interval: Duration::from_millis(DEFAULT_NOTIFICATION_POLL_MS),
            task: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn center(&self) -> &Arc<NotificationCenter> {
        &self.center
    }

    pub fn is_active(&self) -> bool {
        self.lock_task()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Fetch now, then on every interval until deactivated.
    pub fn activate(&self) {
        let mut task = self.lock_task();
        if task.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        tracing::info!("Notification polling every {:?}", self.interval);
        let center = Arc::clone(&self.center);
        let period = self.interval;
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Failures already emptied the collection and were logged
                let _ = center.refresh().await;
            }
        }));
    }

    /// Stop polling and clear the collection.
    ///
    /// A refresh still in flight is dropped and never touches the collection.
    pub fn deactivate(&self) {
        if let Some(task) = self.lock_task().take() {
            task.abort();
            tracing::info!("Notification polling stopped");
        }
        self.center.clear();
    }

    /// Activate while `signed_in` reads true and deactivate otherwise.
    ///
    /// The returned task ends, deactivating the poller, once the sender side
    /// is dropped.
    pub fn follow(self: &Arc<Self>, mut signed_in: watch::Receiver<bool>) -> JoinHandle<()> {
        let poller = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                if *signed_in.borrow_and_update() {
                    poller.activate();
                } else {
                    poller.deactivate();
                }
                if signed_in.changed().await.is_err() {
                    break;
                }
            }
            poller.deactivate();
        })
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for NotificationPoller {
    fn drop(&mut self) {
        self.deactivate();
    }
}
