//! Notification list with optimistic read markers.

mod poller;

use std::sync::Arc;

use crate::api::NotificationsApi;
use crate::collection::OptimisticCollection;
use crate::config::DEFAULT_NOTIFICATION_PAGE_SIZE;
use crate::models::{NotificationId, NotificationItem};
use crate::Result;

pub use poller::NotificationPoller;

/// Owns the notification collection and the calls that change it.
pub struct NotificationCenter {
    api: Arc<dyn NotificationsApi>,
    items: OptimisticCollection<NotificationItem>,
    page_size: u32,
}

impl NotificationCenter {
    pub fn new(api: Arc<dyn NotificationsApi>) -> Self {
        Self {
            api,
            items: OptimisticCollection::new(),
            page_size: DEFAULT_NOTIFICATION_PAGE_SIZE,
        }
    }

    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Shared handle to the underlying collection.
    pub fn items(&self) -> OptimisticCollection<NotificationItem> {
        self.items.clone()
    }

    pub fn snapshot(&self) -> Vec<NotificationItem> {
        self.items.snapshot()
    }

    /// Number of unread notifications in the current collection.
    pub fn unread_count(&self) -> usize {
        self.items.count(|item| !item.read)
    }

    /// Fetch the first page and replace the collection with it.
    ///
    /// On failure the collection is emptied and the error returned.
    pub async fn refresh(&self) -> Result<()> {
        match self.api.fetch_notifications(1, self.page_size).await {
            Ok(page) => {
                tracing::debug!("Fetched {} notifications", page.items.len());
                self.items.replace_all(page.items);
                Ok(())
            }
            Err(error) => {
                tracing::warn!("Failed to fetch notifications: {error}");
                self.items.clear();
                Err(error)
            }
        }
    }

    /// Mark one notification as read.
    ///
    /// The local flag flips before the request is sent and is not rolled
    /// back when the request fails.
    pub async fn mark_read(&self, id: NotificationId) {
        if !self.items.update(&id, |item| item.read = true) {
            tracing::debug!("Notification {id} not in the current list");
        }
        self.send_read(&[id]).await;
    }

    /// Mark every unread notification as read. Returns how many changed.
    pub async fn mark_all_read(&self) -> usize {
        let ids = self
            .items
            .update_where(|item| !std::mem::replace(&mut item.read, true));
        if !ids.is_empty() {
            self.send_read(&ids).await;
        }
        ids.len()
    }

    /// Drop the collection, as on sign-out.
    pub fn clear(&self) {
        self.items.clear();
    }

    async fn send_read(&self, ids: &[NotificationId]) {
        if let Err(error) = self.api.mark_notifications_read(ids).await {
            tracing::warn!("Failed to mark notifications {ids:?} as read: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeApi;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn center_with(items: Vec<NotificationItem>) -> (Arc<FakeApi>, Arc<NotificationCenter>) {
        let api = Arc::new(FakeApi::new());
        api.set_notifications(items);
        let center = Arc::new(NotificationCenter::new(api.clone()));
        (api, center)
    }

    #[tokio::test]
    async fn refresh_replaces_collection() {
        let (api, center) = center_with(vec![NotificationItem::new(1, false)]);
        center.refresh().await.unwrap();
        assert_eq!(center.unread_count(), 1);

        api.set_notifications(vec![NotificationItem::new(2, true)]);
        center.refresh().await.unwrap();
        assert_eq!(center.snapshot(), vec![NotificationItem::new(2, true)]);
        assert_eq!(center.unread_count(), 0);
    }

    #[tokio::test]
    async fn failed_refresh_empties_collection() {
        let (api, center) = center_with(vec![NotificationItem::new(1, false)]);
        center.refresh().await.unwrap();

        api.set_fail_fetches(true);
        assert!(center.refresh().await.is_err());
        assert!(center.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn mark_read_updates_count_before_network_resolves() {
        let (api, center) = center_with(vec![NotificationItem::new(1, false)]);
        center.refresh().await.unwrap();
        api.hold();

        let task = tokio::spawn({
            let center = Arc::clone(&center);
            async move { center.mark_read(1).await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(center.unread_count(), 0);
        assert!(api.marked_read.lock().unwrap().is_empty());

        api.release();
        task.await.unwrap();
        assert_eq!(*api.marked_read.lock().unwrap(), vec![vec![1]]);
    }

    #[tokio::test]
    async fn failed_mark_read_keeps_local_flag_until_refresh() {
        let (api, center) = center_with(vec![NotificationItem::new(1, false)]);
        center.refresh().await.unwrap();
        api.set_fail_writes(true);

        center.mark_read(1).await;
        assert_eq!(center.unread_count(), 0);

        // Server never recorded the read marker
        center.refresh().await.unwrap();
        assert_eq!(center.unread_count(), 1);
    }

    #[tokio::test]
    async fn mark_all_read_sends_only_unread_ids() {
        let (api, center) = center_with(vec![
            NotificationItem::new(1, false),
            NotificationItem::new(2, true),
            NotificationItem::new(3, false),
        ]);
        center.refresh().await.unwrap();

        assert_eq!(center.mark_all_read().await, 2);
        assert_eq!(center.unread_count(), 0);
        assert_eq!(*api.marked_read.lock().unwrap(), vec![vec![1, 3]]);

        assert_eq!(center.mark_all_read().await, 0);
        assert_eq!(api.marked_read.lock().unwrap().len(), 1);
    }
}
