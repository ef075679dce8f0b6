use std::sync::Arc;
use std::time::Duration;

use carenote_core::api::NotificationsApi;
use carenote_core::notifications::{NotificationCenter, NotificationPoller};

use crate::commands::common::format_notification_lines;
use crate::error::CliError;

pub async fn run_notifications(
    api: Arc<dyn NotificationsApi>,
    page_size: u32,
    mark_all_read: bool,
    as_json: bool,
) -> Result<(), CliError> {
    let center = NotificationCenter::new(api).with_page_size(page_size);
    center.refresh().await?;

    if mark_all_read {
        let marked = center.mark_all_read().await;
        tracing::info!("Marked {marked} notifications as read");
    }

    print_notifications(&center, as_json)?;
    Ok(())
}

/// Poll until interrupted, printing the list after every refresh.
pub async fn run_watch_notifications(
    api: Arc<dyn NotificationsApi>,
    page_size: u32,
    interval: Duration,
    as_json: bool,
) -> Result<(), CliError> {
    let center = Arc::new(NotificationCenter::new(api).with_page_size(page_size));
    let poller = NotificationPoller::new(Arc::clone(&center)).with_interval(interval);
    poller.activate();

    // Print slightly after each poll so the refresh has landed
    let mut printer = tokio::time::interval_at(
        tokio::time::Instant::now() + Duration::from_millis(500),
        interval,
    );
    loop {
        tokio::select! {
            _ = printer.tick() => print_notifications(&center, as_json)?,
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
        }
    }

    poller.deactivate();
    Ok(())
}

fn print_notifications(center: &NotificationCenter, as_json: bool) -> Result<(), CliError> {
    let items = center.snapshot();
    if as_json {
        println!("{}", serde_json::to_string(&items)?);
        return Ok(());
    }

    println!("{} unread", center.unread_count());
    for line in format_notification_lines(&items) {
        println!("{line}");
    }
    Ok(())
}
