//! Channel-driven event loop tying the controllers to their collaborators.
//!
//! Both state machines require every mutation to happen on one logical
//! thread. The loop here is that thread: item events, service callbacks,
//! resolved auto-open queries, and debounce expiries all funnel through a
//! single `tokio::select!`, so no two transitions ever run concurrently.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::controller::NotificationController;
use crate::coordinator::{DownloadStatus, ForegroundCoordinator, ServiceHost};
use crate::item::{ContentId, ItemState, OfflineItem};
use crate::surface::{AutoOpenPredicate, NotificationSurface};

/// Events delivered to the notification run loop.
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// A download is about to begin; no item is known yet.
    DownloadStarted,
    ItemsAdded(Vec<OfflineItem>),
    ItemUpdated(OfflineItem),
    ItemRemoved(ContentId),
    /// Completion reported by the platform download manager path; the
    /// loop resolves the auto-open query before ingesting it.
    ItemCompleted(OfflineItem),
    /// Auto-open query answered; re-enters the completion path.
    CompletionResolved { item: OfflineItem, auto_open: bool },
    UserCancelled,
    /// The keep-alive service finished binding.
    ServiceConnected,
    /// The keep-alive service went away.
    ServiceDisconnected,
}

/// Cloneable sender half used by event sources.
///
/// This is the observer seam: anything producing download events holds a
/// handle and notifies through it. Sends to a stopped loop are dropped.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<DownloadEvent>,
}

impl ControllerHandle {
    pub fn notify_download_started(&self) {
        let _ = self.tx.send(DownloadEvent::DownloadStarted);
    }

    pub fn notify_items_added(&self, items: Vec<OfflineItem>) {
        let _ = self.tx.send(DownloadEvent::ItemsAdded(items));
    }

    pub fn notify_item_updated(&self, item: OfflineItem) {
        let _ = self.tx.send(DownloadEvent::ItemUpdated(item));
    }

    pub fn notify_item_removed(&self, id: ContentId) {
        let _ = self.tx.send(DownloadEvent::ItemRemoved(id));
    }

    pub fn notify_item_completed(&self, item: OfflineItem) {
        let _ = self.tx.send(DownloadEvent::ItemCompleted(item));
    }

    pub fn notify_user_cancelled(&self) {
        let _ = self.tx.send(DownloadEvent::UserCancelled);
    }

    pub fn notify_service_connected(&self) {
        let _ = self.tx.send(DownloadEvent::ServiceConnected);
    }

    pub fn notify_service_disconnected(&self) {
        let _ = self.tx.send(DownloadEvent::ServiceDisconnected);
    }

    fn resolve_completion(&self, item: OfflineItem, auto_open: bool) {
        let _ = self
            .tx
            .send(DownloadEvent::CompletionResolved { item, auto_open });
    }
}

/// Creates the handle/receiver pair for a run loop.
#[must_use]
pub fn channel() -> (ControllerHandle, mpsc::UnboundedReceiver<DownloadEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ControllerHandle { tx }, rx)
}

/// Runs the notification loop until the token is cancelled or every
/// handle is dropped. Returns the controllers for inspection.
pub async fn run<S, H, P>(
    mut controller: NotificationController<S>,
    mut coordinator: ForegroundCoordinator<H>,
    auto_open: Arc<P>,
    handle: ControllerHandle,
    mut rx: mpsc::UnboundedReceiver<DownloadEvent>,
    shutdown: CancellationToken,
) -> (NotificationController<S>, ForegroundCoordinator<H>)
where
    S: NotificationSurface,
    H: ServiceHost,
    P: AutoOpenPredicate + 'static,
{
    loop {
        let deadline = controller.timer_deadline();
        tokio::select! {
            () = shutdown.cancelled() => break,
            event = rx.recv() => {
                let Some(event) = event else { break };
                dispatch(&mut controller, &mut coordinator, &auto_open, &handle, event);
            }
            () = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                if deadline.is_some() =>
            {
                controller.on_timer_fired();
            }
        }
    }
    (controller, coordinator)
}

fn dispatch<S, H, P>(
    controller: &mut NotificationController<S>,
    coordinator: &mut ForegroundCoordinator<H>,
    auto_open: &Arc<P>,
    handle: &ControllerHandle,
    event: DownloadEvent,
) where
    S: NotificationSurface,
    H: ServiceHost,
    P: AutoOpenPredicate + 'static,
{
    match event {
        DownloadEvent::DownloadStarted => controller.on_download_started(),
        DownloadEvent::ItemsAdded(items) => {
            for item in items {
                route_to_coordinator(coordinator, &item);
                controller.on_item_updated(item);
            }
        }
        DownloadEvent::ItemUpdated(item) => {
            route_to_coordinator(coordinator, &item);
            controller.on_item_updated(item);
        }
        DownloadEvent::ItemRemoved(id) => controller.on_item_removed(&id),
        DownloadEvent::ItemCompleted(item) => {
            // Resolve the async predicate off-loop; the answer re-enters
            // through the channel.
            let predicate = Arc::clone(auto_open);
            let handle = handle.clone();
            tokio::spawn(async move {
                let auto_open = predicate.will_auto_open(&item).await;
                handle.resolve_completion(item, auto_open);
            });
        }
        DownloadEvent::CompletionResolved { item, auto_open } => {
            route_to_coordinator(coordinator, &item);
            controller.on_download_item_completed(item, auto_open);
        }
        DownloadEvent::UserCancelled => controller.on_user_cancel(),
        DownloadEvent::ServiceConnected => coordinator.on_service_connected(),
        DownloadEvent::ServiceDisconnected => coordinator.on_service_disconnected(),
    }
}

/// Feeds item events carrying a platform notification id into the
/// service coordinator.
fn route_to_coordinator<H: ServiceHost>(
    coordinator: &mut ForegroundCoordinator<H>,
    item: &OfflineItem,
) {
    let Some(id) = item.notification_id else {
        return;
    };
    let status = status_for(item.state.normalized());
    coordinator.update_download_status(id, status, item.title.clone());
}

/// A download waiting on network (pending) still holds the service open.
const fn status_for(state: ItemState) -> DownloadStatus {
    match state {
        ItemState::InProgress | ItemState::Pending | ItemState::Interrupted => {
            DownloadStatus::InProgress
        }
        ItemState::Paused => DownloadStatus::Pause,
        ItemState::Complete => DownloadStatus::Complete,
        ItemState::Failed => DownloadStatus::Fail,
        ItemState::Cancelled => DownloadStatus::Cancel,
    }
}
