//! Trait seams toward the host UI and platform.

use async_trait::async_trait;

use crate::item::OfflineItem;
use crate::payload::NotificationPayload;

/// Receiver side of the notification UI.
///
/// Implementations render the payload however the host sees fit. All
/// methods default to no-ops so tests and headless embedders only
/// override what they observe.
pub trait NotificationSurface: Send {
    /// Called when a payload must be rendered on a fresh surface.
    fn create(&mut self, _payload: &NotificationPayload) {}

    /// Called when the shown surface should display a new payload in place.
    fn update(&mut self, _payload: &NotificationPayload) {}

    /// Called when nothing should be shown anymore.
    fn close(&mut self) {}
}

/// A surface that renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl NotificationSurface for NullSurface {}

/// Decides whether the platform will open a finished download by itself,
/// in which case no completion notification is shown for it.
#[async_trait]
pub trait AutoOpenPredicate: Send + Sync {
    async fn will_auto_open(&self, item: &OfflineItem) -> bool;
}

/// Predicate that never auto-opens.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverAutoOpen;

#[async_trait]
impl AutoOpenPredicate for NeverAutoOpen {
    async fn will_auto_open(&self, _item: &OfflineItem) -> bool {
        false
    }
}
