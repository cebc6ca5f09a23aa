//! dlbar - download progress aggregation and notification state machine.
//!
//! Multiplexes concurrent download/offline-item events into a single
//! coherent, debounced notification surface, and independently keeps a
//! process-level keep-alive service bound exactly while a download is
//! active. Rendering, the downloads themselves, and the platform service
//! all live behind trait seams; this crate owns only the state machines.
//!
//! # Example
//!
//! ```
//! use dlbar::{ContentId, ControllerState, NotificationController, NotifyConfig, OfflineItem};
//!
//! let mut controller = NotificationController::new(false, NotifyConfig::default());
//! controller.on_download_started();
//!
//! let item = OfflineItem::new(ContentId::new("download", "42"), "report.pdf");
//! controller.on_item_updated(item);
//!
//! assert_eq!(controller.state(), ControllerState::Downloading);
//! assert_eq!(controller.counts().in_progress, 1);
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod controller;
pub mod coordinator;
pub mod counts;
pub mod error;
pub mod format;
pub mod item;
pub mod payload;
pub mod runtime;
pub mod surface;

// Re-export main types for convenience
pub use config::NotifyConfig;
pub use controller::{ControllerState, NotificationController, PendingTimer};
pub use coordinator::{
    DownloadStatus, ForegroundCoordinator, NullServiceHost, ServiceHost, StatusUpdate,
};
pub use counts::DownloadCounts;
pub use error::{Error, Result};
pub use format::{format_bytes, format_duration};
pub use item::{ContentId, ItemState, OfflineItem};
pub use payload::{IconKind, LinkText, NotificationPayload, ResultState};
pub use runtime::{ControllerHandle, DownloadEvent, channel, run};
pub use surface::{AutoOpenPredicate, NeverAutoOpen, NotificationSurface, NullSurface};
