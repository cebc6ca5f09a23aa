//! Offline item model: identities, engine states, and visibility filtering.

use std::path::PathBuf;

/// Opaque identity of a download/offline item: a namespace plus an
/// engine-assigned id string. Stable across the item's whole lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId {
    pub namespace: String,
    pub id: String,
}

impl ContentId {
    /// Creates an identity from a namespace and an id string.
    #[must_use]
    pub fn new(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
        }
    }
}

/// State of a download/offline item as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    InProgress,
    Pending,
    Failed,
    Complete,
    Cancelled,
    Paused,
    /// Transient engine state; normalized to [`Pending`](Self::Pending)
    /// before anything is stored or counted.
    Interrupted,
}

impl ItemState {
    /// Maps `Interrupted` onto `Pending`. Every other state passes through.
    #[must_use]
    pub const fn normalized(self) -> Self {
        match self {
            Self::Interrupted => Self::Pending,
            other => other,
        }
    }
}

/// One observed download/offline item.
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineItem {
    pub id: ContentId,
    pub state: ItemState,
    pub title: String,
    /// Total size in bytes, 0 when not yet known.
    pub total_bytes: u64,
    /// Bytes received so far.
    pub received_bytes: u64,
    /// Whether the engine downloads this item over a parallel connection.
    pub is_accelerated: bool,
    pub is_transient: bool,
    pub is_off_the_record: bool,
    pub is_suggested: bool,
    /// Target path on disk; items without one never reach the UI.
    pub file_path: Option<PathBuf>,
    /// Platform notification id, when the engine shows one per item.
    pub notification_id: Option<u32>,
}

impl OfflineItem {
    /// Creates a freshly started in-progress item with the given identity
    /// and title. The target path defaults to the title; everything else
    /// starts at its negative default.
    #[must_use]
    pub fn new(id: ContentId, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id,
            state: ItemState::InProgress,
            file_path: Some(PathBuf::from(&title)),
            title,
            total_bytes: 0,
            received_bytes: 0,
            is_accelerated: false,
            is_transient: false,
            is_off_the_record: false,
            is_suggested: false,
            notification_id: None,
        }
    }

    /// Whether this item may drive the notification UI of a controller
    /// scoped to `off_the_record`.
    ///
    /// Transient and suggested items never show; items from the wrong
    /// profile scope never show; items without a resolvable target path
    /// never show.
    #[must_use]
    pub fn is_visible_to(&self, off_the_record: bool) -> bool {
        if self.is_transient || self.is_suggested {
            return false;
        }
        if self.is_off_the_record != off_the_record {
            return false;
        }
        self.file_path.is_some()
    }
}
