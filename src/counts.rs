//! Aggregate per-state counts over the tracked item set.

use crate::item::{ItemState, OfflineItem};

/// Snapshot of how many tracked items sit in each countable state.
///
/// Also used to detect when the notification surface must be recreated:
/// two payloads whose snapshots differ belong to different download sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadCounts {
    pub in_progress: usize,
    pub pending: usize,
    pub failed: usize,
    pub completed: usize,
}

impl DownloadCounts {
    /// Tallies the tracked items.
    ///
    /// Paused, interrupted, and cancelled items never reach the tally:
    /// paused items are evicted at ingest, interrupted ones are normalized
    /// to pending, and cancelled ones are removed. Seeing one here is a
    /// programmer error.
    #[must_use]
    pub fn tally(items: &[OfflineItem]) -> Self {
        let mut counts = Self::default();
        for item in items {
            match item.state {
                ItemState::InProgress => counts.in_progress += 1,
                ItemState::Pending => counts.pending += 1,
                ItemState::Failed => counts.failed += 1,
                ItemState::Complete => counts.completed += 1,
                state @ (ItemState::Cancelled | ItemState::Paused | ItemState::Interrupted) => {
                    debug_assert!(false, "untrackable state {state:?} reached the tally");
                    log::error!("ignoring tracked item in untrackable state {state:?}");
                }
            }
        }
        counts
    }

    /// True when at least one item has reached a result state.
    #[must_use]
    pub const fn has_result(&self) -> bool {
        self.pending + self.failed + self.completed > 0
    }
}
