//! The notification state machine.
//!
//! Ingests per-item download events, aggregates them into per-state
//! counts, and drives a single debounced notification surface through
//! four display states. All mutation happens synchronously inside the
//! event entry points; the only asynchrony is the debounce timer, whose
//! expiry the owner delivers back via [`NotificationController::on_timer_fired`].

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::NotifyConfig;
use crate::counts::DownloadCounts;
use crate::format::format_bytes;
use crate::item::{ContentId, ItemState, OfflineItem};
use crate::payload::{IconKind, LinkText, NotificationPayload, ResultState};
use crate::surface::{NotificationSurface, NullSurface};

/// Top-level display state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Nothing tracked, nothing shown.
    Initial,
    /// At least one download is running; progress presentation.
    Downloading,
    /// A result (complete/failed/pending) is on screen.
    ShowResult,
    /// The user dismissed the surface; stay quiet until a new download.
    Cancelled,
}

/// The single scheduled self-transition.
#[derive(Debug, Clone, Copy)]
pub struct PendingTimer {
    /// When the transition fires.
    pub deadline: Instant,
    /// The scheduled duration.
    pub duration: Duration,
}

/// Concrete presentation resolved for the downloading/show-result states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubState {
    InProgress,
    Result(ResultState),
}

const fn result_item_state(result: ResultState) -> ItemState {
    match result {
        ResultState::Complete => ItemState::Complete,
        ResultState::Failed => ItemState::Failed,
        ResultState::Pending => ItemState::Pending,
    }
}

/// Aggregates concurrent download events into one notification surface.
///
/// One controller exists per profile scope (regular vs off-the-record);
/// events for the other scope are dropped by the visibility filter.
pub struct NotificationController<S: NotificationSurface = NullSurface> {
    off_the_record: bool,
    config: NotifyConfig,
    state: ControllerState,
    /// Tracked items in insertion order; identity lookup by linear scan.
    items: Vec<OfflineItem>,
    /// Identities ever observed in progress. Distinguishes brand-new
    /// downloads from resumed or updated ones. Never shrinks.
    seen: HashSet<ContentId>,
    /// Paused identities; events for these are dropped until removal.
    ignored: HashSet<ContentId>,
    accelerating: bool,
    /// Result sub-state currently on screen (sticky across rebuilds).
    shown_result: Option<ResultState>,
    current: Option<NotificationPayload>,
    timer: Option<PendingTimer>,
    surface: S,
}

impl NotificationController<NullSurface> {
    /// Creates a controller that renders nothing.
    #[must_use]
    pub fn new(off_the_record: bool, config: NotifyConfig) -> Self {
        Self::with_surface(off_the_record, config, NullSurface)
    }
}

impl<S: NotificationSurface> NotificationController<S> {
    /// Creates a controller rendering onto the given surface.
    #[must_use]
    pub fn with_surface(off_the_record: bool, config: NotifyConfig, surface: S) -> Self {
        Self {
            off_the_record,
            config,
            state: ControllerState::Initial,
            items: Vec::new(),
            seen: HashSet::new(),
            ignored: HashSet::new(),
            accelerating: false,
            shown_result: None,
            current: None,
            timer: None,
            surface,
        }
    }

    /// Current display state.
    #[must_use]
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    /// Whether the accelerating animation is active.
    #[must_use]
    pub const fn is_accelerating(&self) -> bool {
        self.accelerating
    }

    /// Per-state counts over the currently tracked items.
    #[must_use]
    pub fn counts(&self) -> DownloadCounts {
        DownloadCounts::tally(&self.items)
    }

    /// The currently displayed payload, if any.
    #[must_use]
    pub const fn current_payload(&self) -> Option<&NotificationPayload> {
        self.current.as_ref()
    }

    /// The pending debounce timer, if any.
    #[must_use]
    pub const fn pending_timer(&self) -> Option<&PendingTimer> {
        self.timer.as_ref()
    }

    /// Deadline of the pending debounce timer, if any.
    #[must_use]
    pub fn timer_deadline(&self) -> Option<Instant> {
        self.timer.map(|t| t.deadline)
    }

    /// The tracked items, in insertion order.
    #[must_use]
    pub fn tracked(&self) -> &[OfflineItem] {
        &self.items
    }

    /// The rendering surface.
    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access to the rendering surface.
    pub const fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Signals that a download is about to begin, before any item exists.
    pub fn on_download_started(&mut self) {
        self.compute_next_step(None, true, false, false);
    }

    /// Ingests a batch of newly observed items.
    pub fn on_items_added(&mut self, items: Vec<OfflineItem>) {
        for item in items {
            self.on_item_updated(item);
        }
    }

    /// Ingests an item update from the event source.
    ///
    /// Invisible items are dropped; interrupted items are stored as
    /// pending; cancelled items are treated as removals.
    pub fn on_item_updated(&mut self, mut item: OfflineItem) {
        if !item.is_visible_to(self.off_the_record) {
            return;
        }
        item.state = item.state.normalized();
        if item.state == ItemState::Cancelled {
            let id = item.id;
            self.on_item_removed(&id);
            return;
        }
        self.compute_next_step(Some(item), false, false, false);
    }

    /// Ingests an item removal.
    pub fn on_item_removed(&mut self, id: &ContentId) {
        self.ignored.remove(id);
        let before = self.items.len();
        self.items.retain(|it| it.id != *id);
        if self.items.len() != before {
            self.compute_next_step(None, false, false, true);
        }
    }

    /// Completion reported by the platform download manager path.
    ///
    /// When the platform will open the file itself there is nothing to
    /// show; the item is dropped instead of displayed.
    pub fn on_download_item_completed(&mut self, item: OfflineItem, will_auto_open: bool) {
        if will_auto_open {
            self.on_item_removed(&item.id);
            return;
        }
        self.on_item_updated(item);
    }

    /// Applies the user's dismissal of the surface.
    pub fn on_user_cancel(&mut self) {
        self.compute_next_step(None, false, true, false);
    }

    /// Debounce timer expiry: ends the accelerating animation or retires
    /// the displayed result, then lets the machine decide from whatever
    /// remains tracked.
    pub fn on_timer_fired(&mut self) {
        self.timer = None;
        self.accelerating = false;
        let shown = self.shown_result.take();

        let mut purged = false;
        if self.state == ControllerState::ShowResult
            && let Some(result) = shown
        {
            let retired = result_item_state(result);
            let before = self.items.len();
            self.items.retain(|it| it.state != retired);
            purged = self.items.len() != before;
        }

        self.compute_next_step(None, false, false, purged);
    }

    /// The single state-transition function. Every ingestion entry point
    /// funnels through here; `user_cancel` overrides the computed state
    /// unconditionally.
    fn compute_next_step(
        &mut self,
        item: Option<OfflineItem>,
        force_start: bool,
        user_cancel: bool,
        removed: bool,
    ) {
        if let Some(ref it) = item
            && self.ignored.contains(&it.id)
        {
            // Paused identities stay silent until they resume.
            if it.state != ItemState::InProgress {
                return;
            }
            self.ignored.remove(&it.id);
        }

        let is_new_download = force_start
            || item.as_ref().is_some_and(|it| {
                it.state == ItemState::InProgress && !self.seen.contains(&it.id)
            });

        let mut was_paused = false;
        let mut resumed_from_pending = false;
        let mut new_item_accelerated = false;

        if let Some(it) = item {
            let id = it.id.clone();
            let state = it.state;
            new_item_accelerated = it.is_accelerated;

            let previous = self.upsert(it);
            self.seen.insert(id.clone());

            if state == ItemState::Paused {
                was_paused = true;
                self.items.retain(|t| t.id != id);
                self.ignored.insert(id);
            }

            resumed_from_pending = self.shown_result == Some(ResultState::Pending)
                && previous == Some(ItemState::Pending)
                && state == ItemState::InProgress;
        }

        let counts = DownloadCounts::tally(&self.items);
        let should_show_result = counts.has_result();

        let mut accelerating = self.accelerating;
        if is_new_download {
            // Only the very first download of a burst animates; a second
            // concurrent one ends the single-item animation.
            accelerating = new_item_accelerated && counts.in_progress == 1;
        }

        let mut next = self.state;
        match self.state {
            ControllerState::Initial | ControllerState::Cancelled => {
                if is_new_download {
                    next = ControllerState::Downloading;
                } else if should_show_result {
                    next = ControllerState::ShowResult;
                }
            }
            ControllerState::Downloading => {
                if should_show_result {
                    next = ControllerState::ShowResult;
                } else if (was_paused || removed) && counts.in_progress == 0 {
                    next = ControllerState::Initial;
                }
            }
            ControllerState::ShowResult => {
                if is_new_download {
                    next = ControllerState::Downloading;
                } else if !should_show_result {
                    if self.timer.is_none() && counts.in_progress > 0 {
                        next = ControllerState::Downloading;
                    }
                    if resumed_from_pending {
                        next = ControllerState::Downloading;
                    }
                    if removed && self.items.is_empty() {
                        next = ControllerState::Initial;
                    }
                }
            }
        }

        if user_cancel {
            next = ControllerState::Cancelled;
        }

        self.move_to_state(next, accelerating);
    }

    fn move_to_state(&mut self, next: ControllerState, accelerating: bool) {
        match next {
            ControllerState::Initial | ControllerState::Cancelled => {
                self.current = None;
                self.shown_result = None;
                self.timer = None;
                self.accelerating = false;
                self.surface.close();
                if next == ControllerState::Initial {
                    self.items.clear();
                } else {
                    // A dismissal must not lose live downloads.
                    self.items.retain(|it| it.state == ItemState::InProgress);
                }
            }
            ControllerState::Downloading | ControllerState::ShowResult => {
                let sub = self.resolve_sub_state(next);
                self.accelerating = accelerating;
                if let Some(sub) = sub {
                    self.present(sub);
                }
            }
        }
        self.state = next;
    }

    /// Picks the concrete presentation for the target state.
    ///
    /// Results resolve by priority: complete first (shown immediately),
    /// else whatever result is already on screen while items remain in
    /// it, else the oldest still-tracked failed/pending item.
    fn resolve_sub_state(&self, next: ControllerState) -> Option<SubState> {
        match next {
            ControllerState::Downloading => Some(SubState::InProgress),
            ControllerState::ShowResult => {
                let counts = DownloadCounts::tally(&self.items);
                if counts.completed > 0 {
                    return Some(SubState::Result(ResultState::Complete));
                }
                if let Some(shown) = self.shown_result
                    && self
                        .items
                        .iter()
                        .any(|it| it.state == result_item_state(shown))
                {
                    return Some(SubState::Result(shown));
                }
                self.items.iter().find_map(|it| match it.state {
                    ItemState::Failed => Some(SubState::Result(ResultState::Failed)),
                    ItemState::Pending => Some(SubState::Result(ResultState::Pending)),
                    _ => None,
                })
            }
            ControllerState::Initial | ControllerState::Cancelled => None,
        }
    }

    /// Builds, dedups, and shows the payload for the resolved sub-state,
    /// then schedules the matching debounce timer.
    fn present(&mut self, sub: SubState) {
        let payload = self.build_payload(sub);

        if let Some(ref current) = self.current
            && *current == payload
        {
            // Identical payload; leave the surface and the timer alone.
            return;
        }

        let force_reparent = self
            .current
            .as_ref()
            .is_some_and(|current| current.counts != payload.counts);

        if force_reparent {
            self.surface.close();
            self.surface.create(&payload);
        } else if self.current.is_some() {
            self.surface.update(&payload);
        } else {
            self.surface.create(&payload);
        }

        match sub {
            SubState::InProgress if self.accelerating => {
                self.schedule(self.config.accelerating_duration());
            }
            SubState::InProgress => {
                self.timer = None;
            }
            SubState::Result(_) => {
                self.schedule(self.config.result_duration());
            }
        }

        self.shown_result = payload.result;
        self.current = Some(payload);
    }

    fn build_payload(&self, sub: SubState) -> NotificationPayload {
        let counts = DownloadCounts::tally(&self.items);
        match sub {
            SubState::InProgress => {
                let message = if self.accelerating {
                    "Speeding up your download".to_string()
                } else {
                    let total: u64 = self
                        .items
                        .iter()
                        .filter(|it| it.state == ItemState::InProgress)
                        .map(|it| it.total_bytes)
                        .sum();
                    in_progress_message(counts.in_progress.max(1), total)
                };
                NotificationPayload {
                    id: None,
                    message,
                    link: LinkText::Details,
                    icon: IconKind::InProgress,
                    is_animated: true,
                    result: None,
                    counts,
                }
            }
            SubState::Result(ResultState::Complete) => {
                let mut completed = self
                    .items
                    .iter()
                    .filter(|it| it.state == ItemState::Complete);
                let first = completed.next();
                let (id, message, link) = match (first, completed.next()) {
                    (Some(only), None) => (
                        Some(only.id.clone()),
                        only.title.clone(),
                        LinkText::Open,
                    ),
                    _ => (
                        None,
                        plural_message(counts.completed, "complete"),
                        LinkText::Details,
                    ),
                };
                NotificationPayload {
                    id,
                    message,
                    link,
                    icon: IconKind::Complete,
                    is_animated: false,
                    result: Some(ResultState::Complete),
                    counts,
                }
            }
            SubState::Result(ResultState::Failed) => NotificationPayload {
                id: None,
                message: plural_message(counts.failed, "failed"),
                link: LinkText::Details,
                icon: IconKind::Failed,
                is_animated: false,
                result: Some(ResultState::Failed),
                counts,
            },
            SubState::Result(ResultState::Pending) => NotificationPayload {
                id: None,
                message: plural_message(counts.pending, "pending"),
                link: LinkText::Details,
                icon: IconKind::Pending,
                is_animated: false,
                result: Some(ResultState::Pending),
                counts,
            },
        }
    }

    fn schedule(&mut self, duration: Duration) {
        self.timer = Some(PendingTimer {
            deadline: Instant::now() + duration,
            duration,
        });
    }

    /// Inserts or replaces the tracked item, returning the state it was
    /// previously tracked in.
    fn upsert(&mut self, item: OfflineItem) -> Option<ItemState> {
        if let Some(existing) = self.items.iter_mut().find(|t| t.id == item.id) {
            let previous = existing.state;
            *existing = item;
            Some(previous)
        } else {
            self.items.push(item);
            None
        }
    }
}

fn in_progress_message(count: usize, total_bytes: u64) -> String {
    let noun = if count == 1 { "file" } else { "files" };
    if total_bytes > 0 {
        format!(
            "Downloading {count} {noun} ({})",
            format_bytes(total_bytes)
        )
    } else {
        format!("Downloading {count} {noun}")
    }
}

fn plural_message(count: usize, verb: &str) -> String {
    let noun = if count == 1 { "download" } else { "downloads" };
    format!("{count} {noun} {verb}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingSurface {
        created: Vec<NotificationPayload>,
        updated: Vec<NotificationPayload>,
        closes: usize,
    }

    impl NotificationSurface for RecordingSurface {
        fn create(&mut self, payload: &NotificationPayload) {
            self.created.push(payload.clone());
        }

        fn update(&mut self, payload: &NotificationPayload) {
            self.updated.push(payload.clone());
        }

        fn close(&mut self) {
            self.closes += 1;
        }
    }

    fn controller() -> NotificationController<RecordingSurface> {
        NotificationController::with_surface(
            false,
            NotifyConfig::default(),
            RecordingSurface::default(),
        )
    }

    fn id(s: &str) -> ContentId {
        ContentId::new("download", s)
    }

    fn in_progress(s: &str) -> OfflineItem {
        OfflineItem::new(id(s), format!("{s}.bin"))
    }

    fn item_in(s: &str, state: ItemState) -> OfflineItem {
        let mut item = in_progress(s);
        item.state = state;
        item
    }

    fn message(c: &NotificationController<RecordingSurface>) -> String {
        c.current_payload().expect("payload shown").message.clone()
    }

    #[test]
    fn starts_in_initial_with_nothing_shown() {
        let c = controller();
        assert_eq!(c.state(), ControllerState::Initial);
        assert!(c.current_payload().is_none());
        assert!(c.pending_timer().is_none());
    }

    #[test]
    fn download_started_forces_progress_presentation() {
        let mut c = controller();
        c.on_download_started();
        assert_eq!(c.state(), ControllerState::Downloading);
        assert_eq!(message(&c), "Downloading 1 file");
        assert!(!c.is_accelerating());
        assert!(c.pending_timer().is_none());
    }

    #[test]
    fn accelerated_start_shows_speeding_up_with_short_timer() {
        let mut c = controller();
        c.on_download_started();

        let mut a = in_progress("a");
        a.is_accelerated = true;
        c.on_item_updated(a);

        assert_eq!(c.state(), ControllerState::Downloading);
        assert!(c.is_accelerating());
        assert_eq!(message(&c), "Speeding up your download");
        assert_eq!(
            c.pending_timer().unwrap().duration,
            Duration::from_millis(3000)
        );
    }

    #[test]
    fn accelerating_timer_reverts_to_plain_progress() {
        let mut c = controller();
        let mut a = in_progress("a");
        a.is_accelerated = true;
        a.total_bytes = 1024 * 1024;
        c.on_item_updated(a);
        assert!(c.is_accelerating());

        c.on_timer_fired();
        assert_eq!(c.state(), ControllerState::Downloading);
        assert!(!c.is_accelerating());
        assert_eq!(message(&c), "Downloading 1 file (1.00 MB)");
        assert!(c.pending_timer().is_none());
    }

    #[test]
    fn second_download_ends_acceleration() {
        let mut c = controller();
        let mut a = in_progress("a");
        a.is_accelerated = true;
        c.on_item_updated(a);
        assert!(c.is_accelerating());

        c.on_item_updated(in_progress("b"));
        assert!(!c.is_accelerating());
        assert_eq!(message(&c), "Downloading 2 files");
        assert!(c.pending_timer().is_none());
    }

    #[test]
    fn duplicate_updates_do_not_reshow() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        c.on_item_updated(in_progress("a"));
        c.on_item_updated(in_progress("a"));
        assert_eq!(c.surface().created.len(), 1);
        assert!(c.surface().updated.is_empty());
    }

    #[test]
    fn duplicate_result_does_not_reset_timer() {
        let mut c = controller();
        c.on_item_updated(item_in("a", ItemState::Failed));
        let first_deadline = c.pending_timer().unwrap().deadline;

        c.on_item_updated(item_in("a", ItemState::Failed));
        assert_eq!(c.pending_timer().unwrap().deadline, first_deadline);
    }

    #[test]
    fn progress_size_change_updates_in_place() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        assert_eq!(message(&c), "Downloading 1 file");

        let mut a = in_progress("a");
        a.total_bytes = 2048;
        c.on_item_updated(a);
        assert_eq!(message(&c), "Downloading 1 file (2.00 KB)");
        // Same counts snapshot, so the surface is updated, not recreated.
        assert_eq!(c.surface().created.len(), 1);
        assert_eq!(c.surface().updated.len(), 1);
    }

    #[test]
    fn single_completion_shows_title_with_open_link() {
        let mut c = controller();
        c.on_download_started();
        let mut a = in_progress("a");
        a.is_accelerated = true;
        c.on_item_updated(a);

        let mut done = item_in("a", ItemState::Complete);
        done.title = "foo.pdf".to_string();
        c.on_item_updated(done);

        assert_eq!(c.state(), ControllerState::ShowResult);
        let payload = c.current_payload().unwrap();
        assert_eq!(payload.message, "foo.pdf");
        assert_eq!(payload.link, LinkText::Open);
        assert_eq!(payload.id, Some(id("a")));
        assert_eq!(payload.result, Some(ResultState::Complete));
        assert_eq!(
            c.pending_timer().unwrap().duration,
            Duration::from_millis(6000)
        );
    }

    #[test]
    fn result_timer_purges_and_returns_to_initial() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        c.on_item_updated(item_in("a", ItemState::Complete));
        assert_eq!(c.state(), ControllerState::ShowResult);

        c.on_timer_fired();
        assert_eq!(c.state(), ControllerState::Initial);
        assert!(c.tracked().is_empty());
        assert!(c.current_payload().is_none());
        assert!(c.pending_timer().is_none());
        assert!(c.surface().closes >= 1);
    }

    #[test]
    fn multiple_completions_show_plural_details() {
        let mut c = controller();
        c.on_item_updated(item_in("a", ItemState::Complete));
        c.on_item_updated(item_in("b", ItemState::Complete));

        let payload = c.current_payload().unwrap();
        assert_eq!(payload.message, "2 downloads complete");
        assert_eq!(payload.link, LinkText::Details);
        assert_eq!(payload.id, None);
    }

    #[test]
    fn removal_keeps_downloading_while_others_remain() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        c.on_item_updated(in_progress("b"));
        assert_eq!(c.counts().in_progress, 2);

        c.on_item_removed(&id("a"));
        assert_eq!(c.state(), ControllerState::Downloading);
        assert_eq!(c.counts().in_progress, 1);
    }

    #[test]
    fn removing_last_download_returns_to_initial() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        c.on_item_removed(&id("a"));
        assert_eq!(c.state(), ControllerState::Initial);
        assert!(c.current_payload().is_none());
    }

    #[test]
    fn pending_item_resuming_bypasses_result_timer() {
        let mut c = controller();
        // Seen in progress first, then stalls into pending.
        c.on_item_updated(in_progress("b"));
        c.on_item_updated(item_in("b", ItemState::Pending));
        assert_eq!(c.state(), ControllerState::ShowResult);
        assert_eq!(message(&c), "1 download pending");
        assert!(c.pending_timer().is_some());

        c.on_item_updated(in_progress("b"));
        assert_eq!(c.state(), ControllerState::Downloading);
        assert!(c.pending_timer().is_none());
    }

    #[test]
    fn item_first_seen_as_pending_also_resumes_immediately() {
        let mut c = controller();
        c.on_item_updated(item_in("b", ItemState::Pending));
        assert_eq!(c.state(), ControllerState::ShowResult);

        c.on_item_updated(in_progress("b"));
        assert_eq!(c.state(), ControllerState::Downloading);
        assert!(c.pending_timer().is_none());
    }

    #[test]
    fn interrupted_items_display_as_pending() {
        let mut c = controller();
        c.on_item_updated(item_in("a", ItemState::Interrupted));
        assert_eq!(c.state(), ControllerState::ShowResult);
        assert_eq!(message(&c), "1 download pending");
        assert_eq!(c.counts().pending, 1);
    }

    #[test]
    fn paused_item_is_evicted_and_ignored() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        c.on_item_updated(in_progress("b"));

        c.on_item_updated(item_in("b", ItemState::Paused));
        assert_eq!(c.state(), ControllerState::Downloading);
        assert_eq!(c.counts().in_progress, 1);
        assert!(c.tracked().iter().all(|it| it.id != id("b")));

        // Subsequent updates for the paused identity are dropped.
        c.on_item_updated(item_in("b", ItemState::Complete));
        assert_eq!(c.state(), ControllerState::Downloading);
        assert_eq!(c.counts().completed, 0);
    }

    #[test]
    fn removal_clears_the_ignore_entry() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        c.on_item_updated(item_in("a", ItemState::Paused));
        assert_eq!(c.state(), ControllerState::Initial);

        c.on_item_removed(&id("a"));
        // The identity reacts again once its download restarts.
        c.on_download_started();
        c.on_item_updated(in_progress("a"));
        assert_eq!(c.state(), ControllerState::Downloading);
        assert_eq!(c.counts().in_progress, 1);
    }

    #[test]
    fn resuming_update_clears_the_ignore_entry() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        c.on_item_updated(in_progress("b"));
        c.on_item_updated(item_in("b", ItemState::Paused));
        assert_eq!(c.counts().in_progress, 1);

        // The paused identity resumes; no removal happened in between.
        c.on_item_updated(in_progress("b"));
        assert_eq!(c.counts().in_progress, 2);
        assert_eq!(message(&c), "Downloading 2 files");
    }

    #[test]
    fn pausing_the_only_download_returns_to_initial() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        c.on_item_updated(item_in("a", ItemState::Paused));
        assert_eq!(c.state(), ControllerState::Initial);
        assert!(c.current_payload().is_none());
    }

    #[test]
    fn user_cancel_retains_live_downloads() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        c.on_item_updated(item_in("b", ItemState::Complete));
        assert_eq!(c.state(), ControllerState::ShowResult);

        c.on_user_cancel();
        assert_eq!(c.state(), ControllerState::Cancelled);
        assert!(c.current_payload().is_none());
        assert_eq!(c.tracked().len(), 1);
        assert_eq!(c.tracked()[0].id, id("a"));
    }

    #[test]
    fn cancelled_state_reawakens_on_new_download() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        c.on_user_cancel();
        assert_eq!(c.state(), ControllerState::Cancelled);

        c.on_item_updated(in_progress("b"));
        assert_eq!(c.state(), ControllerState::Downloading);
        assert_eq!(message(&c), "Downloading 2 files");
    }

    #[test]
    fn completion_beats_other_results_and_sticks_until_purged() {
        let mut c = controller();
        c.on_item_updated(item_in("a", ItemState::Failed));
        assert_eq!(message(&c), "1 download failed");

        c.on_item_updated(item_in("b", ItemState::Complete));
        assert_eq!(message(&c), "b.bin");

        // Retiring the completion surfaces the still-tracked failure.
        c.on_timer_fired();
        assert_eq!(c.state(), ControllerState::ShowResult);
        assert_eq!(message(&c), "1 download failed");
        assert!(c.pending_timer().is_some());

        c.on_timer_fired();
        assert_eq!(c.state(), ControllerState::Initial);
    }

    #[test]
    fn result_display_waits_out_the_timer_before_progress_returns() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        c.on_item_updated(item_in("b", ItemState::Failed));
        assert_eq!(c.state(), ControllerState::ShowResult);

        // The failure is still on its debounce; a plain progress update
        // must not steal the surface back.
        c.on_item_updated(in_progress("a"));
        assert_eq!(c.state(), ControllerState::ShowResult);

        c.on_timer_fired();
        assert_eq!(c.state(), ControllerState::Downloading);
        assert_eq!(message(&c), "Downloading 1 file");
    }

    #[test]
    fn counts_change_recreates_the_surface() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        assert_eq!(c.surface().created.len(), 1);

        let mut done = item_in("a", ItemState::Complete);
        done.title = "foo.pdf".to_string();
        c.on_item_updated(done);

        // New counts snapshot: close + create rather than update.
        assert_eq!(c.surface().created.len(), 2);
        assert_eq!(c.surface().closes, 1);
        assert!(c.surface().updated.is_empty());
    }

    #[test]
    fn off_the_record_items_never_reach_a_regular_controller() {
        let mut c = controller();
        let mut item = in_progress("a");
        item.is_off_the_record = true;
        c.on_item_updated(item);
        assert_eq!(c.state(), ControllerState::Initial);
        assert!(c.tracked().is_empty());
    }

    #[test]
    fn invisible_items_are_dropped() {
        let mut c = controller();

        let mut transient = in_progress("a");
        transient.is_transient = true;
        c.on_item_updated(transient);

        let mut suggested = in_progress("b");
        suggested.is_suggested = true;
        c.on_item_updated(suggested);

        let mut pathless = in_progress("c");
        pathless.file_path = None;
        c.on_item_updated(pathless);

        assert_eq!(c.state(), ControllerState::Initial);
        assert!(c.tracked().is_empty());
    }

    #[test]
    fn cancelled_update_is_a_removal() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        c.on_item_updated(item_in("a", ItemState::Cancelled));
        assert_eq!(c.state(), ControllerState::Initial);
        assert!(c.tracked().is_empty());
    }

    #[test]
    fn auto_opened_completion_is_suppressed() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        c.on_item_updated(in_progress("b"));

        c.on_download_item_completed(item_in("a", ItemState::Complete), true);
        assert_eq!(c.state(), ControllerState::Downloading);
        assert_eq!(c.counts().completed, 0);
        assert_eq!(c.counts().in_progress, 1);
    }

    #[test]
    fn manager_completion_without_auto_open_shows_result() {
        let mut c = controller();
        c.on_item_updated(in_progress("a"));
        c.on_download_item_completed(item_in("a", ItemState::Complete), false);
        assert_eq!(c.state(), ControllerState::ShowResult);
        assert_eq!(c.current_payload().unwrap().result, Some(ResultState::Complete));
    }

    #[test]
    fn batch_add_goes_through_the_update_path() {
        let mut c = controller();
        c.on_items_added(vec![in_progress("a"), item_in("b", ItemState::Failed)]);
        assert_eq!(c.counts().in_progress, 1);
        assert_eq!(c.counts().failed, 1);
        assert_eq!(c.state(), ControllerState::ShowResult);
    }

    #[test]
    fn displayed_result_sticks_while_its_items_remain() {
        let mut c = controller();
        c.on_item_updated(item_in("p", ItemState::Pending));
        c.on_item_updated(item_in("f", ItemState::Failed));
        // Pending is on screen and still has items, so it stays put.
        assert_eq!(message(&c), "1 download pending");

        // Retiring pending falls through to the oldest remaining result.
        c.on_timer_fired();
        assert_eq!(message(&c), "1 download failed");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Started,
            Update(u8, ItemState),
            Remove(u8),
            Cancel,
            TimerFired,
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                Just(Op::Started),
                (0u8..6, state_strategy()).prop_map(|(n, s)| Op::Update(n, s)),
                (0u8..6).prop_map(Op::Remove),
                Just(Op::Cancel),
                Just(Op::TimerFired),
            ]
        }

        fn state_strategy() -> impl Strategy<Value = ItemState> {
            prop_oneof![
                Just(ItemState::InProgress),
                Just(ItemState::Pending),
                Just(ItemState::Failed),
                Just(ItemState::Complete),
                Just(ItemState::Cancelled),
                Just(ItemState::Paused),
                Just(ItemState::Interrupted),
            ]
        }

        proptest! {
            #[test]
            fn invariants_hold_over_arbitrary_event_sequences(
                ops in proptest::collection::vec(op_strategy(), 1..60)
            ) {
                let mut c = controller();
                for op in ops {
                    match op {
                        Op::Started => c.on_download_started(),
                        Op::Update(n, state) => {
                            c.on_item_updated(item_in(&n.to_string(), state));
                        }
                        Op::Remove(n) => c.on_item_removed(&id(&n.to_string())),
                        Op::Cancel => c.on_user_cancel(),
                        Op::TimerFired => {
                            if c.pending_timer().is_some() {
                                c.on_timer_fired();
                            }
                        }
                    }

                    // Tracked items only ever hold countable states.
                    for it in c.tracked() {
                        prop_assert!(matches!(
                            it.state,
                            ItemState::InProgress
                                | ItemState::Pending
                                | ItemState::Failed
                                | ItemState::Complete
                        ));
                    }

                    match c.state() {
                        ControllerState::Initial => {
                            prop_assert!(c.tracked().is_empty());
                            prop_assert!(c.current_payload().is_none());
                            prop_assert!(c.pending_timer().is_none());
                        }
                        ControllerState::Cancelled => {
                            prop_assert!(c
                                .tracked()
                                .iter()
                                .all(|it| it.state == ItemState::InProgress));
                            prop_assert!(c.current_payload().is_none());
                        }
                        ControllerState::Downloading | ControllerState::ShowResult => {}
                    }
                }
            }
        }
    }
}
