//! Foreground keep-alive service coordination.
//!
//! Independent of the notification state machine: watches per-notification
//! download status updates and keeps the platform keep-alive service bound
//! exactly while at least one download is active. Binding is asynchronous;
//! updates arriving while the bind is in flight buffer in the status map
//! and drain once on connect.

use std::collections::BTreeMap;

/// Status of one notification's download, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    InProgress,
    Pause,
    Cancel,
    Complete,
    Fail,
}

impl DownloadStatus {
    /// Active downloads justify keeping the service alive.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::InProgress)
    }
}

/// Most recent status recorded for one notification id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: DownloadStatus,
    /// Notification text to pin when this update is promoted.
    pub title: String,
}

/// Host-side handle to the platform keep-alive service.
///
/// `start_and_bind` is asynchronous on real platforms: the host must call
/// [`ForegroundCoordinator::on_service_connected`] once the service handle
/// becomes usable. All methods default to no-ops.
pub trait ServiceHost: Send {
    /// Starts the service and begins binding to it.
    fn start_and_bind(&mut self) {}

    /// Stops the service and unbinds. `was_cancelled` tells the host
    /// whether to kill the pinned notification outright or leave it
    /// dismissible.
    fn stop_and_unbind(&mut self, _was_cancelled: bool) {}

    /// Pins the given notification to the running service.
    fn push_notification(&mut self, _id: u32, _update: &StatusUpdate) {}
}

/// A host that talks to no service at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullServiceHost;

impl ServiceHost for NullServiceHost {}

/// Keeps the keep-alive service bound exactly while a download is active.
pub struct ForegroundCoordinator<H: ServiceHost = NullServiceHost> {
    host: H,
    /// Latest status per notification id. Key order makes the
    /// interesting-update scan deterministic.
    updates: BTreeMap<u32, StatusUpdate>,
    /// `start_and_bind` has been issued and not yet undone.
    bound: bool,
    /// The bind completed; the service handle is usable.
    connected: bool,
    /// Notification currently pinned to the foreground service.
    pinned: Option<u32>,
}

impl<H: ServiceHost> ForegroundCoordinator<H> {
    /// Creates a coordinator driving the given host.
    #[must_use]
    pub const fn new(host: H) -> Self {
        Self {
            host,
            updates: BTreeMap::new(),
            bound: false,
            connected: false,
            pinned: None,
        }
    }

    /// Whether `start_and_bind` has been issued without a matching stop.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.bound
    }

    /// Whether the service handle is currently usable.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// The notification id pinned to the service, if any.
    #[must_use]
    pub const fn pinned(&self) -> Option<u32> {
        self.pinned
    }

    /// Number of buffered status entries.
    #[must_use]
    pub fn tracked_updates(&self) -> usize {
        self.updates.len()
    }

    /// The service host.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the service host.
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Records the latest status for a notification and re-evaluates the
    /// service lifetime.
    pub fn update_download_status(
        &mut self,
        id: u32,
        status: DownloadStatus,
        title: impl Into<String>,
    ) {
        self.updates.insert(
            id,
            StatusUpdate {
                status,
                title: title.into(),
            },
        );
        self.process_queue(false);
    }

    /// Bind completion callback; drains the backlog exactly once per bind.
    pub fn on_service_connected(&mut self) {
        if !self.bound {
            // Stale callback after a stop raced the connect.
            return;
        }
        self.connected = true;
        self.process_queue(true);
    }

    /// The platform dropped the service out from under us.
    pub fn on_service_disconnected(&mut self) {
        log::warn!("keep-alive service disconnected");
        self.connected = false;
        self.bound = false;
        self.pinned = None;
    }

    fn process_queue(&mut self, draining_backlog: bool) {
        let Some((id, update)) = self.find_interesting_update() else {
            return;
        };

        if !self.bound {
            if update.status.is_active() {
                self.bound = true;
                log::debug!("starting keep-alive service for notification {id}");
                self.host.start_and_bind();
            } else {
                // Never start the service on a non-active signal.
                self.prune_inactive();
            }
            return;
        }

        if !self.connected {
            // Bind still in flight; the connect callback drains the map.
            return;
        }

        if draining_backlog {
            // The service just connected: pin something before any stop
            // decision below.
            self.host.push_notification(id, &update);
            self.pinned = Some(id);
        }

        if !update.status.is_active() {
            let was_cancelled = update.status == DownloadStatus::Cancel;
            self.stop_and_unbind(was_cancelled);
            self.prune_inactive();
            return;
        }

        let pinned_active = self.pinned.is_some_and(|pinned| {
            self.updates
                .get(&pinned)
                .is_some_and(|u| u.status.is_active())
        });
        if !pinned_active {
            self.host.push_notification(id, &update);
            self.pinned = Some(id);
        }

        self.prune_inactive();
    }

    /// Prefers any active entry (lowest id first), else falls back to the
    /// highest-id entry, else nothing.
    fn find_interesting_update(&self) -> Option<(u32, StatusUpdate)> {
        for (id, update) in &self.updates {
            if update.status.is_active() {
                return Some((*id, update.clone()));
            }
        }
        self.updates
            .iter()
            .next_back()
            .map(|(id, update)| (*id, update.clone()))
    }

    fn stop_and_unbind(&mut self, was_cancelled: bool) {
        if !self.bound {
            return;
        }
        self.bound = false;
        self.connected = false;
        self.pinned = None;
        log::debug!("stopping keep-alive service (cancelled: {was_cancelled})");
        self.host.stop_and_unbind(was_cancelled);
    }

    fn prune_inactive(&mut self) {
        self.updates.retain(|_, update| update.status.is_active());
    }
}
