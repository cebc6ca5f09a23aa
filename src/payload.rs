//! Presentation payloads handed to the notification surface.

use crate::counts::DownloadCounts;
use crate::item::ContentId;

/// Result sub-state shown inside the broader show-result controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultState {
    Complete,
    Failed,
    Pending,
}

/// Icon rendered next to the notification message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    InProgress,
    Complete,
    Failed,
    Pending,
}

/// Action link rendered after the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkText {
    /// Opens the single completed item bound to the payload's identity.
    Open,
    /// Opens the downloads overview.
    Details,
}

impl LinkText {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Details => "Details",
        }
    }
}

/// What the notification surface should currently display.
///
/// Equality is structural over the user-visible fields only (identity,
/// message, link, icon), so rapid upstream events that rebuild an
/// identical payload never reach the surface twice. The counts snapshot
/// and animation flags are carried for presentation decisions but excluded
/// from the comparison.
#[derive(Debug, Clone)]
pub struct NotificationPayload {
    /// Set only for the single-completed-item presentation; the open link
    /// targets this identity.
    pub id: Option<ContentId>,
    pub message: String,
    pub link: LinkText,
    pub icon: IconKind,
    /// Whether the icon animates (in-progress spinner).
    pub is_animated: bool,
    /// The result sub-state this payload displays, if any.
    pub result: Option<ResultState>,
    /// Per-state counts at build time; inequality against the previously
    /// shown payload forces the surface to be recreated.
    pub counts: DownloadCounts,
}

impl PartialEq for NotificationPayload {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.message == other.message
            && self.link == other.link
            && self.icon == other.icon
    }
}
