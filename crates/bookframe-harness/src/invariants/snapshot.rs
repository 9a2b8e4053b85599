//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of a session at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use std::{ops::Sub, time::Duration};

use bookframe_core::{FrameController, Status};

/// Snapshot of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Lifecycle status.
    pub status: Status,
    /// Connectivity as the session sees it.
    pub online: bool,
    /// Whether the session has closed.
    pub closed: bool,
    /// Whether the load watchdog is armed.
    pub watchdog_armed: bool,
    /// Whether a resize debounce is pending.
    pub debounce_pending: bool,
    /// Whether a frame is mounted.
    pub frame_mounted: bool,
    /// Attached listener count.
    pub listeners: usize,
    /// Retry nonces observed over time.
    pub nonce_history: Vec<u64>,
    /// Frame URLs mounted over time.
    pub frame_urls: Vec<String>,
    /// Times the close callback ran.
    pub closed_notifications: usize,
    /// Host page state. `None` when the host is not observed.
    pub host: Option<HostSnapshot>,
}

/// Snapshot of the host page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSnapshot {
    /// Whether body scrolling is locked.
    pub scroll_locked: bool,
    /// Viewport meta content now.
    pub viewport_meta: Option<String>,
    /// Viewport meta content before the session.
    pub original_viewport_meta: Option<String>,
}

impl SessionSnapshot {
    /// A session that just started loading attempt 0.
    pub fn loading() -> Self {
        Self {
            status: Status::Loading,
            online: true,
            closed: false,
            watchdog_armed: true,
            debounce_pending: false,
            frame_mounted: true,
            listeners: 4,
            nonce_history: vec![0],
            frame_urls: Vec::new(),
            closed_notifications: 0,
            host: None,
        }
    }

    /// Snapshot of the controller's own view.
    ///
    /// History fields hold only the current values; use
    /// [`Self::with_history`] to supply what a caller tracked over time.
    pub fn from_controller<I>(controller: &FrameController<I>) -> Self
    where
        I: Copy + Ord + Sub<Output = Duration>,
    {
        Self {
            status: controller.status(),
            online: controller.is_online(),
            closed: controller.is_closed(),
            watchdog_armed: controller.watchdog().is_some(),
            debounce_pending: controller.debounce_pending(),
            frame_mounted: controller.mounted_frame().is_some(),
            listeners: controller.listeners().len(),
            nonce_history: vec![controller.retry_nonce()],
            frame_urls: controller.mounted_frame().map(|f| f.url.to_string()).into_iter().collect(),
            closed_notifications: usize::from(controller.is_closed()),
            host: None,
        }
    }

    /// Replace the history fields.
    #[must_use]
    pub fn with_history(mut self, nonces: Vec<u64>, frame_urls: Vec<String>) -> Self {
        self.nonce_history = nonces;
        self.frame_urls = frame_urls;
        self
    }

    /// Attach a host page snapshot.
    #[must_use]
    pub fn with_host(mut self, host: HostSnapshot) -> Self {
        self.host = Some(host);
        self
    }
}
